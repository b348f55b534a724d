//! Structured document model: blocks of attributed text, batched edits,
//! change notifications, live ranges and undo history.
//!
//! Everything that mutates a [`document::Document`] goes through a
//! [`writer::Writer`] inside a batch opened by [`model::Model::change`].
//! Once a batch finishes the model reports its changes to every listener,
//! and listeners may enqueue follow-up batches of their own.

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod batch;
pub mod command;
pub mod differ;
pub mod document;
pub mod history;
pub mod live_range;
pub mod markup;
pub mod model;
pub mod node;
pub mod operation;
pub mod position;
pub mod selection;
pub mod writer;

pub type Tendril = SmartString<LazyCompact>;

/// Element name of a text node in change notifications.
pub const TEXT_NODE: &str = "$text";
