//! Live autoformatting of typed text.
//!
//! An [`autoformat::Autoformat`] attached to a [`the_doc::model::Model`]
//! watches every local keystroke and turns markup-like typing into
//! structure:
//!
//! - block rules convert a paragraph whose whole text matches a pattern,
//!   e.g. `"- "` into a list item or `"## "` into a heading;
//! - inline rules format delimited text before the caret, e.g. `*foo*` into
//!   bold `foo`;
//! - a text transformation replaces literals when a trigger character is
//!   typed, e.g. `--` followed by a space into an en dash.
//!
//! Each autoformat edit is a batch of its own, so a single undo brings back
//! exactly what was typed.

mod applier;
pub mod autoformat;
pub mod config;
pub mod filter;
pub mod matcher;
pub mod rule;
pub mod span;
pub mod transform;

pub use crate::{
  autoformat::{
    Autoformat,
    AutoformatError,
    AutoformatHandle,
  },
  config::AutoformatConfig,
  matcher::MatchResult,
  rule::{
    ActionOutcome,
    BlockAction,
    InlineAction,
    Priority,
  },
  transform::TextTransformation,
};
