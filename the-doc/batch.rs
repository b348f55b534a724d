//! Batches group the operations of one logical edit.

use std::{
  fmt,
  num::NonZeroU64,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(NonZeroU64);

impl BatchId {
  pub const fn new(id: NonZeroU64) -> Self {
    Self(id)
  }

  pub const fn get(self) -> NonZeroU64 {
    self.0
  }
}

impl fmt::Display for BatchId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "batch#{}", self.0)
  }
}

/// Where a batch comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchOrigin {
  /// Direct local input: typing, commands, autoformat.
  Local,
  /// Synchronized or programmatic echo, e.g. a remote collaborator's edit.
  Transparent,
  /// Replay of a history step by undo.
  Undo,
  /// Replay of a history step by redo.
  Redo,
}

impl BatchOrigin {
  pub fn is_local(self) -> bool {
    self == BatchOrigin::Local
  }

  pub fn is_transparent(self) -> bool {
    self == BatchOrigin::Transparent
  }

  /// True if the batch replays history instead of making a new edit.
  pub fn is_history(self) -> bool {
    matches!(self, BatchOrigin::Undo | BatchOrigin::Redo)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
  pub id:     BatchId,
  pub origin: BatchOrigin,
}
