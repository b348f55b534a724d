//! Structural positions and ranges.
//!
//! A [`Position`] is anchored to a block by id rather than to a global
//! offset, so edits in other blocks never move it. Offsets inside a block are
//! measured in chars.

use std::fmt;

use crate::node::BlockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
  pub block:  BlockId,
  pub offset: usize,
}

impl Position {
  pub const fn new(block: BlockId, offset: usize) -> Self {
    Self { block, offset }
  }

  pub fn at_start(block: BlockId) -> Self {
    Self::new(block, 0)
  }

  /// Same block, `delta` chars further.
  pub fn shifted(self, delta: usize) -> Self {
    Self::new(self.block, self.offset + delta)
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.block, self.offset)
  }
}

/// A range inside a single block, `start.offset <= end.offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
  pub start: Position,
  pub end:   Position,
}

impl Range {
  /// Build a range in `block`; the bounds are ordered if given backwards.
  pub fn new(block: BlockId, from: usize, to: usize) -> Self {
    Self {
      start: Position::new(block, from.min(to)),
      end:   Position::new(block, from.max(to)),
    }
  }

  pub fn collapsed(position: Position) -> Self {
    Self {
      start: position,
      end:   position,
    }
  }

  pub fn block(&self) -> BlockId {
    self.start.block
  }

  pub fn len(&self) -> usize {
    self.end.offset - self.start.offset
  }

  pub fn is_collapsed(&self) -> bool {
    self.start == self.end
  }

  pub fn contains(&self, position: Position) -> bool {
    position.block == self.block()
      && self.start.offset <= position.offset
      && position.offset <= self.end.offset
  }

  /// True if `other` lies entirely inside this range.
  pub fn contains_range(&self, other: &Range) -> bool {
    self.contains(other.start) && self.contains(other.end)
  }
}

impl fmt::Display for Range {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}:{}..{}",
      self.block(),
      self.start.offset,
      self.end.offset
    )
  }
}

/// Which side a position sticks to when text is inserted exactly at it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  /// Stay before text inserted at this position.
  Before,
  /// Move after text inserted at this position.
  After,
}

impl Assoc {
  /// Offset of a position sitting at an insertion point of `len` chars.
  pub fn insert_offset(self, len: usize) -> usize {
    match self {
      Assoc::Before => 0,
      Assoc::After => len,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::num::NonZeroUsize;

  use super::*;

  fn block(n: usize) -> BlockId {
    BlockId::new(NonZeroUsize::new(n).unwrap())
  }

  #[test]
  fn range_orders_bounds() {
    let range = Range::new(block(1), 5, 2);
    assert_eq!(range.start.offset, 2);
    assert_eq!(range.end.offset, 5);
    assert_eq!(range.len(), 3);
  }

  #[test]
  fn contains_is_block_local() {
    let range = Range::new(block(1), 0, 3);
    assert!(range.contains(Position::new(block(1), 3)));
    assert!(!range.contains(Position::new(block(2), 1)));
  }
}
