//! Atomic document operations.
//!
//! Every mutation of a [`Document`](crate::document::Document) is one of the
//! [`Operation`]s below. Applying an operation returns the *applied* form,
//! which carries whatever the operation destroyed (removed text, previous
//! attribute values, a removed block) so that it can be inverted without
//! looking at the document again:
//!
//! ```ignore
//! let applied = document.apply(op)?;
//! document.apply(applied.invert())?; // back where we started
//! ```
//!
//! # Position Mapping
//!
//! Positions held across an operation are updated with
//! [`Operation::map_position`]. Text insertions shift positions after them
//! (and positions exactly at the insertion point, depending on [`Assoc`]);
//! removals collapse positions inside the removed range onto its start.
//! Positions inside a removed block can no longer be mapped and yield `None`.

use crate::{
  Tendril,
  node::{
    AttributeSpan,
    Block,
    BlockId,
    Runs,
    runs_len,
  },
  position::{
    Assoc,
    Position,
    Range,
  },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
  /// Insert `content` at `at`.
  InsertText { at: Position, content: Runs },

  /// Remove `range`; `removed` is filled in when applied.
  RemoveText { range: Range, removed: Runs },

  /// Set `key` on each span of `block` to the span's value (`None` clears
  /// it); `previous` is filled in when applied.
  SetAttribute {
    block:    BlockId,
    key:      Tendril,
    spans:    Vec<AttributeSpan>,
    previous: Vec<AttributeSpan>,
  },

  /// Set (or clear) an attribute of the block element itself.
  SetBlockAttribute {
    block:    BlockId,
    key:      Tendril,
    value:    Option<Tendril>,
    previous: Option<Tendril>,
  },

  /// Change the element name of a block.
  Rename {
    block: BlockId,
    from:  Tendril,
    to:    Tendril,
  },

  InsertBlock { index: usize, block: Block },

  /// Remove the block with `id`; `index` and `block` are filled in when
  /// applied.
  RemoveBlock {
    id:    BlockId,
    index: usize,
    block: Option<Block>,
  },

  MoveBlock {
    block: BlockId,
    from:  usize,
    to:    usize,
  },
}

impl Operation {
  /// The block the operation acts on.
  pub fn block(&self) -> BlockId {
    match self {
      Operation::InsertText { at, .. } => at.block,
      Operation::RemoveText { range, .. } => range.block(),
      Operation::SetAttribute { block, .. }
      | Operation::SetBlockAttribute { block, .. }
      | Operation::Rename { block, .. }
      | Operation::MoveBlock { block, .. } => *block,
      Operation::InsertBlock { block, .. } => block.id(),
      Operation::RemoveBlock { id, .. } => *id,
    }
  }

  /// True if applying this operation changes nothing.
  pub fn is_noop(&self) -> bool {
    match self {
      Operation::InsertText { content, .. } => runs_len(content) == 0,
      Operation::RemoveText { range, .. } => range.is_collapsed(),
      Operation::SetAttribute { spans, .. } => spans.iter().all(|span| span.start == span.end),
      Operation::Rename { from, to, .. } => from == to,
      Operation::MoveBlock { from, to, .. } => from == to,
      _ => false,
    }
  }

  /// Build the operation that reverts this one. Only meaningful for the
  /// applied form returned by `Document::apply`.
  pub fn invert(&self) -> Operation {
    match self.clone() {
      Operation::InsertText { at, content } => {
        Operation::RemoveText {
          range:   Range::new(at.block, at.offset, at.offset + runs_len(&content)),
          removed: content,
        }
      },
      Operation::RemoveText { range, removed } => {
        Operation::InsertText {
          at:      range.start,
          content: removed,
        }
      },
      Operation::SetAttribute {
        block,
        key,
        spans,
        previous,
      } => {
        Operation::SetAttribute {
          block,
          key,
          spans: previous,
          previous: spans,
        }
      },
      Operation::SetBlockAttribute {
        block,
        key,
        value,
        previous,
      } => {
        Operation::SetBlockAttribute {
          block,
          key,
          value: previous,
          previous: value,
        }
      },
      Operation::Rename { block, from, to } => Operation::Rename { block, from: to, to: from },
      Operation::InsertBlock { index, block } => {
        Operation::RemoveBlock {
          id: block.id(),
          index,
          block: Some(block),
        }
      },
      Operation::RemoveBlock { id, index, block } => {
        match block {
          Some(block) => Operation::InsertBlock { index, block },
          // Not applied yet: nothing to restore.
          None => {
            Operation::MoveBlock {
              block: id,
              from:  index,
              to:    index,
            }
          },
        }
      },
      Operation::MoveBlock { block, from, to } => Operation::MoveBlock { block, from: to, to: from },
    }
  }

  /// Map `position` through this operation. Returns `None` when the block
  /// holding the position was removed.
  pub fn map_position(&self, position: Position, assoc: Assoc) -> Option<Position> {
    match self {
      Operation::InsertText { at, content } if at.block == position.block => {
        let len = runs_len(content);
        let offset = if position.offset > at.offset {
          position.offset + len
        } else if position.offset == at.offset {
          position.offset + assoc.insert_offset(len)
        } else {
          position.offset
        };
        Some(Position::new(position.block, offset))
      },
      Operation::RemoveText { range, .. } if range.block() == position.block => {
        let offset = if position.offset >= range.end.offset {
          position.offset - range.len()
        } else if position.offset > range.start.offset {
          range.start.offset
        } else {
          position.offset
        };
        Some(Position::new(position.block, offset))
      },
      Operation::RemoveBlock { id, .. } if *id == position.block => None,
      _ => Some(position),
    }
  }
}
