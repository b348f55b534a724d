//! Document state: blocks, selection and live ranges.
//!
//! The [`Document`] is read-only from the outside. Mutation happens through
//! a [`Writer`](crate::writer::Writer) inside a batch, which funnels every
//! edit into [`Document::apply`]. Applying an operation:
//!
//! 1. validates it against the current blocks,
//! 2. mutates the blocks and captures what is needed to invert it,
//! 3. maps the selection and every live range through it,
//! 4. bumps the version.
//!
//! # Example
//!
//! ```
//! use the_doc::model::Model;
//!
//! let mut model = Model::new();
//! model.input_text("hello").unwrap();
//!
//! let block = &model.document().blocks()[0];
//! assert_eq!(block.text(), "hello");
//! ```

use std::num::NonZeroUsize;

use thiserror::Error;

use crate::{
  Tendril,
  command::CommandError,
  live_range::{
    LiveRangeId,
    LiveRanges,
  },
  node::{
    Attributes,
    Block,
    BlockId,
    PARAGRAPH,
  },
  operation::Operation,
  position::{
    Position,
    Range,
  },
  selection::Selection,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
  #[error("block {0} does not exist")]
  UnknownBlock(BlockId),
  #[error("block {0} already exists")]
  DuplicateBlock(BlockId),
  #[error("offset {offset} is out of bounds for block {block} of length {len}")]
  OffsetOutOfBounds {
    block:  BlockId,
    offset: usize,
    len:    usize,
  },
  #[error("block index {index} is out of bounds for {len} blocks")]
  IndexOutOfBounds { index: usize, len: usize },
  #[error("range {start}..{end} spans more than one block")]
  CrossBlockRange { start: Position, end: Position },
  #[error(transparent)]
  Command(#[from] CommandError),
  /// An error raised by a user supplied callback.
  #[error(transparent)]
  Callback(Box<dyn std::error::Error + Send + Sync>),
}

impl DocumentError {
  pub fn callback(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
    Self::Callback(err.into())
  }
}

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug)]
pub struct Document {
  blocks:        Vec<Block>,
  selection:     Selection,
  live_ranges:   LiveRanges,
  next_block_id: NonZeroUsize,
  version:       u64,
}

impl Default for Document {
  fn default() -> Self {
    Self::new()
  }
}

impl Document {
  /// A document holding a single empty paragraph with the caret in it.
  pub fn new() -> Self {
    let mut document = Self::empty();
    let block = document.create_block(PARAGRAPH);
    document.selection = Selection::collapsed(Position::at_start(block.id()));
    document.blocks.push(block);
    document
  }

  /// A document without blocks. The selection dangles until blocks are
  /// pushed.
  pub(crate) fn empty() -> Self {
    let first = NonZeroUsize::MIN;
    Self {
      blocks:        Vec::new(),
      selection:     Selection::collapsed(Position::at_start(BlockId::new(first))),
      live_ranges:   LiveRanges::new(),
      next_block_id: first,
      version:       0,
    }
  }

  pub(crate) fn push_block(&mut self, block: Block) {
    self.blocks.push(block);
  }

  /// Allocate a fresh, detached block. Insert it with
  /// [`Writer::insert_block`](crate::writer::Writer::insert_block).
  pub fn create_block(&mut self, name: &str) -> Block {
    let id = BlockId::new(self.next_block_id);
    self.next_block_id = self.next_block_id.saturating_add(1);
    Block::new(id, name)
  }

  pub fn blocks(&self) -> &[Block] {
    &self.blocks
  }

  pub fn block(&self, id: BlockId) -> Option<&Block> {
    self.blocks.iter().find(|block| block.id() == id)
  }

  pub fn block_index(&self, id: BlockId) -> Option<usize> {
    self.blocks.iter().position(|block| block.id() == id)
  }

  pub fn selection(&self) -> &Selection {
    &self.selection
  }

  /// The block holding the selection focus.
  pub fn focus_block(&self) -> Option<&Block> {
    self.block(self.selection.focus().block)
  }

  pub fn live_range(&self, id: LiveRangeId) -> Option<Range> {
    self.live_ranges.get(id)
  }

  pub fn live_ranges(&self) -> &LiveRanges {
    &self.live_ranges
  }

  pub(crate) fn live_ranges_mut(&mut self) -> &mut LiveRanges {
    &mut self.live_ranges
  }

  pub fn version(&self) -> u64 {
    self.version
  }

  /// Attributes text typed at `position` inherits: those of the character
  /// before it, or of the character after it at the start of a block.
  pub fn attributes_before(&self, position: Position) -> Attributes {
    let Some(block) = self.block(position.block) else {
      return Attributes::new();
    };
    let attributes = match position.offset.checked_sub(1) {
      Some(prev) => block.attributes_at(prev),
      None => block.attributes_at(0),
    };
    attributes.cloned().unwrap_or_default()
  }

  pub fn validate_position(&self, position: Position) -> Result<()> {
    let block = self
      .block(position.block)
      .ok_or(DocumentError::UnknownBlock(position.block))?;
    check_offset(block, position.offset)
  }

  pub fn validate_range(&self, range: Range) -> Result<()> {
    if range.start.block != range.end.block {
      return Err(DocumentError::CrossBlockRange {
        start: range.start,
        end:   range.end,
      });
    }
    self.validate_position(range.end)
  }

  pub(crate) fn set_selection(&mut self, selection: Selection) -> Result<()> {
    self.validate_position(selection.anchor())?;
    self.validate_position(selection.focus())?;
    self.selection = selection;
    Ok(())
  }

  pub(crate) fn selection_mut(&mut self) -> &mut Selection {
    &mut self.selection
  }

  fn block_mut(&mut self, id: BlockId) -> Result<&mut Block> {
    self
      .blocks
      .iter_mut()
      .find(|block| block.id() == id)
      .ok_or(DocumentError::UnknownBlock(id))
  }

  /// Apply `operation` and return its applied form (see
  /// [`Operation::invert`]).
  pub(crate) fn apply(&mut self, operation: Operation) -> Result<Operation> {
    let applied = match operation {
      Operation::InsertText { at, content } => {
        let block = self.block_mut(at.block)?;
        check_offset(block, at.offset)?;
        block.insert(at.offset, &content);
        Operation::InsertText { at, content }
      },
      Operation::RemoveText { range, .. } => {
        self.validate_range(range)?;
        let block = self.block_mut(range.block())?;
        let removed = block.remove(range.start.offset, range.end.offset);
        Operation::RemoveText { range, removed }
      },
      Operation::SetAttribute {
        block: id,
        key,
        spans,
        ..
      } => {
        let block = self.block_mut(id)?;
        for span in &spans {
          check_offset(block, span.start.max(span.end))?;
        }
        let mut previous = Vec::with_capacity(spans.len());
        for span in &spans {
          previous.extend(block.set_attribute(span.start, span.end, &key, span.value.as_ref()));
        }
        Operation::SetAttribute {
          block: id,
          key,
          spans,
          previous,
        }
      },
      Operation::SetBlockAttribute {
        block: id,
        key,
        value,
        ..
      } => {
        let previous = self.block_mut(id)?.set_block_attribute(&key, value.clone());
        Operation::SetBlockAttribute {
          block: id,
          key,
          value,
          previous,
        }
      },
      Operation::Rename { block: id, to, .. } => {
        let from = self.block_mut(id)?.rename(to.clone());
        Operation::Rename {
          block: id,
          from,
          to,
        }
      },
      Operation::InsertBlock { index, block } => {
        if index > self.blocks.len() {
          return Err(DocumentError::IndexOutOfBounds {
            index,
            len: self.blocks.len(),
          });
        }
        if self.block_index(block.id()).is_some() {
          return Err(DocumentError::DuplicateBlock(block.id()));
        }
        self.blocks.insert(index, block.clone());
        Operation::InsertBlock { index, block }
      },
      Operation::RemoveBlock { id, .. } => {
        let index = self.block_index(id).ok_or(DocumentError::UnknownBlock(id))?;
        let block = self.blocks.remove(index);
        Operation::RemoveBlock {
          id,
          index,
          block: Some(block),
        }
      },
      Operation::MoveBlock { block: id, to, .. } => {
        let from = self.block_index(id).ok_or(DocumentError::UnknownBlock(id))?;
        if to >= self.blocks.len() {
          return Err(DocumentError::IndexOutOfBounds {
            index: to,
            len:   self.blocks.len(),
          });
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        Operation::MoveBlock {
          block: id,
          from,
          to,
        }
      },
    };

    self.live_ranges.map(&applied);
    self.selection = match self.selection.map(&applied) {
      Some(selection) => selection,
      None => self.fallback_selection(&applied),
    };
    self.version = self.version.saturating_add(1);

    Ok(applied)
  }

  /// Where the selection goes when its block disappears: the start of the
  /// block that took the removed block's place, or of the last block.
  fn fallback_selection(&self, applied: &Operation) -> Selection {
    let index = match applied {
      Operation::RemoveBlock { index, .. } => *index,
      _ => 0,
    };
    let Some(block) = self
      .blocks
      .get(index)
      .or_else(|| self.blocks.last())
    else {
      return self.selection.clone();
    };
    Selection::collapsed(Position::at_start(block.id()))
  }
}

fn check_offset(block: &Block, offset: usize) -> Result<()> {
  let len = block.len();
  if offset > len {
    return Err(DocumentError::OffsetOutOfBounds {
      block: block.id(),
      offset,
      len,
    });
  }
  Ok(())
}

/// Convenience for building attribute maps: `attributes([("bold", "true")])`.
pub fn attributes<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Attributes {
  pairs
    .into_iter()
    .map(|(key, value)| (Tendril::from(key), Tendril::from(value)))
    .collect()
}

#[cfg(test)]
mod tests {
  use smallvec::smallvec;

  use super::*;
  use crate::node::TextRun;

  fn doc_with(text: &str) -> (Document, BlockId) {
    let mut doc = Document::new();
    let id = doc.blocks()[0].id();
    doc
      .apply(Operation::InsertText {
        at:      Position::at_start(id),
        content: smallvec![TextRun::new(text)],
      })
      .unwrap();
    (doc, id)
  }

  #[test]
  fn apply_and_invert_remove() {
    let (mut doc, id) = doc_with("hello world");
    let applied = doc
      .apply(Operation::RemoveText {
        range:   Range::new(id, 5, 11),
        removed: Default::default(),
      })
      .unwrap();
    assert_eq!(doc.blocks()[0].text(), "hello");

    doc.apply(applied.invert()).unwrap();
    assert_eq!(doc.blocks()[0].text(), "hello world");
  }

  #[test]
  fn selection_maps_through_operations() {
    let (mut doc, id) = doc_with("abc");
    assert_eq!(doc.selection().caret(), Some(Position::new(id, 3)));

    doc
      .apply(Operation::InsertText {
        at:      Position::at_start(id),
        content: smallvec![TextRun::new("x")],
      })
      .unwrap();
    assert_eq!(doc.selection().caret(), Some(Position::new(id, 4)));
  }

  #[test]
  fn out_of_bounds_is_rejected_without_mutation() {
    let (mut doc, id) = doc_with("abc");
    let version = doc.version();
    let err = doc
      .apply(Operation::InsertText {
        at:      Position::new(id, 10),
        content: smallvec![TextRun::new("x")],
      })
      .unwrap_err();
    assert!(matches!(err, DocumentError::OffsetOutOfBounds {
      offset: 10,
      len: 3,
      ..
    }));
    assert_eq!(doc.version(), version);
  }

  #[test]
  fn removing_focus_block_moves_selection() {
    let mut doc = Document::new();
    let first = doc.blocks()[0].id();
    let second = doc.create_block(PARAGRAPH);
    let second_id = second.id();
    doc
      .apply(Operation::InsertBlock {
        index: 1,
        block: second,
      })
      .unwrap();

    doc
      .apply(Operation::RemoveBlock {
        id:    first,
        index: 0,
        block: None,
      })
      .unwrap();
    assert_eq!(doc.selection().caret(), Some(Position::at_start(second_id)));
  }

  #[test]
  fn attributes_before_caret() {
    let (mut doc, id) = doc_with("ab");
    doc
      .apply(Operation::SetAttribute {
        block:    id,
        key:      "bold".into(),
        spans:    vec![crate::node::AttributeSpan {
          start: 1,
          end:   2,
          value: Some("true".into()),
        }],
        previous: Vec::new(),
      })
      .unwrap();
    assert_eq!(
      doc.attributes_before(Position::new(id, 2)),
      attributes([("bold", "true")])
    );
    assert!(doc.attributes_before(Position::new(id, 1)).is_empty());
  }
}
