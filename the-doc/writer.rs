//! The mutation API available inside a batch.
//!
//! A [`Writer`] borrows the document for the duration of one batch. Every
//! method validates its arguments against the current document state and
//! either applies one or more operations or returns an error without touching
//! anything. The operations applied so far are recorded for the history and
//! fed to the differ for change notifications.

use crate::{
  Tendril,
  batch::Batch,
  command::{
    CommandArgs,
    CommandError,
    Commands,
  },
  differ::{
    Change,
    Differ,
  },
  document::{
    Document,
    DocumentError,
    Result,
  },
  live_range::LiveRangeId,
  node::{
    AttributeSpan,
    Attributes,
    Block,
    BlockId,
    Runs,
    TextRun,
  },
  operation::Operation,
  position::{
    Position,
    Range,
  },
  selection::Selection,
};

pub struct Writer<'a> {
  document:   &'a mut Document,
  commands:   &'a Commands,
  batch:      Batch,
  operations: Vec<Operation>,
  differ:     Differ,
}

impl<'a> Writer<'a> {
  pub(crate) fn new(document: &'a mut Document, commands: &'a Commands, batch: Batch) -> Self {
    Self {
      document,
      commands,
      batch,
      operations: Vec::new(),
      differ: Differ::new(),
    }
  }

  pub fn batch(&self) -> Batch {
    self.batch
  }

  pub fn document(&self) -> &Document {
    self.document
  }

  pub fn selection(&self) -> &Selection {
    self.document.selection()
  }

  /// True once this batch applied at least one operation.
  pub fn has_changes(&self) -> bool {
    !self.operations.is_empty()
  }

  pub(crate) fn apply_operation(&mut self, operation: Operation) -> Result<()> {
    if operation.is_noop() {
      return Ok(());
    }
    let applied = self.document.apply(operation)?;
    self.differ.record(&applied);
    self.operations.push(applied);
    Ok(())
  }

  /// Hand back the applied operations and the resulting changes.
  pub(crate) fn finish(mut self) -> (Vec<Operation>, Vec<Change>) {
    let changes = self.differ.take();
    (self.operations, changes)
  }

  pub fn insert_text(
    &mut self,
    at: Position,
    text: impl Into<Tendril>,
    attributes: Attributes,
  ) -> Result<()> {
    self.insert(at, Runs::from_elem(TextRun::with_attributes(text, attributes), 1))
  }

  pub fn insert(&mut self, at: Position, content: Runs) -> Result<()> {
    self.apply_operation(Operation::InsertText { at, content })
  }

  pub fn remove(&mut self, range: Range) -> Result<()> {
    self.apply_operation(Operation::RemoveText {
      range,
      removed: Runs::new(),
    })
  }

  /// Replace `range` with `text`.
  pub fn replace(
    &mut self,
    range: Range,
    text: impl Into<Tendril>,
    attributes: Attributes,
  ) -> Result<()> {
    self.document.validate_range(range)?;
    self.remove(range)?;
    self.insert_text(range.start, text, attributes)
  }

  pub fn set_attribute(
    &mut self,
    range: Range,
    key: impl Into<Tendril>,
    value: impl Into<Tendril>,
  ) -> Result<()> {
    self.set_attribute_value(range, key.into(), Some(value.into()))
  }

  pub fn remove_attribute(&mut self, range: Range, key: impl Into<Tendril>) -> Result<()> {
    self.set_attribute_value(range, key.into(), None)
  }

  fn set_attribute_value(&mut self, range: Range, key: Tendril, value: Option<Tendril>) -> Result<()> {
    self.document.validate_range(range)?;
    self.apply_operation(Operation::SetAttribute {
      block: range.block(),
      key,
      spans: vec![AttributeSpan {
        start: range.start.offset,
        end: range.end.offset,
        value,
      }],
      previous: Vec::new(),
    })
  }

  pub fn set_block_attribute(
    &mut self,
    block: BlockId,
    key: impl Into<Tendril>,
    value: Option<Tendril>,
  ) -> Result<()> {
    let key = key.into();
    let current = self
      .document
      .block(block)
      .ok_or(DocumentError::UnknownBlock(block))?
      .attribute(&key)
      .map(Tendril::from);
    if current == value {
      return Ok(());
    }
    self.apply_operation(Operation::SetBlockAttribute {
      block,
      key,
      value,
      previous: None,
    })
  }

  /// Change the element name of `block`.
  pub fn rename(&mut self, block: BlockId, name: impl Into<Tendril>) -> Result<()> {
    let from: Tendril = self
      .document
      .block(block)
      .ok_or(DocumentError::UnknownBlock(block))?
      .name()
      .into();
    self.apply_operation(Operation::Rename {
      block,
      from,
      to: name.into(),
    })
  }

  /// Allocate a detached block; insert it with [`Writer::insert_block`].
  pub fn create_block(&mut self, name: &str) -> Block {
    self.document.create_block(name)
  }

  pub fn insert_block(&mut self, index: usize, block: Block) -> Result<BlockId> {
    let id = block.id();
    self.apply_operation(Operation::InsertBlock { index, block })?;
    Ok(id)
  }

  pub fn remove_block(&mut self, id: BlockId) -> Result<()> {
    self.apply_operation(Operation::RemoveBlock {
      id,
      index: 0,
      block: None,
    })
  }

  pub fn move_block(&mut self, id: BlockId, to: usize) -> Result<()> {
    let from = self
      .document
      .block_index(id)
      .ok_or(DocumentError::UnknownBlock(id))?;
    self.apply_operation(Operation::MoveBlock {
      block: id,
      from,
      to,
    })
  }

  pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
    self.document.set_selection(selection)
  }

  /// Collapse the selection at `position`, taking the typing attributes from
  /// the text before it.
  pub fn set_caret(&mut self, position: Position) -> Result<()> {
    let attributes = self.document.attributes_before(position);
    self.set_selection(Selection::collapsed(position).with_attributes(attributes))
  }

  pub fn set_selection_attribute(&mut self, key: impl Into<Tendril>, value: impl Into<Tendril>) {
    self.document.selection_mut().set_attribute(key, value);
  }

  pub fn remove_selection_attribute(&mut self, key: &str) {
    self.document.selection_mut().remove_attribute(key);
  }

  /// Track `range` until [`Writer::detach_live_range`].
  pub fn create_live_range(&mut self, range: Range) -> Result<LiveRangeId> {
    self.document.validate_range(range)?;
    Ok(self.document.live_ranges_mut().insert(range))
  }

  /// Track a collapsed position that stays before text inserted at it.
  pub fn create_marker(&mut self, position: Position) -> Result<LiveRangeId> {
    self.document.validate_position(position)?;
    Ok(self.document.live_ranges_mut().insert_marker(position))
  }

  /// Current value of a live range, `None` once it no longer maps to the
  /// document.
  pub fn live_range(&self, id: LiveRangeId) -> Option<Range> {
    self.document.live_range(id)
  }

  pub fn detach_live_range(&mut self, id: LiveRangeId) -> bool {
    self.document.live_ranges_mut().remove(id)
  }

  pub fn is_command_enabled(&self, name: &str) -> Option<bool> {
    self.commands.is_enabled(name, self.document)
  }

  /// Run a registered command inside this batch.
  pub fn execute(&mut self, name: &str, args: &CommandArgs) -> Result<()> {
    let commands = self.commands;
    let command = commands
      .get(name)
      .ok_or_else(|| CommandError::Unknown(name.into()))?;
    if !command.is_enabled(self.document) {
      return Err(CommandError::Disabled(name.into()).into());
    }
    command.execute(self, args)
  }
}
