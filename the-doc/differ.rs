//! Change notifications.
//!
//! The differ turns the operations of one batch into the list of [`Change`]s
//! reported to listeners once the batch is done. It keeps the list compact
//! the way observers expect it:
//!
//! - typing `a` then `b` at the following offset is one insert of length 2
//! - attribute changes on text inserted by the same batch are not reported
//!   separately, the insert already covers them
//! - renaming a block is reported as the old element removed and the new one
//!   inserted

use crate::{
  TEXT_NODE,
  Tendril,
  node::runs_len,
  operation::Operation,
  position::Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
  Insert,
  Remove,
  Attribute,
  Move,
}

/// One entry of a batch's change list.
///
/// For text changes `name` is [`TEXT_NODE`] and `position`/`length` locate the
/// text. For element changes `name` is the element name, `position` is the
/// start of the block and `length` is 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
  pub kind:      ChangeKind,
  pub name:      Tendril,
  pub position:  Position,
  pub length:    usize,
  /// Attribute key, for [`ChangeKind::Attribute`].
  pub attribute: Option<Tendril>,
}

impl Change {
  fn new(kind: ChangeKind, name: &str, position: Position, length: usize) -> Self {
    Self {
      kind,
      name: name.into(),
      position,
      length,
      attribute: None,
    }
  }

  pub fn is_text(&self) -> bool {
    self.name == TEXT_NODE
  }

  /// True for the change produced by typing a single character.
  pub fn is_single_char_insert(&self) -> bool {
    self.kind == ChangeKind::Insert && self.is_text() && self.length == 1
  }
}

#[derive(Debug, Default)]
pub struct Differ {
  changes: Vec<Change>,
}

impl Differ {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.changes.is_empty()
  }

  pub fn changes(&self) -> &[Change] {
    &self.changes
  }

  pub fn take(&mut self) -> Vec<Change> {
    std::mem::take(&mut self.changes)
  }

  /// Record an applied operation.
  pub fn record(&mut self, operation: &Operation) {
    if operation.is_noop() {
      return;
    }

    match operation {
      Operation::InsertText { at, content } => {
        let length = runs_len(content);
        if let Some(last) = self.changes.last_mut()
          && last.kind == ChangeKind::Insert
          && last.is_text()
          && last.position.block == at.block
          && last.position.offset + last.length == at.offset
        {
          last.length += length;
          return;
        }
        self
          .changes
          .push(Change::new(ChangeKind::Insert, TEXT_NODE, *at, length));
      },
      Operation::RemoveText { range, .. } => {
        self.changes.push(Change::new(
          ChangeKind::Remove,
          TEXT_NODE,
          range.start,
          range.len(),
        ));
      },
      Operation::SetAttribute {
        block, key, spans, ..
      } => {
        for span in spans.iter().filter(|span| span.start < span.end) {
          let position = Position::new(*block, span.start);
          let length = span.end - span.start;
          if self.covered_by_insert(position, length) {
            continue;
          }
          let mut change = Change::new(ChangeKind::Attribute, TEXT_NODE, position, length);
          change.attribute = Some(key.clone());
          self.changes.push(change);
        }
      },
      Operation::SetBlockAttribute { block, key, .. } => {
        let mut change = Change::new(ChangeKind::Attribute, "", Position::at_start(*block), 1);
        change.attribute = Some(key.clone());
        self.changes.push(change);
      },
      Operation::Rename { block, from, to } => {
        let at = Position::at_start(*block);
        self.changes.push(Change::new(ChangeKind::Remove, from, at, 1));
        self.changes.push(Change::new(ChangeKind::Insert, to, at, 1));
      },
      Operation::InsertBlock { block, .. } => {
        self.changes.push(Change::new(
          ChangeKind::Insert,
          block.name(),
          Position::at_start(block.id()),
          1,
        ));
      },
      Operation::RemoveBlock { id, block, .. } => {
        let name = block.as_ref().map(|block| block.name()).unwrap_or_default();
        self.changes.push(Change::new(
          ChangeKind::Remove,
          name,
          Position::at_start(*id),
          1,
        ));
      },
      Operation::MoveBlock { block, .. } => {
        self.changes.push(Change::new(
          ChangeKind::Move,
          "",
          Position::at_start(*block),
          1,
        ));
      },
    }
  }

  fn covered_by_insert(&self, position: Position, length: usize) -> bool {
    self.changes.iter().any(|change| {
      change.kind == ChangeKind::Insert
        && change.is_text()
        && change.position.block == position.block
        && change.position.offset <= position.offset
        && position.offset + length <= change.position.offset + change.length
    })
  }
}
