//! The document selection.
//!
//! A [`Selection`] has two positions: `anchor` and `focus`. The `focus` is
//! where the caret visually appears. When both are equal the selection is
//! collapsed to a caret.
//!
//! ```text
//! anchor=2, focus=7: "he[llo w]orld"  (forward selection)
//! anchor=7, focus=2: "he]llo w[orld"  (backward selection)
//! anchor=5, focus=5: "hello|world"    (caret)
//! ```
//!
//! The selection also carries the attributes that text typed at it will get
//! (bold after toggling bold with a collapsed caret, for instance).
//!
//! The selection is mapped through every applied operation. Both positions
//! move after text inserted exactly at them, so typing at the caret advances
//! it.

use crate::{
  Tendril,
  node::Attributes,
  operation::Operation,
  position::{
    Assoc,
    Position,
    Range,
  },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
  anchor:     Position,
  focus:      Position,
  attributes: Attributes,
}

impl Selection {
  pub fn new(anchor: Position, focus: Position) -> Self {
    Self {
      anchor,
      focus,
      attributes: Attributes::new(),
    }
  }

  pub fn collapsed(position: Position) -> Self {
    Self::new(position, position)
  }

  pub fn with_attributes(mut self, attributes: Attributes) -> Self {
    self.attributes = attributes;
    self
  }

  pub fn anchor(&self) -> Position {
    self.anchor
  }

  pub fn focus(&self) -> Position {
    self.focus
  }

  pub fn is_collapsed(&self) -> bool {
    self.anchor == self.focus
  }

  /// The caret position when the selection is collapsed.
  pub fn caret(&self) -> Option<Position> {
    self.is_collapsed().then_some(self.focus)
  }

  /// The selected range when both ends are in the same block.
  pub fn range(&self) -> Option<Range> {
    (self.anchor.block == self.focus.block).then(|| {
      Range::new(self.anchor.block, self.anchor.offset, self.focus.offset)
    })
  }

  pub fn attributes(&self) -> &Attributes {
    &self.attributes
  }

  pub fn attribute(&self, key: &str) -> Option<&str> {
    self.attributes.get(key).map(Tendril::as_str)
  }

  pub fn set_attribute(&mut self, key: impl Into<Tendril>, value: impl Into<Tendril>) {
    self.attributes.insert(key.into(), value.into());
  }

  pub fn remove_attribute(&mut self, key: &str) -> Option<Tendril> {
    self.attributes.remove(key)
  }

  /// Map both ends through an applied operation. Returns `None` if either end
  /// lived in a removed block.
  pub fn map(&self, operation: &Operation) -> Option<Self> {
    let anchor = operation.map_position(self.anchor, Assoc::After)?;
    let focus = operation.map_position(self.focus, Assoc::After)?;
    Some(Self {
      anchor,
      focus,
      attributes: self.attributes.clone(),
    })
  }
}

#[cfg(test)]
mod tests {
  use std::num::NonZeroUsize;

  use smallvec::smallvec;

  use super::*;
  use crate::node::{
    BlockId,
    TextRun,
  };

  fn pos(offset: usize) -> Position {
    Position::new(BlockId::new(NonZeroUsize::new(1).unwrap()), offset)
  }

  #[test]
  fn caret_advances_when_typing() {
    let selection = Selection::collapsed(pos(3));
    let op = Operation::InsertText {
      at:      pos(3),
      content: smallvec![TextRun::new("x")],
    };
    let mapped = selection.map(&op).unwrap();
    assert_eq!(mapped.caret(), Some(pos(4)));
  }

  #[test]
  fn non_collapsed_has_no_caret() {
    let selection = Selection::new(pos(1), pos(4));
    assert!(!selection.is_collapsed());
    assert_eq!(selection.caret(), None);
    assert_eq!(selection.range().map(|r| r.len()), Some(3));
  }
}
