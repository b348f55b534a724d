//! Deciding whether a batch is a keystroke worth looking at.

use the_doc::{
  differ::Change,
  model::ChangeEvent,
  position::Position,
};
use tracing::trace;

/// A single character typed by the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
  /// Where the character was inserted.
  pub at: Position,
  pub ch: char,
}

impl Keystroke {
  /// Position right after the typed character.
  pub fn end(&self) -> Position {
    self.at.shifted(1)
  }
}

/// The keystroke `event` consists of, if it is one.
///
/// A batch qualifies when it is local, holds exactly one change, that change
/// inserts exactly one character of text, and the selection is a caret.
/// Everything else (remote or replayed edits, pastes, deletions, typing over
/// a selection) is ignored.
pub fn keystroke(event: &ChangeEvent<'_>) -> Option<Keystroke> {
  let batch = event.batch();
  if !batch.origin.is_local() {
    trace!(%batch.id, origin = ?batch.origin, "skip non-local batch");
    return None;
  }

  let change = single_change(event.changes())?;
  if !change.is_single_char_insert() {
    trace!(%batch.id, kind = ?change.kind, length = change.length, "skip non-typing change");
    return None;
  }

  if !event.selection().is_collapsed() {
    trace!(%batch.id, "skip keystroke with non-collapsed selection");
    return None;
  }

  let block = event.document().block(change.position.block)?;
  let ch = block.text().chars().nth(change.position.offset)?;
  Some(Keystroke {
    at: change.position,
    ch,
  })
}

fn single_change(changes: &[Change]) -> Option<&Change> {
  match changes {
    [change] => Some(change),
    _ => {
      trace!(changes = changes.len(), "skip batch without exactly one change");
      None
    },
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::RefCell,
    rc::Rc,
  };

  use the_doc::{
    batch::BatchOrigin,
    markup,
    model::Model,
    node::Attributes,
  };

  use super::*;

  /// Record what the filter makes of every batch.
  fn observe(model: &mut Model) -> Rc<RefCell<Vec<Option<Keystroke>>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    model.on_change(move |event| {
      log.borrow_mut().push(keystroke(event));
      Ok(())
    });
    seen
  }

  #[test]
  fn typing_one_char_qualifies() {
    let mut model = Model::new();
    markup::set_data(&mut model, "<paragraph>ab[]</paragraph>").unwrap();
    let seen = observe(&mut model);

    model.input_text("c").unwrap();
    let seen = seen.borrow();
    let keystroke = seen[0].unwrap();
    assert_eq!(keystroke.ch, 'c');
    assert_eq!(keystroke.at.offset, 2);
    assert_eq!(keystroke.end().offset, 3);
  }

  #[test]
  fn bulk_remote_and_replayed_edits_do_not_qualify() {
    let mut model = Model::new();
    markup::set_data(&mut model, "<paragraph>ab[]</paragraph>").unwrap();
    let seen = observe(&mut model);

    model.input_text("cd").unwrap();
    model
      .change(BatchOrigin::Transparent, |writer| {
        let at = writer.selection().focus();
        writer.insert_text(at, "e", Attributes::new())
      })
      .unwrap();
    model.undo().unwrap();
    model
      .change(BatchOrigin::Local, |writer| {
        let block = writer.selection().focus().block;
        writer.insert_text(Position::new(block, 0), "x", Attributes::new())?;
        writer.insert_text(Position::new(block, 3), "y", Attributes::new())
      })
      .unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(Option::is_none));
  }

  #[test]
  fn non_collapsed_selection_does_not_qualify() {
    let mut model = Model::new();
    markup::set_data(&mut model, "<paragraph>*foob[ar]</paragraph>").unwrap();
    let seen = observe(&mut model);

    model
      .change(BatchOrigin::Local, |writer| {
        let at = writer.selection().anchor();
        writer.insert_text(at, "*", Attributes::new())
      })
      .unwrap();
    assert_eq!(seen.borrow()[0], None);
  }
}
