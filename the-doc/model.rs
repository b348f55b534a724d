//! Batches, change listeners and the change queue.
//!
//! [`Model::change`] runs one batch against the document:
//!
//! ```text
//! change(origin, f)
//!   ├─ f(&mut Writer)          edits, recorded as operations
//!   ├─ history.commit          one revision per batch that changed something
//!   ├─ dispatch(changes)       every listener sees the batch's changes
//!   └─ flush queue             batches enqueued by listeners, FIFO, each
//!                              committed and dispatched the same way
//! ```
//!
//! Listeners only get read access to the document. To edit in reaction to a
//! change they call [`ChangeEvent::enqueue_change`]; the queued closure runs
//! as its own batch after every listener has seen the current one, so its
//! edits are never part of the batch that triggered them.

use std::{
  collections::VecDeque,
  num::NonZeroU64,
};

use thiserror::Error;
use tracing::{
  debug,
  trace,
};

use crate::{
  batch::{
    Batch,
    BatchId,
    BatchOrigin,
  },
  command::Commands,
  differ::Change,
  document::{
    self,
    Document,
    DocumentError,
  },
  history::{
    History,
    HistoryError,
    HistoryJump,
  },
  live_range::LiveRangeId,
  selection::Selection,
  writer::Writer,
};

#[derive(Debug, Error)]
pub enum ModelError {
  #[error(transparent)]
  Document(#[from] DocumentError),
  #[error(transparent)]
  History(#[from] HistoryError),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// A batch body queued by a listener.
pub type ChangeFn = Box<dyn FnOnce(&mut Writer<'_>) -> document::Result<()>>;

pub type Listener = Box<dyn FnMut(&mut ChangeEvent<'_>) -> document::Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(NonZeroU64);

struct Pending {
  origin: BatchOrigin,
  change: ChangeFn,
}

/// What a listener sees of a finished batch.
pub struct ChangeEvent<'a> {
  batch:    Batch,
  changes:  &'a [Change],
  document: &'a Document,
  commands: &'a Commands,
  queue:    &'a mut VecDeque<Pending>,
}

impl ChangeEvent<'_> {
  pub fn batch(&self) -> Batch {
    self.batch
  }

  pub fn changes(&self) -> &[Change] {
    self.changes
  }

  pub fn document(&self) -> &Document {
    self.document
  }

  pub fn selection(&self) -> &Selection {
    self.document.selection()
  }

  pub fn is_command_enabled(&self, name: &str) -> Option<bool> {
    self.commands.is_enabled(name, self.document)
  }

  /// Queue a local batch to run once the current batch has been dispatched.
  pub fn enqueue_change<F>(&mut self, change: F)
  where
    F: FnOnce(&mut Writer<'_>) -> document::Result<()> + 'static,
  {
    self.enqueue_change_with(BatchOrigin::Local, change);
  }

  pub fn enqueue_change_with<F>(&mut self, origin: BatchOrigin, change: F)
  where
    F: FnOnce(&mut Writer<'_>) -> document::Result<()> + 'static,
  {
    self.queue.push_back(Pending {
      origin,
      change: Box::new(change),
    });
  }
}

pub struct Model {
  document:      Document,
  history:       History,
  commands:      Commands,
  listeners:     Vec<(ListenerId, Listener)>,
  queue:         VecDeque<Pending>,
  next_batch:    NonZeroU64,
  next_listener: NonZeroU64,
}

impl Default for Model {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for Model {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Model")
      .field("document", &self.document)
      .field("history", &self.history)
      .field("commands", &self.commands)
      .field("listeners", &self.listeners.len())
      .finish_non_exhaustive()
  }
}

impl Model {
  pub fn new() -> Self {
    Self::with_document(Document::new())
  }

  pub fn with_document(document: Document) -> Self {
    Self {
      document,
      history: History::default(),
      commands: Commands::new(),
      listeners: Vec::new(),
      queue: VecDeque::new(),
      next_batch: NonZeroU64::MIN,
      next_listener: NonZeroU64::MIN,
    }
  }

  pub fn document(&self) -> &Document {
    &self.document
  }

  /// Replace the whole document and forget the history. Live ranges of the
  /// old document are dropped with it.
  pub fn set_document(&mut self, document: Document) {
    self.document = document;
    self.history = History::default();
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  pub fn commands(&self) -> &Commands {
    &self.commands
  }

  pub fn commands_mut(&mut self) -> &mut Commands {
    &mut self.commands
  }

  pub fn is_command_enabled(&self, name: &str) -> Option<bool> {
    self.commands.is_enabled(name, &self.document)
  }

  /// Stop tracking a live range outside of any batch.
  pub fn detach_live_range(&mut self, id: LiveRangeId) -> bool {
    self.document.live_ranges_mut().remove(id)
  }

  /// Subscribe to the changes of every batch.
  pub fn on_change<F>(&mut self, listener: F) -> ListenerId
  where
    F: FnMut(&mut ChangeEvent<'_>) -> document::Result<()> + 'static,
  {
    let id = ListenerId(self.next_listener);
    self.next_listener = self.next_listener.saturating_add(1);
    self.listeners.push((id, Box::new(listener)));
    id
  }

  /// Unsubscribe. Returns false if `id` was not subscribed.
  pub fn off(&mut self, id: ListenerId) -> bool {
    let len = self.listeners.len();
    self.listeners.retain(|(listener, _)| *listener != id);
    self.listeners.len() != len
  }

  /// Run `f` as a new batch, notify listeners, then run whatever they queued.
  pub fn change<R, F>(&mut self, origin: BatchOrigin, f: F) -> Result<R>
  where
    F: FnOnce(&mut Writer<'_>) -> document::Result<R>,
  {
    let (value, batch, changes) = self.run_batch(origin, f)?;
    self.dispatch(batch, &changes)?;
    self.flush()?;
    Ok(value)
  }

  /// Type `text` at the selection as a single local batch, the way a
  /// keystroke does. A non-collapsed selection is replaced.
  pub fn input_text(&mut self, text: &str) -> Result<()> {
    let text = text.to_owned();
    self.change(BatchOrigin::Local, move |writer| {
      let selection = writer.selection().clone();
      if let Some(range) = selection.range()
        && !range.is_collapsed()
      {
        writer.remove(range)?;
      }
      let at = writer.selection().focus();
      writer.insert_text(at, text.as_str(), selection.attributes().clone())
    })
  }

  pub fn undo(&mut self) -> Result<bool> {
    match self.history.undo() {
      Some(jump) => self.replay(BatchOrigin::Undo, jump).map(|()| true),
      None => Ok(false),
    }
  }

  pub fn redo(&mut self) -> Result<bool> {
    match self.history.redo() {
      Some(jump) => self.replay(BatchOrigin::Redo, jump).map(|()| true),
      None => Ok(false),
    }
  }

  fn replay(&mut self, origin: BatchOrigin, jump: HistoryJump) -> Result<()> {
    let steps = jump.steps.clone();
    let ((), batch, changes) = self.run_batch(origin, move |writer| {
      for step in steps {
        for operation in step.operations {
          writer.apply_operation(operation)?;
        }
        if let Some(selection) = step.selection {
          writer.set_selection(selection)?;
        }
      }
      Ok(())
    })?;
    self.history.apply_jump(&jump)?;
    self.dispatch(batch, &changes)?;
    self.flush()
  }

  fn next_batch_id(&mut self) -> BatchId {
    let id = BatchId::new(self.next_batch);
    self.next_batch = self.next_batch.saturating_add(1);
    id
  }

  /// Run one batch and commit it. Edits made before `f` failed are still
  /// committed, so they stay undoable.
  fn run_batch<R, F>(&mut self, origin: BatchOrigin, f: F) -> Result<(R, Batch, Vec<Change>)>
  where
    F: FnOnce(&mut Writer<'_>) -> document::Result<R>,
  {
    let batch = Batch {
      id: self.next_batch_id(),
      origin,
    };
    let selection_before = self.document.selection().clone();

    let mut writer = Writer::new(&mut self.document, &self.commands, batch);
    let result = f(&mut writer);
    let (operations, changes) = writer.finish();

    if !origin.is_history() && !operations.is_empty() {
      trace!(%batch.id, ?origin, operations = operations.len(), "commit batch");
      let selection_after = self.document.selection().clone();
      self
        .history
        .commit_revision(batch.id, operations, selection_before, selection_after)?;
    }

    match result {
      Ok(value) => Ok((value, batch, changes)),
      Err(err) => {
        self.queue.clear();
        Err(err.into())
      },
    }
  }

  fn dispatch(&mut self, batch: Batch, changes: &[Change]) -> Result<()> {
    if changes.is_empty() {
      return Ok(());
    }
    debug!(%batch.id, ?batch.origin, changes = changes.len(), "dispatch changes");
    for (_, listener) in self.listeners.iter_mut() {
      let mut event = ChangeEvent {
        batch,
        changes,
        document: &self.document,
        commands: &self.commands,
        queue: &mut self.queue,
      };
      if let Err(err) = listener(&mut event) {
        self.queue.clear();
        return Err(err.into());
      }
    }
    Ok(())
  }

  fn flush(&mut self) -> Result<()> {
    while let Some(Pending { origin, change }) = self.queue.pop_front() {
      let ((), batch, changes) = self.run_batch(origin, change)?;
      self.dispatch(batch, &changes)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::RefCell,
    rc::Rc,
  };

  use super::*;
  use crate::{
    differ::ChangeKind,
    position::Position,
  };

  fn text(model: &Model) -> String {
    model.document().blocks()[0].text()
  }

  #[test]
  fn listeners_see_each_batch() {
    let mut model = Model::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    model.on_change(move |event| {
      log
        .borrow_mut()
        .push((event.batch().origin, event.changes().to_vec()));
      Ok(())
    });

    model.input_text("a").unwrap();
    model.input_text("b").unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].1[0].is_single_char_insert());
    assert_eq!(seen[1].1[0].position.offset, 1);
  }

  #[test]
  fn enqueued_change_is_a_separate_batch() {
    let mut model = Model::new();
    let batches = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&batches);
    model.on_change(move |event| {
      log.borrow_mut().push(event.batch().id);
      if event.batch().origin.is_local()
        && event.changes()[0].kind == ChangeKind::Insert
        && event.document().blocks()[0].text() == "ab"
      {
        let block = event.document().blocks()[0].id();
        event.enqueue_change(move |writer| {
          writer.insert_text(Position::at_start(block), ">", Default::default())
        });
      }
      Ok(())
    });

    model.input_text("a").unwrap();
    model.input_text("b").unwrap();
    assert_eq!(text(&model), ">ab");
    assert_eq!(batches.borrow().len(), 3);

    model.undo().unwrap();
    assert_eq!(text(&model), "ab");
    model.undo().unwrap();
    assert_eq!(text(&model), "a");
    model.redo().unwrap();
    assert_eq!(text(&model), "ab");
  }

  #[test]
  fn off_unsubscribes() {
    let mut model = Model::new();
    let count = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&count);
    let id = model.on_change(move |_| {
      *counter.borrow_mut() += 1;
      Ok(())
    });
    model.input_text("a").unwrap();
    assert!(model.off(id));
    assert!(!model.off(id));
    model.input_text("b").unwrap();
    assert_eq!(*count.borrow(), 1);
  }

  #[test]
  fn failing_batch_keeps_partial_edits_undoable() {
    let mut model = Model::new();
    let block = model.document().blocks()[0].id();
    let err = model
      .change(BatchOrigin::Local, |writer| {
        writer.insert_text(Position::at_start(block), "x", Default::default())?;
        Err::<(), _>(DocumentError::callback("boom"))
      })
      .unwrap_err();
    assert!(matches!(err, ModelError::Document(DocumentError::Callback(_))));
    assert_eq!(text(&model), "x");
    assert!(model.undo().unwrap());
    assert_eq!(text(&model), "");
    assert!(!model.undo().unwrap());
  }

  #[test]
  fn moved_block_is_undone() {
    let mut model = Model::new();
    crate::markup::set_data(&mut model, "<paragraph>a</paragraph><heading1>b[]</heading1>").unwrap();
    let heading = model.document().blocks()[1].id();

    model
      .change(BatchOrigin::Local, |writer| writer.move_block(heading, 0))
      .unwrap();
    assert_eq!(
      crate::markup::get_data(&model),
      "<heading1>b[]</heading1><paragraph>a</paragraph>"
    );

    assert!(model.undo().unwrap());
    assert_eq!(
      crate::markup::get_data(&model),
      "<paragraph>a</paragraph><heading1>b[]</heading1>"
    );
  }

  quickcheck::quickcheck! {
      fn test_undo_redo_roundtrip(words: Vec<String>) -> bool {
          let mut model = Model::new();
          for word in &words {
              model.input_text(word).unwrap();
          }
          let typed = text(&model);
          while model.undo().unwrap() {}
          let undone = text(&model);
          while model.redo().unwrap() {}
          undone.is_empty() && text(&model) == typed
      }
  }
}
