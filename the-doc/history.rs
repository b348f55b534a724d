use std::num::NonZeroUsize;

use thiserror::Error;

use crate::{
  batch::BatchId,
  operation::Operation,
  selection::Selection,
};

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Error)]
pub enum HistoryError {
  #[error("revision index {index} is out of bounds (max: {max})")]
  RevisionOutOfBounds { index: usize, max: usize },
  #[error("{0} has no operations to record")]
  EmptyRevision(BatchId),
}

/// Operations to apply in order, and the selection to restore after them.
#[derive(Debug, Clone, Default)]
pub struct HistoryStep {
  pub operations: Vec<Operation>,
  pub selection:  Option<Selection>,
}

/// A pending jump in history that has not been applied yet.
///
/// Returned by [`History::undo`] and [`History::redo`]. The caller applies
/// every step and only then calls [`History::apply_jump`], so the history
/// never runs ahead of the document.
#[derive(Debug, Clone)]
pub struct HistoryJump {
  pub steps:  Vec<HistoryStep>,
  /// The revision the document is at once every step is applied.
  pub target: usize,
}

impl HistoryJump {
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.steps.len()
  }
}

/// The undo tree of a document.
///
/// Revisions live in a vector whose first element is an empty root. Every
/// other revision records the batch that created it, the applied operations
/// of that batch (its forward step) and their inversion (its backward step).
/// Undo applies the backward step of the current revision and moves to its
/// parent. Redo applies the forward step of the current revision's last
/// child.
///
/// Committing while not at the tip starts a new branch: the current revision's
/// `last_child` is repointed at the new revision, and redo follows the newest
/// branch only.
#[derive(Debug)]
pub struct History {
  revisions: Vec<Revision>,
  current:   usize,
}

#[derive(Debug, Clone)]
struct Revision {
  parent:     usize,
  last_child: Option<NonZeroUsize>,
  batch:      Option<BatchId>,
  forward:    HistoryStep,
  backward:   HistoryStep,
}

impl Default for History {
  fn default() -> Self {
    Self {
      revisions: vec![Revision {
        parent:     0,
        last_child: None,
        batch:      None,
        forward:    HistoryStep::default(),
        backward:   HistoryStep::default(),
      }],
      current:   0,
    }
  }
}

impl History {
  /// Record a batch. `operations` are the applied operations in the order
  /// they were applied.
  pub fn commit_revision(
    &mut self,
    batch: BatchId,
    operations: Vec<Operation>,
    selection_before: Selection,
    selection_after: Selection,
  ) -> Result<()> {
    if operations.is_empty() {
      return Err(HistoryError::EmptyRevision(batch));
    }

    let inversion = operations.iter().rev().map(Operation::invert).collect();

    let new_current = self.revisions.len();
    self.revisions[self.current].last_child = NonZeroUsize::new(new_current);
    self.revisions.push(Revision {
      parent:     self.current,
      last_child: None,
      batch:      Some(batch),
      forward:    HistoryStep {
        operations,
        selection: Some(selection_after),
      },
      backward:   HistoryStep {
        operations: inversion,
        selection:  Some(selection_before),
      },
    });
    self.current = new_current;
    Ok(())
  }

  #[inline]
  pub fn current_revision(&self) -> usize {
    self.current
  }

  /// The batch that produced the current revision.
  pub fn current_batch(&self) -> Option<BatchId> {
    self.revisions[self.current].batch
  }

  #[inline]
  pub const fn at_root(&self) -> bool {
    self.current == 0
  }

  /// Number of revisions, root included.
  #[inline]
  pub fn len(&self) -> usize {
    self.revisions.len()
  }

  /// True if only the root revision exists.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.revisions.len() <= 1
  }

  fn validate_revision(&self, revision: usize) -> Result<()> {
    if revision >= self.revisions.len() {
      return Err(HistoryError::RevisionOutOfBounds {
        index: revision,
        max:   self.revisions.len().saturating_sub(1),
      });
    }
    Ok(())
  }

  pub fn undo(&self) -> Option<HistoryJump> {
    if self.at_root() {
      return None;
    }

    let current_revision = &self.revisions[self.current];
    Some(HistoryJump {
      steps:  vec![current_revision.backward.clone()],
      target: current_revision.parent,
    })
  }

  pub fn redo(&self) -> Option<HistoryJump> {
    let last_child = self.revisions[self.current].last_child?;

    Some(HistoryJump {
      steps:  vec![self.revisions[last_child.get()].forward.clone()],
      target: last_child.get(),
    })
  }

  /// Move to the jump's target. Call only after every step was applied.
  pub fn apply_jump(&mut self, jump: &HistoryJump) -> Result<()> {
    self.validate_revision(jump.target)?;
    self.current = jump.target;
    Ok(())
  }
}
