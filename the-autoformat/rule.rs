//! Registered rules and the actions they run.

use std::{
  fmt,
  rc::Rc,
};

use regex::Regex;
use the_doc::{
  Tendril,
  document,
  position::Range,
  writer::Writer,
};

use crate::matcher::{
  BlockMatch,
  InlineMatcher,
};

/// Rules with a higher priority are tried first; equal priorities keep
/// registration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
  Low,
  #[default]
  Normal,
  High,
}

/// What an action reports back about the matched trigger text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionOutcome {
  /// The action did not say; the trigger text is removed.
  #[default]
  Default,
  /// Remove the trigger text.
  RemoveTrigger,
  /// The action took care of the trigger text; leave it alone.
  KeepTrigger,
}

impl ActionOutcome {
  pub fn removes_trigger(self) -> bool {
    self != ActionOutcome::KeepTrigger
  }
}

pub type BlockCallback = dyn Fn(&mut Writer<'_>, &BlockMatch) -> document::Result<ActionOutcome>;

pub type InlineCallback = dyn Fn(&mut Writer<'_>, &[Range]) -> document::Result<ActionOutcome>;

#[derive(Clone)]
pub enum BlockAction {
  /// Execute the named command. Also gates the rule: while the command is
  /// disabled the rule is skipped.
  Command(Tendril),
  Callback(Rc<BlockCallback>),
}

impl BlockAction {
  pub fn callback(
    f: impl Fn(&mut Writer<'_>, &BlockMatch) -> document::Result<ActionOutcome> + 'static,
  ) -> Self {
    BlockAction::Callback(Rc::new(f))
  }
}

impl From<&str> for BlockAction {
  fn from(command: &str) -> Self {
    BlockAction::Command(command.into())
  }
}

impl fmt::Debug for BlockAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BlockAction::Command(name) => f.debug_tuple("Command").field(name).finish(),
      BlockAction::Callback(_) => f.write_str("Callback"),
    }
  }
}

#[derive(Clone)]
pub enum InlineAction {
  /// Set the attribute named like the command to `"true"` on every format
  /// range, then drop it from the selection. Gated by the command.
  Command(Tendril),
  Callback(Rc<InlineCallback>),
}

impl InlineAction {
  pub fn callback(
    f: impl Fn(&mut Writer<'_>, &[Range]) -> document::Result<ActionOutcome> + 'static,
  ) -> Self {
    InlineAction::Callback(Rc::new(f))
  }
}

impl From<&str> for InlineAction {
  fn from(command: &str) -> Self {
    InlineAction::Command(command.into())
  }
}

impl fmt::Debug for InlineAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InlineAction::Command(name) => f.debug_tuple("Command").field(name).finish(),
      InlineAction::Callback(_) => f.write_str("Callback"),
    }
  }
}

/// Converts a whole paragraph whose text matches `pattern`.
#[derive(Debug, Clone)]
pub struct BlockRule {
  pub pattern:  Regex,
  pub action:   BlockAction,
  pub priority: Priority,
}

impl BlockRule {
  pub fn new(pattern: Regex, action: impl Into<BlockAction>) -> Self {
    Self {
      pattern,
      action: action.into(),
      priority: Priority::default(),
    }
  }

  pub fn with_priority(mut self, priority: Priority) -> Self {
    self.priority = priority;
    self
  }

  pub fn gate(&self) -> Option<&str> {
    match &self.action {
      BlockAction::Command(name) => Some(name.as_str()),
      BlockAction::Callback(_) => None,
    }
  }
}

/// Formats running text before the caret.
#[derive(Debug, Clone)]
pub struct InlineRule {
  pub matcher:  InlineMatcher,
  pub action:   InlineAction,
  pub priority: Priority,
}

impl InlineRule {
  pub fn new(matcher: InlineMatcher, action: impl Into<InlineAction>) -> Self {
    Self {
      matcher,
      action: action.into(),
      priority: Priority::default(),
    }
  }

  pub fn with_priority(mut self, priority: Priority) -> Self {
    self.priority = priority;
    self
  }

  pub fn gate(&self) -> Option<&str> {
    match &self.action {
      InlineAction::Command(name) => Some(name.as_str()),
      InlineAction::Callback(_) => None,
    }
  }
}
