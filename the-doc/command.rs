//! Named, enablement-aware edits.
//!
//! Commands are registered on the [`Model`](crate::model::Model) under a
//! name and run inside a batch through
//! [`Writer::execute`](crate::writer::Writer::execute). A command decides
//! from the current document whether it can run at all; running a disabled
//! command is an error.

use std::{
  collections::HashMap,
  fmt,
};

use smallvec::SmallVec;
use thiserror::Error;

use crate::{
  Tendril,
  document::{
    Document,
    Result,
  },
  node::Attributes,
  position::Range,
  writer::Writer,
};

#[derive(Debug, Error)]
pub enum CommandError {
  #[error("command `{0}` is not registered")]
  Unknown(Tendril),
  #[error("command `{0}` is disabled")]
  Disabled(Tendril),
}

#[derive(Debug, Clone, Default)]
pub struct CommandArgs {
  /// Set (`Some(true)`) or clear (`Some(false)`) instead of toggling.
  pub force_value: Option<bool>,
  /// Act on these ranges instead of the selection.
  pub ranges:      Vec<Range>,
}

impl CommandArgs {
  pub fn forced(value: bool) -> Self {
    Self {
      force_value: Some(value),
      ranges:      Vec::new(),
    }
  }

  pub fn with_ranges(mut self, ranges: impl IntoIterator<Item = Range>) -> Self {
    self.ranges = ranges.into_iter().collect();
    self
  }
}

pub trait Command {
  fn is_enabled(&self, document: &Document) -> bool;

  fn execute(&self, writer: &mut Writer<'_>, args: &CommandArgs) -> Result<()>;
}

#[derive(Default)]
pub struct Commands {
  commands: HashMap<Tendril, Box<dyn Command>>,
}

impl fmt::Debug for Commands {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.commands.keys()).finish()
  }
}

impl Commands {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `command` under `name`, replacing any previous one.
  pub fn add(&mut self, name: impl Into<Tendril>, command: impl Command + 'static) {
    self.commands.insert(name.into(), Box::new(command));
  }

  pub fn get(&self, name: &str) -> Option<&dyn Command> {
    self.commands.get(name).map(|command| command.as_ref())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.commands.contains_key(name)
  }

  /// `None` if no command is registered under `name`.
  pub fn is_enabled(&self, name: &str, document: &Document) -> Option<bool> {
    self.get(name).map(|command| command.is_enabled(document))
  }
}

/// Toggles a text attribute (`key = "true"`) on the selection.
///
/// With a non-collapsed selection the attribute is set on, or removed from,
/// the selected text. With a caret it becomes (or stops being) a typing
/// attribute of the selection. The value defaults to the opposite of the
/// current state and can be forced through [`CommandArgs::force_value`].
#[derive(Debug, Clone)]
pub struct AttributeCommand {
  key:           Tendril,
  disallowed_in: SmallVec<[Tendril; 2]>,
}

impl AttributeCommand {
  pub fn new(key: impl Into<Tendril>) -> Self {
    Self {
      key:           key.into(),
      disallowed_in: SmallVec::new(),
    }
  }

  /// Disable the command while the caret is in a block named `name`.
  pub fn disallow_in(mut self, name: impl Into<Tendril>) -> Self {
    self.disallowed_in.push(name.into());
    self
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  /// True if the whole selection already carries the attribute.
  pub fn is_applied(&self, document: &Document) -> bool {
    let selection = document.selection();
    if selection.is_collapsed() {
      return selection.attribute(&self.key).is_some();
    }
    let Some(range) = selection.range() else {
      return false;
    };
    let Some(block) = document.block(range.block()) else {
      return false;
    };
    block
      .slice(range.start.offset, range.end.offset)
      .iter()
      .all(|run| run.attributes.contains_key(self.key.as_str()))
  }

  fn apply(&self, writer: &mut Writer<'_>, range: Range, value: bool) -> Result<()> {
    if value {
      writer.set_attribute(range, self.key.clone(), "true")
    } else {
      writer.remove_attribute(range, self.key.clone())
    }
  }
}

impl Command for AttributeCommand {
  fn is_enabled(&self, document: &Document) -> bool {
    document
      .focus_block()
      .is_some_and(|block| !self.disallowed_in.iter().any(|name| block.is(name)))
  }

  fn execute(&self, writer: &mut Writer<'_>, args: &CommandArgs) -> Result<()> {
    let value = args
      .force_value
      .unwrap_or_else(|| !self.is_applied(writer.document()));

    if !args.ranges.is_empty() {
      for range in &args.ranges {
        self.apply(writer, *range, value)?;
      }
      return Ok(());
    }

    let selection = writer.selection().clone();
    match selection.range() {
      Some(range) if !range.is_collapsed() => self.apply(writer, range, value),
      Some(_) if value => {
        writer.set_selection_attribute(self.key.clone(), "true");
        Ok(())
      },
      Some(_) => {
        writer.remove_selection_attribute(&self.key);
        Ok(())
      },
      None => Ok(()),
    }
  }
}

/// Turns the caret block into `element` with the given block attributes.
///
/// Disabled when the block already is such an element.
#[derive(Debug, Clone)]
pub struct BlockCommand {
  element:    Tendril,
  attributes: Attributes,
}

impl BlockCommand {
  pub fn new(element: impl Into<Tendril>) -> Self {
    Self {
      element:    element.into(),
      attributes: Attributes::new(),
    }
  }

  pub fn with_attribute(mut self, key: impl Into<Tendril>, value: impl Into<Tendril>) -> Self {
    self.attributes.insert(key.into(), value.into());
    self
  }

  pub fn element(&self) -> &str {
    &self.element
  }
}

impl Command for BlockCommand {
  fn is_enabled(&self, document: &Document) -> bool {
    document.focus_block().is_some_and(|block| {
      !(block.is(&self.element)
        && self
          .attributes
          .iter()
          .all(|(key, value)| block.attribute(key) == Some(value.as_str())))
    })
  }

  fn execute(&self, writer: &mut Writer<'_>, _args: &CommandArgs) -> Result<()> {
    let block = writer.selection().focus().block;
    writer.rename(block, self.element.clone())?;
    for (key, value) in &self.attributes {
      writer.set_block_attribute(block, key.clone(), Some(value.clone()))?;
    }
    Ok(())
  }
}
