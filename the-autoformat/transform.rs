//! Literal text substitution on trigger characters.
//!
//! A [`TextTransformation`] holds an ordered table of literal keys and their
//! replacements. When a trigger character (a space, say) is typed, the text
//! right before it is checked against the keys in table order and the first
//! key it ends with is replaced:
//!
//! ```text
//! keys: "---" -> "—", "--" -> "–"
//!
//! "a ---|" + " "  =>  "a — |"
//! "a --|"  + " "  =>  "a – |"
//! ```
//!
//! Order matters when one key ends with another: a longer key has to come
//! first or the shorter one always wins.
//!
//! The search never looks further left than the end of the last replacement
//! made in the same block (see [`SearchBoundary`]), so text that was already
//! transformed, or text around a transformation that was undone, is not
//! picked up again.

use std::{
  cell::Cell,
  rc::Rc,
};

use indexmap::IndexMap;
use smallvec::SmallVec;
use the_doc::{
  Tendril,
  document::Document,
  live_range::LiveRangeId,
  position::{
    Position,
    Range,
  },
};
use tracing::warn;

use crate::{
  config::{
    ConfigError,
    TextTransformConfig,
  },
  filter::Keystroke,
  rule::Priority,
  span::inline_span,
};

#[derive(Debug, Clone)]
pub struct TextTransformation {
  triggers: SmallVec<[char; 4]>,
  /// literal -> replacement, in the order literals are tried
  keys:     IndexMap<Tendril, Tendril>,
  priority: Priority,
}

impl TextTransformation {
  pub fn new(triggers: impl IntoIterator<Item = char>) -> Self {
    Self {
      triggers: triggers.into_iter().collect(),
      keys:     IndexMap::new(),
      priority: Priority::default(),
    }
  }

  /// Replace each literal of `from` with `to`. Re-adding a literal keeps its
  /// place in the table and takes the new replacement.
  pub fn transform<'a>(mut self, to: &str, from: impl IntoIterator<Item = &'a str>) -> Self {
    for key in from {
      if key.is_empty() {
        warn!(to, "ignoring empty text transformation key");
        continue;
      }
      if let Some(previous) = self.keys.insert(key.into(), to.into()) {
        warn!(key, %previous, to, "text transformation key registered twice");
      }
    }
    self
  }

  pub fn with_priority(mut self, priority: Priority) -> Self {
    self.priority = priority;
    self
  }

  pub fn from_config(config: &TextTransformConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    let triggers = config
      .triggers
      .iter()
      .filter_map(|trigger| trigger.chars().next());
    let transformation = config
      .transformations
      .iter()
      .fold(Self::new(triggers), |transformation, entry| {
        transformation.transform(&entry.to, entry.keys())
      });
    Ok(transformation)
  }

  pub fn priority(&self) -> Priority {
    self.priority
  }

  pub fn triggers(&self) -> &[char] {
    &self.triggers
  }

  pub fn is_trigger(&self, ch: char) -> bool {
    self.triggers.contains(&ch)
  }

  pub fn len(&self) -> usize {
    self.keys.len()
  }

  pub fn is_empty(&self) -> bool {
    self.keys.is_empty()
  }

  /// The first literal `text` ends with, and its replacement.
  pub fn find(&self, text: &str) -> Option<(&str, &str)> {
    self
      .keys
      .iter()
      .find(|(key, _)| text.ends_with(key.as_str()))
      .map(|(key, to)| (key.as_str(), to.as_str()))
  }

  /// The substitution a keystroke calls for, if any.
  ///
  /// The typed character has to be a trigger and has to sit right before
  /// the caret. The literal is searched for in the text between `boundary`
  /// (when it lies in the caret block, before the trigger) and the trigger.
  pub(crate) fn substitution(
    &self,
    document: &Document,
    keystroke: &Keystroke,
    boundary: Option<Position>,
  ) -> Option<Substitution> {
    if !self.is_trigger(keystroke.ch) {
      return None;
    }
    let span = inline_span(document)?;
    if keystroke.end() != span.caret_position() {
      return None;
    }

    let end = span.caret - 1;
    let start = boundary
      .filter(|boundary| boundary.block == span.block && boundary.offset <= end)
      .map_or(0, |boundary| boundary.offset);
    let text: String = span.text.chars().skip(start).take(end - start).collect();

    let (key, to) = self.find(&text)?;
    let len = key.chars().count();
    Some(Substitution {
      range: Range::new(span.block, end - len, end),
      to:    to.into(),
    })
  }
}

/// A literal to replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
  pub range: Range,
  pub to:    Tendril,
}

/// End of the last replacement, as a collapsed live marker.
///
/// Shared between the listener, which reads it while matching, and the
/// batches it enqueues, which move it after every substitution.
#[derive(Debug, Clone, Default)]
pub(crate) struct SearchBoundary(Rc<Cell<Option<LiveRangeId>>>);

impl SearchBoundary {
  pub(crate) fn position(&self, document: &Document) -> Option<Position> {
    let id = self.0.get()?;
    document.live_range(id).map(|range| range.start)
  }

  /// Store `marker`, handing back the one it replaces.
  pub(crate) fn replace(&self, marker: LiveRangeId) -> Option<LiveRangeId> {
    self.0.replace(Some(marker))
  }

  pub(crate) fn take(&self) -> Option<LiveRangeId> {
    self.0.take()
  }
}
