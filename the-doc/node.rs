//! Blocks and the attributed text runs they contain.
//!
//! A [`Block`] is a structural unit of the document (a paragraph, a heading,
//! a list item). Its inline content is an ordered list of [`TextRun`]s, each
//! carrying a set of [`Attributes`].
//!
//! Runs are kept normalized after every mutation:
//!
//! - no run is empty
//! - two adjacent runs never share the same attributes
//!
//! so the run count of a block is a faithful "child count": a block with one
//! run holds uniformly formatted text, end to end.
//!
//! All offsets are in `char`s, never bytes.

use std::{
  collections::BTreeMap,
  fmt,
  num::NonZeroUsize,
};

use smallvec::SmallVec;

use crate::Tendril;

/// Element name of a plain paragraph.
pub const PARAGRAPH: &str = "paragraph";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(NonZeroUsize);

impl BlockId {
  pub const fn new(id: NonZeroUsize) -> Self {
    Self(id)
  }

  pub const fn get(self) -> NonZeroUsize {
    self.0
  }
}

impl From<NonZeroUsize> for BlockId {
  fn from(value: NonZeroUsize) -> Self {
    Self::new(value)
  }
}

impl fmt::Display for BlockId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Attribute key to value. Flags use the value `"true"`.
pub type Attributes = BTreeMap<Tendril, Tendril>;

/// Content fragments moved in and out of blocks.
pub type Runs = SmallVec<[TextRun; 1]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
  pub text:       Tendril,
  pub attributes: Attributes,
}

impl TextRun {
  pub fn new(text: impl Into<Tendril>) -> Self {
    Self {
      text:       text.into(),
      attributes: Attributes::new(),
    }
  }

  pub fn with_attributes(text: impl Into<Tendril>, attributes: Attributes) -> Self {
    Self {
      text: text.into(),
      attributes,
    }
  }

  pub fn len(&self) -> usize {
    self.text.chars().count()
  }

  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  /// Split the run at the char offset `at`, keeping the head in `self`.
  fn split_off(&mut self, at: usize) -> TextRun {
    let byte = char_to_byte(&self.text, at);
    TextRun {
      text:       self.text.split_off(byte),
      attributes: self.attributes.clone(),
    }
  }
}

/// Total char length of a list of runs.
pub fn runs_len(runs: &[TextRun]) -> usize {
  runs.iter().map(TextRun::len).sum()
}

/// Concatenated text of a list of runs.
pub fn runs_text(runs: &[TextRun]) -> String {
  runs.iter().map(|run| run.text.as_str()).collect()
}

fn char_to_byte(text: &str, at: usize) -> usize {
  text
    .char_indices()
    .nth(at)
    .map(|(byte, _)| byte)
    .unwrap_or(text.len())
}

/// Previous value of an attribute over `start..end`, captured so an
/// attribute change can be reverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpan {
  pub start: usize,
  pub end:   usize,
  pub value: Option<Tendril>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
  id:         BlockId,
  name:       Tendril,
  attributes: Attributes,
  runs:       Vec<TextRun>,
}

impl Block {
  pub fn new(id: BlockId, name: impl Into<Tendril>) -> Self {
    Self {
      id,
      name: name.into(),
      attributes: Attributes::new(),
      runs: Vec::new(),
    }
  }

  pub fn with_attributes(mut self, attributes: Attributes) -> Self {
    self.attributes = attributes;
    self
  }

  pub fn with_runs(mut self, runs: impl IntoIterator<Item = TextRun>) -> Self {
    self.runs.extend(runs);
    self.normalize();
    self
  }

  pub fn id(&self) -> BlockId {
    self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn is(&self, name: &str) -> bool {
    self.name == name
  }

  pub fn attributes(&self) -> &Attributes {
    &self.attributes
  }

  pub fn attribute(&self, key: &str) -> Option<&str> {
    self.attributes.get(key).map(Tendril::as_str)
  }

  pub fn runs(&self) -> &[TextRun] {
    &self.runs
  }

  pub fn child_count(&self) -> usize {
    self.runs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.runs.is_empty()
  }

  pub fn len(&self) -> usize {
    runs_len(&self.runs)
  }

  pub fn text(&self) -> String {
    runs_text(&self.runs)
  }

  /// Attributes of the character that starts at `offset`.
  pub fn attributes_at(&self, offset: usize) -> Option<&Attributes> {
    let mut pos = 0;
    for run in &self.runs {
      let len = run.len();
      if offset < pos + len {
        return Some(&run.attributes);
      }
      pos += len;
    }
    None
  }

  /// Copy of the content between `start` and `end`.
  pub fn slice(&self, start: usize, end: usize) -> Runs {
    let mut out = Runs::new();
    let mut pos = 0;
    for run in &self.runs {
      let len = run.len();
      let (from, to) = (start.max(pos), end.min(pos + len));
      if from < to {
        let text: Tendril = run.text.chars().skip(from - pos).take(to - from).collect();
        out.push(TextRun::with_attributes(text, run.attributes.clone()));
      }
      pos += len;
    }
    out
  }

  pub(crate) fn rename(&mut self, name: Tendril) -> Tendril {
    std::mem::replace(&mut self.name, name)
  }

  pub(crate) fn set_block_attribute(
    &mut self,
    key: &str,
    value: Option<Tendril>,
  ) -> Option<Tendril> {
    match value {
      Some(value) => self.attributes.insert(key.into(), value),
      None => self.attributes.remove(key),
    }
  }

  pub(crate) fn insert(&mut self, offset: usize, content: &[TextRun]) {
    let idx = self.split_at(offset);
    self
      .runs
      .splice(idx..idx, content.iter().filter(|run| !run.is_empty()).cloned());
    self.normalize();
  }

  pub(crate) fn remove(&mut self, start: usize, end: usize) -> Runs {
    let from = self.split_at(start);
    let to = self.split_at(end);
    let removed = self.runs.drain(from..to).collect();
    self.normalize();
    removed
  }

  /// Set (or clear, with `None`) `key` over `start..end`. Returns the values
  /// that were replaced, one span per affected run.
  pub(crate) fn set_attribute(
    &mut self,
    start: usize,
    end: usize,
    key: &str,
    value: Option<&Tendril>,
  ) -> Vec<AttributeSpan> {
    let from = self.split_at(start);
    let to = self.split_at(end);
    let mut previous = Vec::with_capacity(to - from);
    let mut pos = start;
    for run in &mut self.runs[from..to] {
      let len = run.len();
      previous.push(AttributeSpan {
        start: pos,
        end:   pos + len,
        value: run.attributes.get(key).cloned(),
      });
      match value {
        Some(value) => {
          run.attributes.insert(key.into(), value.clone());
        },
        None => {
          run.attributes.remove(key);
        },
      }
      pos += len;
    }
    self.normalize();
    previous
  }

  /// Split the run containing `offset` so that a run boundary exists there.
  /// Returns the index of the first run starting at or after `offset`.
  fn split_at(&mut self, offset: usize) -> usize {
    let mut pos = 0;
    for idx in 0..self.runs.len() {
      if offset == pos {
        return idx;
      }
      let len = self.runs[idx].len();
      if offset < pos + len {
        let tail = self.runs[idx].split_off(offset - pos);
        self.runs.insert(idx + 1, tail);
        return idx + 1;
      }
      pos += len;
    }
    self.runs.len()
  }

  fn normalize(&mut self) {
    self.runs.retain(|run| !run.is_empty());
    let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
    for run in self.runs.drain(..) {
      match merged.last_mut() {
        Some(last) if last.attributes == run.attributes => last.text.push_str(&run.text),
        _ => merged.push(run),
      }
    }
    self.runs = merged;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn id(n: usize) -> BlockId {
    BlockId::new(NonZeroUsize::new(n).unwrap())
  }

  fn bold() -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("bold".into(), "true".into());
    attrs
  }

  #[test]
  fn runs_are_normalized() {
    let block = Block::new(id(1), PARAGRAPH).with_runs([
      TextRun::new("foo"),
      TextRun::new(""),
      TextRun::new("bar"),
    ]);
    assert_eq!(block.child_count(), 1);
    assert_eq!(block.text(), "foobar");
  }

  #[test]
  fn insert_splits_run() {
    let mut block = Block::new(id(1), PARAGRAPH).with_runs([TextRun::new("ac")]);
    block.insert(1, &[TextRun::with_attributes("b", bold())]);
    assert_eq!(block.text(), "abc");
    assert_eq!(block.child_count(), 3);
    assert_eq!(block.attributes_at(1), Some(&bold()));
    assert_eq!(block.attributes_at(2), Some(&Attributes::new()));
  }

  #[test]
  fn remove_returns_removed_runs() {
    let mut block = Block::new(id(1), PARAGRAPH).with_runs([
      TextRun::new("ab"),
      TextRun::with_attributes("cd", bold()),
      TextRun::new("ef"),
    ]);
    let removed = block.remove(1, 5);
    assert_eq!(runs_text(&removed), "bcde");
    assert_eq!(removed.len(), 3);
    assert_eq!(block.text(), "af");
    assert_eq!(block.child_count(), 1);
  }

  #[test]
  fn set_attribute_reports_previous_values() {
    let mut block = Block::new(id(1), PARAGRAPH).with_runs([
      TextRun::new("ab"),
      TextRun::with_attributes("cd", bold()),
    ]);
    let value = Tendril::from("true");
    let previous = block.set_attribute(1, 3, "bold", Some(&value));
    assert_eq!(previous, vec![
      AttributeSpan {
        start: 1,
        end:   2,
        value: None,
      },
      AttributeSpan {
        start: 2,
        end:   3,
        value: Some("true".into()),
      },
    ]);
    assert_eq!(block.child_count(), 2);
    assert_eq!(block.runs()[1].text, "bcd");
  }

  #[test]
  fn slice_handles_multibyte_text() {
    let block = Block::new(id(1), PARAGRAPH).with_runs([TextRun::new("a—b🙂c")]);
    assert_eq!(runs_text(&block.slice(1, 4)), "—b🙂");
    assert_eq!(block.len(), 5);
  }
}
