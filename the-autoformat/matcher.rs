//! Testing a resolved span against a rule.
//!
//! All offsets produced here are char offsets into the tested span, never
//! byte offsets: regex matches are converted before they leave this module.

use std::{
  fmt,
  ops::Range,
  rc::Rc,
};

use regex::{
  Captures,
  Regex,
};
use smallvec::SmallVec;
use the_doc::Tendril;
use tracing::warn;

/// Ranges to format and ranges to delete, as char offsets into the tested
/// text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
  pub format: Vec<Range<usize>>,
  pub remove: Vec<Range<usize>>,
}

impl MatchResult {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn format(mut self, range: Range<usize>) -> Self {
    self.format.push(range);
    self
  }

  pub fn remove(mut self, range: Range<usize>) -> Self {
    self.remove.push(range);
    self
  }

  /// Nothing to format and nothing to remove: not a match.
  pub fn is_empty(&self) -> bool {
    self.format.is_empty() && self.remove.is_empty()
  }

  /// Drop empty ranges and ranges that do not fit in a text of `len` chars.
  pub(crate) fn sanitize(mut self, len: usize) -> Self {
    let keep = |range: &Range<usize>| {
      if range.start >= range.end {
        return false;
      }
      if range.end > len {
        warn!(?range, len, "matcher returned a range outside of the tested text");
        return false;
      }
      true
    };
    self.format.retain(|range| keep(range));
    self.remove.retain(|range| keep(range));
    self
  }
}

/// A successful block pattern match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMatch {
  /// Chars matched from the start of the block.
  pub range:  Range<usize>,
  /// Capture groups, group 0 being the whole match.
  pub groups: SmallVec<[Option<Tendril>; 4]>,
}

impl BlockMatch {
  pub fn group(&self, index: usize) -> Option<&str> {
    self.groups.get(index)?.as_deref()
  }
}

/// Match `pattern` against a whole block. Only a match starting at the
/// beginning of the block counts.
pub fn match_block(pattern: &Regex, text: &str) -> Option<BlockMatch> {
  let captures = pattern.captures(text)?;
  let whole = captures.get(0)?;
  if whole.start() != 0 {
    return None;
  }
  Some(BlockMatch {
    range:  0..char_offset(text, whole.end()),
    groups: captures
      .iter()
      .map(|group| group.map(|group| Tendril::from(group.as_str())))
      .collect(),
  })
}

pub type TestFn = dyn Fn(&str) -> MatchResult;

/// How an inline rule finds its ranges.
#[derive(Clone)]
pub enum InlineMatcher {
  /// Every match must capture three groups: opening delimiter, content,
  /// closing delimiter. Delimiters are removed and the content is formatted.
  Regex(Regex),
  Callback(Rc<TestFn>),
}

impl fmt::Debug for InlineMatcher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InlineMatcher::Regex(pattern) => f.debug_tuple("Regex").field(&pattern.as_str()).finish(),
      InlineMatcher::Callback(_) => f.write_str("Callback"),
    }
  }
}

impl InlineMatcher {
  pub fn callback(test: impl Fn(&str) -> MatchResult + 'static) -> Self {
    InlineMatcher::Callback(Rc::new(test))
  }

  /// Test `text` (the block text through the caret). The result only holds
  /// non-empty ranges that lie inside `text`.
  pub fn test(&self, text: &str) -> MatchResult {
    let result = match self {
      InlineMatcher::Regex(pattern) => delimited(pattern, text),
      InlineMatcher::Callback(test) => test(text),
    };
    result.sanitize(text.chars().count())
  }
}

fn delimited(pattern: &Regex, text: &str) -> MatchResult {
  let mut result = MatchResult::new();
  for captures in pattern.captures_iter(text) {
    if captures.len() < 4 {
      warn!(
        pattern = pattern.as_str(),
        groups = captures.len() - 1,
        "inline pattern needs three capture groups"
      );
      break;
    }
    let Some([open, content, close]) = groups(&captures, text) else {
      continue;
    };
    result.remove.push(open);
    result.format.push(content);
    result.remove.push(close);
  }
  result
}

fn groups(captures: &Captures<'_>, text: &str) -> Option<[Range<usize>; 3]> {
  let span = |index: usize| {
    captures
      .get(index)
      .map(|group| char_offset(text, group.start())..char_offset(text, group.end()))
  };
  Some([span(1)?, span(2)?, span(3)?])
}

/// Char offset of byte offset `byte` in `text`.
pub(crate) fn char_offset(text: &str, byte: usize) -> usize {
  text[..byte].chars().count()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn delimited_pattern() {
    let matcher = InlineMatcher::Regex(Regex::new(r"(\*)(.+?)(\*)").unwrap());
    let result = matcher.test("x*foobar*");
    assert_eq!(result.format, [2..8]);
    assert_eq!(result.remove, [1..2, 8..9]);
  }

  #[test]
  fn offsets_are_chars() {
    let matcher = InlineMatcher::Regex(Regex::new(r"(_)([^_]+)(_)").unwrap());
    let result = matcher.test("żółw _ćma_");
    assert_eq!(result.format, [6..9]);
    assert_eq!(result.remove, [5..6, 9..10]);
  }

  #[test]
  fn too_few_groups_is_no_match() {
    let matcher = InlineMatcher::Regex(Regex::new(r"(\*)(.+?)\*").unwrap());
    assert!(matcher.test("*foobar*").is_empty());
  }

  #[test]
  fn callback_ranges_are_sanitized() {
    let matcher = InlineMatcher::callback(|_| {
      MatchResult::new()
        .format(2..2)
        .format(0..1)
        .remove(0..40)
    });
    let result = matcher.test("abc");
    assert_eq!(result.format, [0..1]);
    assert!(result.remove.is_empty());

    let matcher = InlineMatcher::callback(|_| MatchResult::new().format(1..1).remove(3..2));
    assert!(matcher.test("abc").is_empty());
  }

  #[test]
  fn block_match_is_anchored_at_block_start() {
    let pattern = Regex::new(r"(#{1,3}) $").unwrap();
    let matched = match_block(&pattern, "## ").unwrap();
    assert_eq!(matched.range, 0..3);
    assert_eq!(matched.group(1), Some("##"));
    assert_eq!(match_block(&pattern, "x## "), None);

    let list = Regex::new(r"^- $").unwrap();
    assert_eq!(match_block(&list, "- ").map(|m| m.range), Some(0..2));
    assert_eq!(match_block(&list, "a- "), None);
  }
}
