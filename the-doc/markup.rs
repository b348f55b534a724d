//! A compact text notation for documents, used by tests and demos.
//!
//! ```text
//! <paragraph>x<$text bold="true">foo</$text>[]x</paragraph><heading1>Title</heading1>
//! ```
//!
//! - every top-level element is a block; its tag name is the block name and
//!   its attributes are the block attributes
//! - `$text` elements wrap text with attributes, plain text has none
//! - `[]` is a caret, `[` and `]` are the anchor and focus of a selection
//!
//! Without markers the caret goes to the start of the first block. The
//! selection picks up the attributes of the text before the caret, the same
//! as moving the caret there would.

use std::fmt::Write as _;

use thiserror::Error;

use crate::{
  TEXT_NODE,
  Tendril,
  document::{
    Document,
    DocumentError,
  },
  model::Model,
  node::{
    Attributes,
    TextRun,
  },
  position::Position,
  selection::Selection,
};

#[derive(Debug, Error)]
pub enum MarkupError {
  #[error("unexpected end of markup")]
  UnexpectedEnd,
  #[error("expected {expected} at byte {offset}, found `{found}`")]
  Unexpected {
    offset:   usize,
    expected: &'static str,
    found:    char,
  },
  #[error("closing tag `{found}` does not match `{expected}`")]
  MismatchedTag { expected: Tendril, found: Tendril },
  #[error("text or marker outside of a block at byte {0}")]
  OutsideBlock(usize),
  #[error("`$text` elements cannot nest (byte {0})")]
  NestedText(usize),
  #[error("selection marker `{marker}` appears twice")]
  DuplicateMarker { marker: char },
  #[error("selection has only one of its markers")]
  UnpairedMarker,
  #[error("markup holds no blocks")]
  NoBlocks,
  #[error(transparent)]
  Document(#[from] DocumentError),
}

pub type Result<T> = std::result::Result<T, MarkupError>;

struct Scanner<'a> {
  src: &'a str,
  pos: usize,
}

impl<'a> Scanner<'a> {
  fn peek(&self) -> Option<char> {
    self.src[self.pos..].chars().next()
  }

  fn bump(&mut self) -> Option<char> {
    let ch = self.peek()?;
    self.pos += ch.len_utf8();
    Some(ch)
  }

  fn expect(&mut self, want: char, expected: &'static str) -> Result<()> {
    match self.bump() {
      Some(ch) if ch == want => Ok(()),
      Some(found) => Err(MarkupError::Unexpected {
        offset: self.pos - found.len_utf8(),
        expected,
        found,
      }),
      None => Err(MarkupError::UnexpectedEnd),
    }
  }

  fn skip_whitespace(&mut self) {
    while self.peek().is_some_and(char::is_whitespace) {
      self.bump();
    }
  }

  /// Read until (not including) the first char matching `stop`.
  fn take_until(&mut self, stop: impl Fn(char) -> bool) -> Result<&'a str> {
    let start = self.pos;
    loop {
      match self.peek() {
        Some(ch) if stop(ch) => return Ok(&self.src[start..self.pos]),
        Some(_) => {
          self.bump();
        },
        None => return Err(MarkupError::UnexpectedEnd),
      }
    }
  }
}

enum Tag {
  Open {
    name:         Tendril,
    attributes:   Attributes,
    self_closing: bool,
  },
  Close(Tendril),
}

fn parse_tag(scanner: &mut Scanner<'_>) -> Result<Tag> {
  scanner.expect('<', "`<`")?;
  if scanner.peek() == Some('/') {
    scanner.bump();
    let name = scanner.take_until(|ch| ch == '>')?;
    scanner.expect('>', "`>`")?;
    return Ok(Tag::Close(name.trim().into()));
  }

  let name: Tendril = scanner
    .take_until(|ch| ch.is_whitespace() || ch == '>' || ch == '/')?
    .into();
  let mut attributes = Attributes::new();
  loop {
    scanner.skip_whitespace();
    match scanner.peek() {
      Some('>') => {
        scanner.bump();
        return Ok(Tag::Open {
          name,
          attributes,
          self_closing: false,
        });
      },
      Some('/') => {
        scanner.bump();
        scanner.expect('>', "`>`")?;
        return Ok(Tag::Open {
          name,
          attributes,
          self_closing: true,
        });
      },
      Some(_) => {
        let key = scanner.take_until(|ch| ch == '=')?.trim();
        scanner.expect('=', "`=`")?;
        scanner.expect('"', "`\"`")?;
        let value = scanner.take_until(|ch| ch == '"')?;
        scanner.expect('"', "`\"`")?;
        attributes.insert(key.into(), value.into());
      },
      None => return Err(MarkupError::UnexpectedEnd),
    }
  }
}

struct OpenBlock {
  name:       Tendril,
  attributes: Attributes,
  runs:       Vec<TextRun>,
  len:        usize,
}

/// Parse `markup` into a fresh document.
pub fn parse(markup: &str) -> Result<Document> {
  let mut scanner = Scanner {
    src: markup,
    pos: 0,
  };
  let mut document = Document::empty();
  let mut block: Option<OpenBlock> = None;
  let mut text_attributes: Option<Attributes> = None;
  // Markers are recorded as (block index, offset).
  let mut anchor: Option<(usize, usize)> = None;
  let mut focus: Option<(usize, usize)> = None;

  while let Some(ch) = scanner.peek() {
    let offset = scanner.pos;
    match ch {
      '<' => {
        match parse_tag(&mut scanner)? {
          Tag::Open {
            name, attributes, ..
          } if name == TEXT_NODE => {
            if block.is_none() {
              return Err(MarkupError::OutsideBlock(offset));
            }
            if text_attributes.is_some() {
              return Err(MarkupError::NestedText(offset));
            }
            text_attributes = Some(attributes);
          },
          Tag::Close(name) if name == TEXT_NODE => {
            if text_attributes.take().is_none() {
              return Err(MarkupError::MismatchedTag {
                expected: block.as_ref().map(|open| open.name.clone()).unwrap_or_default(),
                found:    name,
              });
            }
          },
          Tag::Open {
            name,
            attributes,
            self_closing,
          } => {
            if let Some(open) = &block {
              return Err(MarkupError::MismatchedTag {
                expected: open.name.clone(),
                found:    name,
              });
            }
            let open = OpenBlock {
              name,
              attributes,
              runs: Vec::new(),
              len: 0,
            };
            if self_closing {
              push_block(&mut document, open);
            } else {
              block = Some(open);
            }
          },
          Tag::Close(name) => {
            match block.take() {
              Some(open) if open.name == name && text_attributes.is_none() => {
                push_block(&mut document, open);
              },
              open => {
                return Err(MarkupError::MismatchedTag {
                  expected: open.map(|open| open.name).unwrap_or_default(),
                  found:    name,
                });
              },
            }
          },
        }
      },
      '[' | ']' => {
        scanner.bump();
        let Some(open) = &block else {
          return Err(MarkupError::OutsideBlock(offset));
        };
        let slot = if ch == '[' { &mut anchor } else { &mut focus };
        if slot.is_some() {
          return Err(MarkupError::DuplicateMarker { marker: ch });
        }
        *slot = Some((document.blocks().len(), open.len));
      },
      _ => {
        let Some(open) = &mut block else {
          if ch.is_whitespace() {
            scanner.bump();
            continue;
          }
          return Err(MarkupError::OutsideBlock(offset));
        };
        let text = scanner.take_until(|ch| ch == '<' || ch == '[' || ch == ']')?;
        open.len += text.chars().count();
        open.runs.push(TextRun::with_attributes(
          text,
          text_attributes.clone().unwrap_or_default(),
        ));
      },
    }
  }

  if let Some(open) = block {
    return Err(MarkupError::MismatchedTag {
      expected: open.name,
      found:    Tendril::new(),
    });
  }
  if document.blocks().is_empty() {
    return Err(MarkupError::NoBlocks);
  }

  let resolve = |(index, offset): (usize, usize)| {
    Position::new(document.blocks()[index].id(), offset)
  };
  let selection = match (anchor, focus) {
    (Some(anchor), Some(focus)) => Selection::new(resolve(anchor), resolve(focus)),
    (None, None) => Selection::collapsed(resolve((0, 0))),
    _ => return Err(MarkupError::UnpairedMarker),
  };
  let selection = if selection.is_collapsed() {
    let attributes = document.attributes_before(selection.focus());
    selection.with_attributes(attributes)
  } else {
    selection
  };
  document.set_selection(selection)?;
  Ok(document)
}

fn push_block(document: &mut Document, open: OpenBlock) {
  let block = document
    .create_block(&open.name)
    .with_attributes(open.attributes)
    .with_runs(open.runs);
  document.push_block(block);
}

/// Replace the model's document with the one described by `markup`.
pub fn set_data(model: &mut Model, markup: &str) -> Result<()> {
  model.set_document(parse(markup)?);
  Ok(())
}

/// The model's document, selection included.
pub fn get_data(model: &Model) -> String {
  stringify(model.document(), true)
}

pub fn stringify(document: &Document, with_selection: bool) -> String {
  let selection = document.selection();
  let mut out = String::new();
  for block in document.blocks() {
    let markers = |offset: usize| -> &'static str {
      if !with_selection {
        return "";
      }
      let at_anchor = selection.anchor() == Position::new(block.id(), offset);
      let at_focus = selection.focus() == Position::new(block.id(), offset);
      match (at_anchor, at_focus) {
        (true, true) => "[]",
        (true, false) => "[",
        (false, true) => "]",
        (false, false) => "",
      }
    };

    out.push('<');
    out.push_str(block.name());
    write_attributes(&mut out, block.attributes());
    out.push('>');

    let mut offset = 0;
    for run in block.runs() {
      let open = !run.attributes.is_empty();
      if open {
        out.push('<');
        out.push_str(TEXT_NODE);
        write_attributes(&mut out, &run.attributes);
        out.push('>');
      }
      for ch in run.text.chars() {
        out.push_str(markers(offset));
        out.push(ch);
        offset += 1;
      }
      if open {
        let _ = write!(out, "</{TEXT_NODE}>");
      }
    }
    out.push_str(markers(offset));

    let _ = write!(out, "</{}>", block.name());
  }
  out
}

fn write_attributes(out: &mut String, attributes: &Attributes) {
  for (key, value) in attributes {
    let _ = write!(out, " {key}=\"{value}\"");
  }
}
