//! The text a rule is tested against.

use the_doc::{
  document::Document,
  node::{
    BlockId,
    PARAGRAPH,
  },
  position::Position,
};

use crate::filter::Keystroke;

/// The whole content of a block that consists of a single text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
  pub block: BlockId,
  pub text:  String,
}

/// Block text from its start through the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
  pub block: BlockId,
  pub text:  String,
  /// Caret offset in chars; also the char length of `text`.
  pub caret: usize,
}

impl InlineSpan {
  pub fn caret_position(&self) -> Position {
    Position::new(self.block, self.caret)
  }
}

/// Block mode: the keystroke's block must be a paragraph holding exactly one
/// text run, so that the typed text is all it contains.
pub fn block_span(document: &Document, keystroke: &Keystroke) -> Option<BlockSpan> {
  let block = document.block(keystroke.at.block)?;
  if !block.is(PARAGRAPH) || block.child_count() != 1 {
    return None;
  }
  Some(BlockSpan {
    block: block.id(),
    text:  block.runs()[0].text.to_string(),
  })
}

/// Inline mode: the caret block's text up to the caret. The selection has to
/// be collapsed.
pub fn inline_span(document: &Document) -> Option<InlineSpan> {
  let caret = document.selection().caret()?;
  let block = document.block(caret.block)?;
  let text: String = block.text().chars().take(caret.offset).collect();
  Some(InlineSpan {
    block: block.id(),
    caret: text.chars().count(),
    text,
  })
}
