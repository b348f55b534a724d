//! The engine: rule registration and the change listener.
//!
//! Rules are tried in priority order, registration order breaking ties.
//! Block rules, inline rules and the text transformation share that single
//! order, and the first rule that matches a keystroke is the only one
//! applied. Its edit is enqueued as a separate local batch, which makes it a
//! separate undo step: undoing once restores the typed trigger.
//!
//! ```
//! use the_autoformat::{
//!   autoformat::Autoformat,
//!   rule::InlineAction,
//! };
//! use the_doc::{
//!   markup,
//!   model::Model,
//! };
//!
//! let mut model = Model::new();
//! markup::set_data(&mut model, "<paragraph>a *b[]</paragraph>").unwrap();
//!
//! let mut autoformat = Autoformat::new();
//! autoformat
//!   .inline_rule(r"(\*)([^*]+)(\*)$", InlineAction::Command("bold".into()))
//!   .unwrap();
//! autoformat.attach(&mut model);
//!
//! model.input_text("*").unwrap();
//! assert_eq!(
//!   markup::get_data(&model),
//!   r#"<paragraph>a <$text bold="true">b</$text>[]</paragraph>"#
//! );
//! ```

use std::cmp::Reverse;

use regex::Regex;
use thiserror::Error;
use the_doc::{
  document::Document,
  model::{
    ChangeEvent,
    ListenerId,
    Model,
  },
};
use tracing::{
  debug,
  trace,
};

use crate::{
  applier::Plan,
  config::{
    AutoformatConfig,
    ConfigError,
  },
  filter::{
    self,
    Keystroke,
  },
  matcher::{
    InlineMatcher,
    MatchResult,
    match_block,
  },
  rule::{
    BlockAction,
    BlockRule,
    InlineAction,
    InlineRule,
    Priority,
  },
  span::{
    block_span,
    inline_span,
  },
  transform::{
    SearchBoundary,
    TextTransformation,
  },
};

#[derive(Debug, Error)]
pub enum AutoformatError {
  #[error("invalid autoformat pattern: {0}")]
  Pattern(#[from] regex::Error),
  #[error(transparent)]
  Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, AutoformatError>;

#[derive(Debug, Clone)]
enum Rule {
  Block(BlockRule),
  Inline(InlineRule),
  Transform(TextTransformation),
}

impl Rule {
  fn priority(&self) -> Priority {
    match self {
      Rule::Block(rule) => rule.priority,
      Rule::Inline(rule) => rule.priority,
      Rule::Transform(transformation) => transformation.priority(),
    }
  }

  fn gate(&self) -> Option<&str> {
    match self {
      Rule::Block(rule) => rule.gate(),
      Rule::Inline(rule) => rule.gate(),
      Rule::Transform(_) => None,
    }
  }
}

/// Rules waiting to be attached to a [`Model`].
#[derive(Debug, Clone, Default)]
pub struct Autoformat {
  rules: Vec<Rule>,
}

impl Autoformat {
  pub fn new() -> Self {
    Self::default()
  }

  /// Text transformation built from `config`, and nothing else.
  pub fn from_config(config: &AutoformatConfig) -> Result<Self> {
    let mut autoformat = Self::new();
    autoformat.text_transformation(TextTransformation::from_config(&config.text_transform)?);
    Ok(autoformat)
  }

  /// Run `action` when a paragraph's whole text matches `pattern` from its
  /// start.
  pub fn block_rule(&mut self, pattern: &str, action: impl Into<BlockAction>) -> Result<&mut Self> {
    let pattern = Regex::new(pattern)?;
    Ok(self.block_rule_with(BlockRule::new(pattern, action)))
  }

  pub fn block_rule_with(&mut self, rule: BlockRule) -> &mut Self {
    self.rules.push(Rule::Block(rule));
    self
  }

  /// Run `action` on the content between delimiters matched by `pattern`,
  /// which needs exactly three capture groups.
  pub fn inline_rule(&mut self, pattern: &str, action: impl Into<InlineAction>) -> Result<&mut Self> {
    let pattern = Regex::new(pattern)?;
    Ok(self.inline_rule_with(InlineRule::new(InlineMatcher::Regex(pattern), action)))
  }

  pub fn inline_callback_rule(
    &mut self,
    test: impl Fn(&str) -> MatchResult + 'static,
    action: impl Into<InlineAction>,
  ) -> &mut Self {
    self.inline_rule_with(InlineRule::new(InlineMatcher::callback(test), action))
  }

  pub fn inline_rule_with(&mut self, rule: InlineRule) -> &mut Self {
    self.rules.push(Rule::Inline(rule));
    self
  }

  pub fn text_transformation(&mut self, transformation: TextTransformation) -> &mut Self {
    self.rules.push(Rule::Transform(transformation));
    self
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  /// Start listening to `model`.
  pub fn attach(self, model: &mut Model) -> AutoformatHandle {
    let mut rules = self.rules;
    rules.sort_by_key(|rule| Reverse(rule.priority()));
    debug!(rules = rules.len(), "attach autoformat");

    let boundary = SearchBoundary::default();
    let engine = Engine {
      rules,
      boundary: boundary.clone(),
    };
    let listener = model.on_change(move |event| {
      engine.on_change(event);
      Ok(())
    });
    AutoformatHandle { listener, boundary }
  }
}

/// An attached engine.
///
/// Once a text transformation has run, the engine keeps a marker in the
/// document's live ranges. Dropping the handle keeps the engine attached and
/// the marker tracked for the life of the document; [`AutoformatHandle::detach`]
/// releases both.
#[derive(Debug)]
pub struct AutoformatHandle {
  listener: ListenerId,
  boundary: SearchBoundary,
}

impl AutoformatHandle {
  pub fn listener(&self) -> ListenerId {
    self.listener
  }

  /// Stop listening and release the tracked search boundary.
  pub fn detach(self, model: &mut Model) -> bool {
    if let Some(marker) = self.boundary.take() {
      model.detach_live_range(marker);
    }
    model.off(self.listener)
  }
}

struct Engine {
  rules:    Vec<Rule>,
  boundary: SearchBoundary,
}

impl Engine {
  fn on_change(&self, event: &mut ChangeEvent<'_>) {
    let Some(keystroke) = filter::keystroke(event) else {
      return;
    };
    let Some(plan) = self.plan(event, &keystroke) else {
      return;
    };
    let version = event.document().version();
    trace!(?keystroke, version, "enqueue autoformat");
    event.enqueue_change(move |writer| plan.run(writer, version));
  }

  fn plan(&self, event: &ChangeEvent<'_>, keystroke: &Keystroke) -> Option<Plan> {
    let document = event.document();
    let block = block_span(document, keystroke);
    let inline = inline_span(document);

    self.rules.iter().find_map(|rule| {
      if let Some(command) = rule.gate()
        && event.is_command_enabled(command) == Some(false)
      {
        trace!(command, "skip rule, command disabled");
        return None;
      }
      match rule {
        Rule::Block(rule) => {
          let span = block.as_ref()?;
          let matched = match_block(&rule.pattern, &span.text)?;
          Some(Plan::Block {
            block: span.block,
            matched,
            action: rule.action.clone(),
          })
        },
        Rule::Inline(rule) => {
          let span = inline.as_ref()?;
          let result = rule.matcher.test(&span.text);
          (!result.is_empty()).then(|| Plan::Inline {
            block: span.block,
            result,
            action: rule.action.clone(),
          })
        },
        Rule::Transform(transformation) => self.substitute(document, keystroke, transformation),
      }
    })
  }

  fn substitute(
    &self,
    document: &Document,
    keystroke: &Keystroke,
    transformation: &TextTransformation,
  ) -> Option<Plan> {
    let boundary = self.boundary.position(document);
    let substitution = transformation.substitution(document, keystroke, boundary)?;
    Some(Plan::Substitute {
      substitution,
      boundary: self.boundary.clone(),
    })
  }
}
