use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to parse autoformat config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("trigger `{0}` must be exactly one character")]
  InvalidTrigger(String),
  #[error("transformation to `{to}` has an empty `from`")]
  EmptyKey { to: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct AutoformatConfig {
  pub text_transform: TextTransformConfig,
}

impl AutoformatConfig {
  /// Parse and validate a TOML document.
  ///
  /// ```
  /// use the_autoformat::config::AutoformatConfig;
  ///
  /// let config = AutoformatConfig::from_toml(
  ///   r#"
  ///   [text-transform]
  ///   triggers = [" "]
  ///
  ///   [[text-transform.transformations]]
  ///   to   = "…"
  ///   from = "..."
  ///   "#,
  /// )
  /// .unwrap();
  /// assert_eq!(config.text_transform.transformations.len(), 1);
  /// ```
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    self.text_transform.validate()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct TextTransformConfig {
  /// Characters whose insertion checks the text before them.
  pub triggers:        Vec<String>,
  /// Tried in order; the first literal the text ends with wins.
  pub transformations: Vec<TransformationConfig>,
}

impl Default for TextTransformConfig {
  fn default() -> Self {
    Self {
      triggers:        vec![" ".into(), ".".into(), ",".into()],
      transformations: vec![
        TransformationConfig::new("\u{2122}", ["!tm"]),
        TransformationConfig::new("New York City", ["!NYC"]),
        TransformationConfig::new("\u{1f642}", [":)", ":smile:", ":-)"]),
        TransformationConfig::new("\u{2014}", ["---"]),
        TransformationConfig::new("\u{2013}", ["--"]),
      ],
    }
  }
}

impl TextTransformConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    for trigger in &self.triggers {
      if trigger.chars().count() != 1 {
        return Err(ConfigError::InvalidTrigger(trigger.clone()));
      }
    }
    for transformation in &self.transformations {
      if transformation.keys().any(str::is_empty) {
        return Err(ConfigError::EmptyKey {
          to: transformation.to.clone(),
        });
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TransformationConfig {
  pub to:   String,
  pub from: Alternatives,
}

impl TransformationConfig {
  pub fn new<'a>(to: &str, from: impl IntoIterator<Item = &'a str>) -> Self {
    let mut from: Vec<String> = from.into_iter().map(String::from).collect();
    let from = if from.len() == 1 {
      Alternatives::One(from.remove(0))
    } else {
      Alternatives::Many(from)
    };
    Self {
      to: to.into(),
      from,
    }
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    let many = match &self.from {
      Alternatives::One(key) => std::slice::from_ref(key),
      Alternatives::Many(keys) => keys.as_slice(),
    };
    many.iter().map(String::as_str)
  }
}

/// `from = "--"` or `from = [":)", ":-)"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Alternatives {
  One(String),
  Many(Vec<String>),
}
