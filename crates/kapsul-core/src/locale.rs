//! Display language for labels and user-facing messages.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The two languages the product ships with. Persian is the default.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  #[default]
  Fa,
  En,
}

impl Language {
  pub fn tag(self) -> &'static str {
    match self {
      Self::Fa => "fa",
      Self::En => "en",
    }
  }

  /// Choose between a Persian and an English string.
  pub fn pick<'a>(self, fa: &'a str, en: &'a str) -> &'a str {
    match self {
      Self::Fa => fa,
      Self::En => en,
    }
  }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.tag())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLanguage(pub String);

impl fmt::Display for UnknownLanguage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown language tag: {:?}", self.0)
  }
}

impl std::error::Error for UnknownLanguage {}

impl FromStr for Language {
  type Err = UnknownLanguage;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "fa" | "fa-ir" => Ok(Self::Fa),
      "en" | "en-us" | "en-gb" => Ok(Self::En),
      _ => Err(UnknownLanguage(s.to_owned())),
    }
  }
}
