//! User configuration.
//!
//! Configuration is read from a global `config.toml` and an optional
//! workspace-local `.tabmark/config.toml`; local keys win. Everything is
//! immutable once a [`Session`](crate::Session) has been built from it.
//!
//! ```toml
//! marklist = "asdfghjkl"
//! buflist = "zxc"
//! overflow-mark = "*"
//! wraparound = true
//! icons = true
//!
//! [indicators]
//! left = " < "
//! right = " > "
//! ```

use std::{
  collections::HashSet,
  fs,
  io,
};

use serde::Deserialize;
use tabmark_core::statusline;
use tabmark_loader::merge_toml_values;
use thiserror::Error;

use crate::marks::Tier;

/// Columns every truncation indicator occupies.
pub const INDICATOR_WIDTH: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("mark {0:?} is configured more than once")]
  DuplicateMark(char),
  #[error("mark {0:?} must be a visible character")]
  InvisibleMark(char),
  #[error("buflist must contain at least one mark")]
  EmptyBuflist,
  #[error("{side} indicator must be {INDICATOR_WIDTH} columns wide, got {width}")]
  IndicatorWidth { side: &'static str, width: usize },
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
  #[error("failed to parse config: {0}")]
  BadConfig(#[from] toml::de::Error),
  #[error(transparent)]
  Error(#[from] io::Error),
  #[error("invalid config: {0}")]
  Invalid(#[from] ConfigError),
}

/// An ordered list of candidate marks, written as a plain string in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct MarkList(Vec<char>);

impl MarkList {
  pub fn new(marks: impl IntoIterator<Item = char>) -> Self {
    Self(marks.into_iter().collect())
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn contains(&self, mark: char) -> bool {
    self.0.contains(&mark)
  }

  pub fn get(&self, slot: usize) -> Option<char> {
    self.0.get(slot).copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
    self.0.iter().copied()
  }
}

impl From<String> for MarkList {
  fn from(value: String) -> Self {
    Self::new(value.chars())
  }
}

impl From<&str> for MarkList {
  fn from(value: &str) -> Self {
    Self::new(value.chars())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Indicators {
  pub left:  String,
  pub right: String,
}

impl Default for Indicators {
  fn default() -> Self {
    Self {
      left:  " < ".to_string(),
      right: " > ".to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
  /// Marks handed out to explicitly pinned files, in order.
  pub marklist:      MarkList,
  /// Marks of the recency window; its length is the window capacity.
  pub buflist:       MarkList,
  /// Mark used once `marklist` is exhausted. At most one file holds it.
  pub overflow_mark: char,
  /// Whether cycling past either end wraps around.
  pub wraparound:    bool,
  pub icons:         bool,
  pub indicators:    Indicators,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      marklist:      MarkList::from("asdfghjkl"),
      buflist:       MarkList::from("zxc"),
      overflow_mark: '*',
      wraparound:    true,
      icons:         true,
      indicators:    Indicators::default(),
    }
  }
}

impl Config {
  pub fn load(
    global: Result<String, ConfigLoadError>,
    local: Result<String, ConfigLoadError>,
  ) -> Result<Config, ConfigLoadError> {
    let global: Result<toml::Value, ConfigLoadError> =
      global.and_then(|file| toml::from_str(&file).map_err(ConfigLoadError::BadConfig));
    let local: Result<toml::Value, ConfigLoadError> =
      local.and_then(|file| toml::from_str(&file).map_err(ConfigLoadError::BadConfig));

    let config: Config = match (global, local) {
      (Ok(global), Ok(local)) => merge_toml_values(global, local, 3).try_into()?,
      (_, Err(ConfigLoadError::BadConfig(err))) | (Err(ConfigLoadError::BadConfig(err)), _) => {
        return Err(ConfigLoadError::BadConfig(err));
      },
      (Ok(config), Err(_)) | (Err(_), Ok(config)) => config.try_into()?,
      (Err(err), Err(_)) => return Err(err),
    };

    config.validate()?;
    Ok(config)
  }

  /// Loads the user's global and workspace configuration. Missing files fall
  /// back to the defaults.
  pub fn load_default() -> Result<Config, ConfigLoadError> {
    let global = fs::read_to_string(tabmark_loader::config_file()).map_err(ConfigLoadError::Error);
    let local =
      fs::read_to_string(tabmark_loader::workspace_config_file()).map_err(ConfigLoadError::Error);

    match Config::load(global, local) {
      Err(ConfigLoadError::Error(err)) if err.kind() == io::ErrorKind::NotFound => {
        Ok(Config::default())
      },
      result => result,
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.buflist.is_empty() {
      return Err(ConfigError::EmptyBuflist);
    }

    let mut seen = HashSet::new();
    let all = self
      .marklist
      .iter()
      .chain(self.buflist.iter())
      .chain(std::iter::once(self.overflow_mark));
    for mark in all {
      if mark.is_whitespace() || mark.is_control() {
        return Err(ConfigError::InvisibleMark(mark));
      }
      if !seen.insert(mark) {
        return Err(ConfigError::DuplicateMark(mark));
      }
    }

    for (side, indicator) in [
      ("left", &self.indicators.left),
      ("right", &self.indicators.right),
    ] {
      let width = statusline::width(indicator);
      if width != INDICATOR_WIDTH {
        return Err(ConfigError::IndicatorWidth { side, width });
      }
    }

    Ok(())
  }

  pub fn tier(&self, mark: char) -> Tier {
    if self.marklist.contains(mark) {
      Tier::Pinned
    } else if self.buflist.contains(mark) {
      Tier::Recent
    } else if mark == self.overflow_mark {
      Tier::Overflow
    } else {
      Tier::Other
    }
  }
}
