//! Locations of configuration, session and log files.
//!
//! Every directory can be overridden through the environment
//! (`TABMARK_CONFIG_DIR`, `TABMARK_DATA_DIR`, `TABMARK_CACHE_DIR`), which is
//! also what the test suites use to stay out of the user's home.

use std::{
  borrow::Cow,
  path::{
    Path,
    PathBuf,
  },
  sync::OnceLock,
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};
use eyre::{
  Result,
  WrapErr,
};
use tabmark_stdx::{
  env::{
    current_working_dir,
    dir_from_env,
  },
  path,
};

const APP_DIR: &str = "tabmark";

static CONFIG_FILE: OnceLock<PathBuf> = OnceLock::new();

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

pub fn initialize_config_file(specified_file: Option<PathBuf>) {
  let config_file = specified_file.unwrap_or_else(default_config_file);
  ensure_parent_dir(&config_file);
  CONFIG_FILE.set(config_file).ok();
}

pub fn initialize_log_file(specified_file: Option<PathBuf>) {
  let log_file = specified_file.unwrap_or_else(default_log_file);
  ensure_parent_dir(&log_file);
  LOG_FILE.set(log_file).ok();
}

#[derive(Debug, Clone, Copy)]
enum BaseDir {
  Config,
  Data,
  Cache,
}

fn base_dir(env_var: &str, kind: BaseDir) -> Result<PathBuf> {
  if let Some(dir) = dir_from_env(env_var) {
    return Ok(path::expand_tilde(Cow::Owned(dir)).into_owned());
  }
  let strategy = choose_base_strategy().wrap_err("unable to find the home directory")?;
  let mut path = match kind {
    BaseDir::Config => strategy.config_dir(),
    BaseDir::Data => strategy.data_dir(),
    BaseDir::Cache => strategy.cache_dir(),
  };
  path.push(APP_DIR);
  Ok(path)
}

pub fn config_dir() -> Result<PathBuf> {
  base_dir("TABMARK_CONFIG_DIR", BaseDir::Config)
}

pub fn data_dir() -> Result<PathBuf> {
  base_dir("TABMARK_DATA_DIR", BaseDir::Data)
}

pub fn cache_dir() -> Result<PathBuf> {
  base_dir("TABMARK_CACHE_DIR", BaseDir::Cache)
}

pub fn config_file() -> PathBuf {
  CONFIG_FILE
    .get_or_init(|| {
      let path = default_config_file();
      ensure_parent_dir(&path);
      path
    })
    .clone()
}

pub fn log_file() -> PathBuf {
  LOG_FILE
    .get_or_init(|| {
      let path = default_log_file();
      ensure_parent_dir(&path);
      path
    })
    .clone()
}

pub fn workspace_config_file() -> PathBuf {
  find_workspace().0.join(".tabmark").join("config.toml")
}

pub fn sessions_dir() -> Result<PathBuf> {
  Ok(data_dir()?.join("sessions"))
}

/// Snapshot file for the session called `name`.
///
/// Anything that is not alphanumeric, `-` or `_` is replaced so that a
/// session name can never escape the sessions directory.
pub fn session_file(name: &str) -> Result<PathBuf> {
  let stem: String = name
    .chars()
    .map(|c| {
      if c.is_alphanumeric() || c == '-' || c == '_' {
        c
      } else {
        '_'
      }
    })
    .collect();
  let stem = if stem.is_empty() {
    "default".to_string()
  } else {
    stem
  };
  Ok(sessions_dir()?.join(format!("{stem}.json")))
}

pub fn default_log_file() -> PathBuf {
  cache_dir()
    .unwrap_or_else(|_| std::env::temp_dir().join(APP_DIR))
    .join("tabmark.log")
}

/// Merge two TOML documents, merging values from `right` onto `left`
///
/// `merge_depth` sets the nesting depth up to which values are merged instead
/// of overridden.
///
/// When a table exists in both `left` and `right`, the merged table consists of
/// all keys in `left`'s table unioned with all keys in `right` with the values
/// of `right` being merged recursively onto values of `left`.
///
/// Arrays are replaced wholesale: a user's `marklist` never interleaves with
/// the global one.
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  match (left, right) {
    (Value::Table(mut left_map), Value::Table(right_map)) => {
      if merge_depth > 0 {
        for (rname, rvalue) in right_map {
          match left_map.remove(&rname) {
            Some(lvalue) => {
              let merged_value = merge_toml_values(lvalue, rvalue, merge_depth - 1);
              left_map.insert(rname, merged_value);
            },
            None => {
              left_map.insert(rname, rvalue);
            },
          }
        }
        Value::Table(left_map)
      } else {
        Value::Table(right_map)
      }
    },
    (_, value) => value,
  }
}

/// Finds the current workspace folder.
///
/// This function starts searching the FS upward from the CWD
/// and returns the first directory that contains either `.git`, `.jj`
/// or `.tabmark`. If no workspace was found returns (CWD, true).
/// Otherwise (workspace, false) is returned
pub fn find_workspace() -> (PathBuf, bool) {
  match current_working_dir() {
    Ok(current_dir) => find_workspace_in(current_dir),
    Err(_) => (PathBuf::new(), true),
  }
}

pub fn find_workspace_in(dir: impl AsRef<Path>) -> (PathBuf, bool) {
  let dir = dir.as_ref();
  for ancestor in dir.ancestors() {
    if ancestor.join(".git").exists()
      || ancestor.join(".jj").exists()
      || ancestor.join(".tabmark").exists()
    {
      return (ancestor.to_owned(), false);
    }
  }

  (dir.to_owned(), true)
}

fn default_config_file() -> PathBuf {
  match config_dir() {
    Ok(dir) => dir.join("config.toml"),
    Err(err) => {
      tracing::warn!("no config directory: {err}");
      PathBuf::from("config.toml")
    },
  }
}

pub fn ensure_parent_dir(path: &Path) {
  if let Some(parent) = path.parent()
    && !parent.exists()
  {
    std::fs::create_dir_all(parent).ok();
  }
}

#[cfg(test)]
mod merge_toml_tests {
  use toml::Value;

  use super::*;

  #[test]
  fn local_keys_override_global_keys() {
    let global: Value = toml::from_str(
      r#"
      marklist = "asdf"
      wraparound = false
      [indicators]
      left = " < "
      right = " > "
      "#,
    )
    .unwrap();
    let local: Value = toml::from_str(
      r#"
      marklist = "qwer"
      [indicators]
      right = " » "
      "#,
    )
    .unwrap();

    let merged = merge_toml_values(global, local, 3);
    assert_eq!(merged.get("marklist").unwrap().as_str(), Some("qwer"));
    assert_eq!(merged.get("wraparound").unwrap().as_bool(), Some(false));
    let indicators = merged.get("indicators").unwrap();
    assert_eq!(indicators.get("left").unwrap().as_str(), Some(" < "));
    assert_eq!(indicators.get("right").unwrap().as_str(), Some(" » "));
  }

  #[test]
  fn zero_depth_replaces_tables() {
    let left: Value = toml::from_str("a = 1\nb = 2").unwrap();
    let right: Value = toml::from_str("a = 3").unwrap();
    let merged = merge_toml_values(left, right, 0);
    assert_eq!(merged.get("a").unwrap().as_integer(), Some(3));
    assert!(merged.get("b").is_none());
  }

  #[test]
  fn session_names_stay_inside_sessions_dir() {
    let file = session_file("../../etc/passwd").unwrap();
    assert_eq!(file.file_name().unwrap(), "______etc_passwd.json");
    let file = session_file("").unwrap();
    assert_eq!(file.file_name().unwrap(), "default.json");
  }

  #[test]
  fn workspace_is_found_by_marker_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(".tabmark")).unwrap();
    let nested = dir.path().join("src").join("deep");
    std::fs::create_dir_all(&nested).unwrap();
    let (root, fallback) = find_workspace_in(&nested);
    assert_eq!(root, dir.path());
    assert!(!fallback);
  }
}
