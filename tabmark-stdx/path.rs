//! Path normalization helpers.
//!
//! Tracked files are identified by their absolute path string, so every path
//! that enters the state store must pass through [`absolute`] first.

use std::{
  borrow::Cow,
  path::{
    Component,
    Path,
    PathBuf,
  },
};

use etcetera::home_dir;
use eyre::{
  Result,
  WrapErr,
};

use crate::env::current_working_dir;

/// Replaces a leading `~` with the user's home directory.
pub fn expand_tilde<'a>(path: Cow<'a, Path>) -> Cow<'a, Path> {
  let mut components = path.components();
  if let Some(Component::Normal(c)) = components.next()
    && c == "~"
    && let Ok(mut home) = home_dir()
  {
    home.push(components.as_path());
    return Cow::Owned(home);
  }
  path
}

/// Lexically normalizes a path: drops `.` and resolves `..` without touching
/// the file system.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.as_ref().components() {
    match component {
      Component::CurDir => {},
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push(component);
        }
      },
      other => normalized.push(other),
    }
  }
  normalized
}

/// Makes `path` absolute against the working directory and normalizes it.
pub fn absolute(path: impl AsRef<Path>) -> Result<PathBuf> {
  let path = expand_tilde(Cow::Borrowed(path.as_ref()));
  if path.is_absolute() {
    return Ok(normalize(path));
  }
  let cwd = current_working_dir()?;
  Ok(normalize(cwd.join(path)))
}

/// Canonicalizes `path`, following symlinks, without UNC prefixes on windows.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
  let path = absolute(path)?;
  dunce::canonicalize(&path).wrap_err_with(|| format!("failed to canonicalize '{}'", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_resolves_dots() {
    assert_eq!(normalize("/p/./dir1/../dir2/init.lua"), PathBuf::from("/p/dir2/init.lua"));
    assert_eq!(normalize("a/b/.."), PathBuf::from("a"));
  }

  #[test]
  fn absolute_keeps_absolute_paths() {
    assert_eq!(
      absolute("/tmp/x/../y.rs").unwrap(),
      PathBuf::from("/tmp/y.rs")
    );
  }

  #[test]
  fn canonicalize_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.txt");
    std::fs::write(&file, "").unwrap();
    let canonical = canonicalize(&file).unwrap();
    assert!(canonical.is_absolute());
    assert!(canonical.ends_with("a.txt"));
  }
}
