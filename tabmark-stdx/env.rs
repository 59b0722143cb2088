//! Functions for working with the host environment.

use std::path::PathBuf;

use eyre::{
  Result,
  WrapErr,
};
use parking_lot::RwLock;

// The CWD is cached so paths can be resolved even after the directory we
// started in has been removed.
static CWD: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Get the current working directory.
pub fn current_working_dir() -> Result<PathBuf> {
  if let Some(path) = &*CWD.read() {
    return Ok(path.clone());
  }

  // pwd -L: keep symlinked directories as the user typed them
  let mut cwd = std::env::current_dir().wrap_err("failed to get current working directory")?;

  if let Some(pwd) = std::env::var_os("PWD").map(PathBuf::from)
    && pwd.canonicalize().ok().as_ref() == Some(&cwd)
  {
    cwd = pwd;
  }

  let mut dst = CWD.write();
  *dst = Some(cwd.clone());

  Ok(cwd)
}

/// Reads a directory override from the environment, ignoring empty values.
pub fn dir_from_env(env_var_name: &str) -> Option<PathBuf> {
  std::env::var_os(env_var_name)
    .filter(|value| !value.is_empty())
    .map(PathBuf::from)
}
