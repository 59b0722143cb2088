//! Saved sessions.
//!
//! A snapshot is the record list flattened into alternating marks and file
//! names, stored as a JSON array:
//!
//! ```json
//! ["a", "/p/src/lib.rs", "z", "/p/README.md"]
//! ```
//!
//! Reading validates the whole snapshot before anything is handed back, so a
//! failed load never leaves a half-applied state behind. Writes go through a
//! temporary file in the same directory and are renamed into place.

use std::{
  collections::HashSet,
  fs,
  io::{
    self,
    BufWriter,
    Write,
  },
  path::{
    Path,
    PathBuf,
  },
};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::store::Record;

#[derive(Debug, Error)]
pub enum SnapshotError {
  #[error("no session directory: {0}")]
  Location(String),
  #[error(transparent)]
  Io(#[from] io::Error),
  #[error("failed to parse snapshot: {0}")]
  Json(#[from] serde_json::Error),
  #[error("malformed snapshot: {0}")]
  Malformed(String),
  #[error("failed to persist snapshot: {0}")]
  Persist(#[from] tempfile::PersistError),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Path of the snapshot for the session called `name`.
pub fn session_path(name: &str) -> Result<PathBuf> {
  tabmark_loader::session_file(name).map_err(|err| SnapshotError::Location(format!("{err:#}")))
}

pub fn encode(records: &[Record]) -> Result<Vec<String>> {
  let mut flat = Vec::with_capacity(records.len() * 2);
  for record in records {
    let filename = record.filename.to_str().ok_or_else(|| {
      SnapshotError::Malformed(format!(
        "path is not valid UTF-8: {}",
        record.filename.display()
      ))
    })?;
    flat.push(record.mark.to_string());
    flat.push(filename.to_string());
  }
  Ok(flat)
}

pub fn decode(flat: Vec<String>) -> Result<Vec<Record>> {
  if flat.len() % 2 != 0 {
    return Err(SnapshotError::Malformed(format!(
      "expected mark/filename pairs, got {} entries",
      flat.len()
    )));
  }

  let mut marks = HashSet::new();
  let mut filenames = HashSet::new();
  let mut records = Vec::with_capacity(flat.len() / 2);
  let mut entries = flat.into_iter();
  while let (Some(mark), Some(filename)) = (entries.next(), entries.next()) {
    let mut chars = mark.chars();
    let (Some(mark), None) = (chars.next(), chars.next()) else {
      return Err(SnapshotError::Malformed(format!(
        "mark {mark:?} is not a single character"
      )));
    };
    let filename = PathBuf::from(filename);
    if !filename.is_absolute() {
      return Err(SnapshotError::Malformed(format!(
        "{} is not an absolute path",
        filename.display()
      )));
    }
    if !marks.insert(mark) {
      return Err(SnapshotError::Malformed(format!("mark {mark:?} appears twice")));
    }
    if !filenames.insert(filename.clone()) {
      return Err(SnapshotError::Malformed(format!(
        "{} appears twice",
        filename.display()
      )));
    }
    records.push(Record { mark, filename });
  }
  Ok(records)
}

pub fn read(path: &Path) -> Result<Vec<Record>> {
  let contents = fs::read_to_string(path)?;
  let flat: Vec<String> = serde_json::from_str(&contents)?;
  decode(flat)
}

pub fn write(path: &Path, records: &[Record]) -> Result<()> {
  let flat = encode(records)?;
  let dir = path
    .parent()
    .filter(|dir| !dir.as_os_str().is_empty())
    .unwrap_or(Path::new("."));
  fs::create_dir_all(dir)?;

  let mut file = NamedTempFile::new_in(dir)?;
  {
    let mut writer = BufWriter::new(file.as_file_mut());
    serde_json::to_writer(&mut writer, &flat)?;
    writer.flush()?;
  }
  file.persist(path)?;
  Ok(())
}
