//! The ordered set of tracked records.
//!
//! [`StateStore`] is the only owner of records. Every structural change goes
//! through [`StateStore::insert`], [`StateStore::delete`] and friends, which
//! keep two invariants:
//!
//! - no two records share a mark,
//! - no two records share a filename,
//!
//! and leave the list sorted by the configured [`MarkOrder`].

use std::{
  fmt,
  path::{
    Path,
    PathBuf,
  },
  sync::Arc,
};

use serde::{
  Deserialize,
  Serialize,
};

use crate::marks::MarkOrder;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
  pub mark:     char,
  pub filename: PathBuf,
}

impl Record {
  pub fn new(mark: char, filename: impl Into<PathBuf>) -> Self {
    Self {
      mark,
      filename: filename.into(),
    }
  }
}

pub struct StateStore {
  records: Vec<Record>,
  order:   Arc<dyn MarkOrder>,
}

impl fmt::Debug for StateStore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StateStore")
      .field("records", &self.records)
      .finish_non_exhaustive()
  }
}

impl StateStore {
  pub fn new(order: Arc<dyn MarkOrder>) -> Self {
    Self {
      records: Vec::new(),
      order,
    }
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Records in display order.
  pub fn records(&self) -> &[Record] {
    &self.records
  }

  /// Owned copy of the records in display order.
  pub fn all(&self) -> Vec<Record> {
    self.records.clone()
  }

  pub fn get_by_mark(&self, mark: char) -> Option<&Record> {
    self.records.iter().find(|record| record.mark == mark)
  }

  pub fn get_by_filename(&self, filename: &Path) -> Option<&Record> {
    self
      .records
      .iter()
      .find(|record| record.filename == filename)
  }

  pub fn position_of(&self, filename: &Path) -> Option<usize> {
    self
      .records
      .iter()
      .position(|record| record.filename == filename)
  }

  /// Inserts `record`, or reassigns whichever record already holds its mark
  /// or filename.
  ///
  /// - mark held: that record is rebound to the new filename, and a record
  ///   previously tracking the filename under another mark is dropped;
  /// - only the filename tracked: that record takes the new mark;
  /// - neither: a new record is appended.
  pub fn insert(&mut self, record: Record) {
    let by_mark = self.records.iter().position(|r| r.mark == record.mark);
    let by_file = self.position_of(&record.filename);

    match (by_mark, by_file) {
      (Some(m), Some(f)) if m == f => return,
      (Some(m), Some(f)) => {
        self.records[m].filename = record.filename;
        self.records.remove(f);
      },
      (Some(m), None) => self.records[m].filename = record.filename,
      (None, Some(f)) => self.records[f].mark = record.mark,
      (None, None) => self.records.push(record),
    }

    self.resort();
  }

  pub fn delete(&mut self, filename: &Path) -> Option<Record> {
    let index = self.position_of(filename)?;
    Some(self.records.remove(index))
  }

  pub fn delete_mark(&mut self, mark: char) -> Option<Record> {
    let index = self.records.iter().position(|r| r.mark == mark)?;
    Some(self.records.remove(index))
  }

  /// Moves the record of `from` to `to`, keeping its mark. A record already
  /// tracking `to` is dropped.
  pub fn rename(&mut self, from: &Path, to: &Path) -> bool {
    let Some(mark) = self.get_by_filename(from).map(|record| record.mark) else {
      return false;
    };
    if from == to {
      return false;
    }
    self.delete(to);
    self.insert(Record::new(mark, to));
    true
  }

  /// Replaces every record. The caller guarantees uniqueness.
  pub fn replace_all(&mut self, records: Vec<Record>) {
    self.records = records;
    self.resort();
  }

  /// Drops every record for which `keep` returns false, returning the
  /// removed ones.
  pub fn retain(&mut self, mut keep: impl FnMut(&Record) -> bool) -> Vec<Record> {
    let mut removed = Vec::new();
    self.records.retain(|record| {
      let kept = keep(record);
      if !kept {
        removed.push(record.clone());
      }
      kept
    });
    removed
  }

  fn resort(&mut self) {
    let order = &self.order;
    // stable: unranked marks keep their insertion order at the end
    self.records.sort_by_key(|record| {
      match order.rank(record.mark) {
        Some(rank) => (false, rank),
        None => (true, 0),
      }
    });
  }
}
