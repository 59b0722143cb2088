//! The recency window: a fixed-capacity most-recently-used list of files
//! that were shown but never pinned.
//!
//! Slot `0` of `buflist` is the most recent file, slot `K - 1` the least
//! recent. A newly shown file enters at slot `0`, every occupant moves one
//! slot towards the end and whoever falls off the end stops being tracked.

use std::path::PathBuf;

use crate::{
  config::MarkList,
  store::{
    Record,
    StateStore,
  },
};

/// Feeds `filename` into the recency window.
///
/// Returns `false` without touching the store when the file already holds
/// any mark. Showability is the caller's concern.
pub fn shift_in(store: &mut StateStore, buflist: &MarkList, filename: PathBuf) -> bool {
  if store.get_by_filename(&filename).is_some() {
    return false;
  }
  let Some(head) = buflist.get(0) else {
    return false;
  };

  let occupied: Vec<(usize, PathBuf)> = buflist
    .iter()
    .enumerate()
    .filter_map(|(slot, mark)| {
      store
        .get_by_mark(mark)
        .map(|record| (slot, record.filename.clone()))
    })
    .collect();

  // least recent first, so every target slot has already been vacated
  for (slot, occupant) in occupied.into_iter().rev() {
    match buflist.get(slot + 1) {
      Some(mark) => store.insert(Record::new(mark, occupant)),
      None => {
        tracing::debug!(file = %occupant.display(), "evicted from recency window");
        store.delete(&occupant);
      },
    }
  }

  store.insert(Record::new(head, filename));
  true
}
