//! Mark tiers, ordering and allocation.

use crate::{
  config::Config,
  store::StateStore,
};

/// Which list a mark was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
  /// Explicitly pinned through `marklist`.
  Pinned,
  /// Part of the recency window (`buflist`).
  Recent,
  /// The overflow mark handed out once `marklist` is exhausted.
  Overflow,
  /// A mark the user picked explicitly that no list mentions.
  Other,
}

impl Tier {
  /// Everything outside the recency window counts as pinned for display
  /// and toggling.
  pub fn is_pinned(self) -> bool {
    !matches!(self, Tier::Recent)
  }
}

/// Sort rank of marks in the tabline. Unranked marks sort last.
pub trait MarkOrder {
  fn rank(&self, mark: char) -> Option<usize>;
}

/// Ranks marks by their position in a fixed list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOrder {
  marks: Vec<char>,
}

impl ListOrder {
  pub fn new(marks: impl IntoIterator<Item = char>) -> Self {
    Self {
      marks: marks.into_iter().collect(),
    }
  }

  /// Pinned marks first, in `marklist` order, then the recency window.
  pub fn from_config(config: &Config) -> Self {
    Self::new(config.marklist.iter().chain(config.buflist.iter()))
  }
}

impl MarkOrder for ListOrder {
  fn rank(&self, mark: char) -> Option<usize> {
    self.marks.iter().position(|&m| m == mark)
  }
}

/// First mark of `marklist` that no record holds, or the overflow mark.
pub fn next_unused(config: &Config, store: &StateStore) -> char {
  config
    .marklist
    .iter()
    .find(|&mark| store.get_by_mark(mark).is_none())
    .unwrap_or_else(|| {
      tracing::debug!(
        overflow = %config.overflow_mark,
        "marklist exhausted, using overflow mark"
      );
      config.overflow_mark
    })
}
