//! Makes item contents unique by growing them towards the full path.
//!
//! Items start out as base names. Whenever several items share a content,
//! each of them gains its nearest not yet shown parent directory, and the
//! check is repeated until nothing collides or no item can grow further.

use std::{
  collections::HashMap,
  path::{
    Component,
    MAIN_SEPARATOR_STR,
  },
};

use tabmark_core::statusline;

use crate::item::Item;

struct Candidate {
  /// Normal components of the path, outermost first.
  segments: Vec<String>,
  /// How many trailing segments `content` currently shows.
  depth:    usize,
}

impl Candidate {
  fn can_grow(&self) -> bool {
    self.depth < self.segments.len()
  }

  fn content(&self) -> String {
    self.segments[self.segments.len() - self.depth..].join(MAIN_SEPARATOR_STR)
  }
}

pub fn disambiguate(items: &mut [Item]) {
  let mut candidates: Vec<Candidate> = items
    .iter()
    .map(|item| {
      let segments: Vec<String> = item
        .filename
        .components()
        .filter_map(|component| {
          match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
          }
        })
        .collect();
      Candidate {
        depth: usize::from(!segments.is_empty()),
        segments,
      }
    })
    .collect();

  // every pass grows at least one candidate by one segment
  let max_passes = candidates.iter().map(|c| c.segments.len()).max().unwrap_or(0);
  for _ in 0..max_passes {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items.iter() {
      *counts.entry(item.content.as_str()).or_default() += 1;
    }

    let grow: Vec<usize> = items
      .iter()
      .enumerate()
      .filter(|(i, item)| counts[item.content.as_str()] > 1 && candidates[*i].can_grow())
      .map(|(i, _)| i)
      .collect();
    if grow.is_empty() {
      break;
    }

    for i in grow {
      candidates[i].depth += 1;
      items[i].content = candidates[i].content();
    }
  }

  for item in items.iter_mut() {
    if let std::borrow::Cow::Owned(escaped) = statusline::escape(&item.content) {
      item.content = escaped;
    }
  }
}
