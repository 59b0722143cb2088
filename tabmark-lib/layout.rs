//! Packing of formatted items into a single line of bounded width.
//!
//! The item of the active buffer (the anchor) is always placed first and is
//! never truncated. Neighbours are then added alternately on the left and on
//! the right. An item that fits whole is placed whole. One that does not is
//! shortened to `…` followed by the longest tail of its content that fits;
//! if even that fails the side stops growing.
//!
//! A side takes the width of its truncation indicator out of the budget the
//! first time it has to truncate, or earlier, right after placing an item,
//! when the item beyond would not fit whole anymore. Once taken, those
//! columns stay reserved, so the line may exceed the available width by at
//! most the indicators' widths.

use std::ops::Range;

use tabmark_core::statusline;

use crate::{
  config::Indicators,
  item::{
    Item,
    ItemFormat,
  },
};

pub const ELLIPSIS: &str = "…";
pub const INDICATOR_GROUP: &str = "TabmarkIndicator";
pub const FILL_GROUP: &str = "TabmarkFill";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
  pub text:            String,
  /// Rendered width of `text` in columns.
  pub width:           usize,
  pub truncated_left:  bool,
  pub truncated_right: bool,
  /// Indices of the items present in the line, fully or truncated.
  pub visible:         Range<usize>,
}

impl Line {
  fn empty() -> Self {
    Self {
      text:            String::new(),
      width:           0,
      truncated_left:  false,
      truncated_right: false,
      visible:         0..0,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
  Left,
  Right,
}

#[derive(Debug)]
struct Frontier {
  /// Next item to place on this side.
  next:      Option<usize>,
  /// Width of this side's indicator.
  reserve:   usize,
  /// Whether `reserve` has been taken out of the budget.
  reserved:  bool,
  truncated: bool,
  done:      bool,
  /// Placed items, innermost first.
  parts:     Vec<String>,
}

impl Frontier {
  fn new(next: Option<usize>, reserve: usize) -> Self {
    Self {
      next,
      reserve,
      reserved: false,
      truncated: false,
      done: next.is_none(),
      parts: Vec::new(),
    }
  }

  fn held(&self) -> usize {
    if self.reserved { self.reserve } else { 0 }
  }
}

struct Packer<'a> {
  items:     &'a [Item],
  format:    &'a dyn ItemFormat,
  available: usize,
  /// Width of the placed items, anchor included.
  width:     usize,
  left:      Frontier,
  right:     Frontier,
}

impl Packer<'_> {
  fn used(&self) -> usize {
    self.width + self.left.held() + self.right.held()
  }

  fn frontier(&self, side: Side) -> &Frontier {
    match side {
      Side::Left => &self.left,
      Side::Right => &self.right,
    }
  }

  fn frontier_mut(&mut self, side: Side) -> &mut Frontier {
    match side {
      Side::Left => &mut self.left,
      Side::Right => &mut self.right,
    }
  }

  fn outward(&self, side: Side, index: usize) -> Option<usize> {
    match side {
      Side::Left => index.checked_sub(1),
      Side::Right => (index + 1 < self.items.len()).then_some(index + 1),
    }
  }

  /// Tries to place the next item on `side`. Returns whether anything was
  /// added to the line.
  fn step(&mut self, side: Side) -> bool {
    let Some(index) = self.frontier(side).next else {
      self.frontier_mut(side).done = true;
      return false;
    };

    let beyond = self.outward(side, index);
    let text = self.format.format(&self.items[index]);
    let width = statusline::width(&text);

    if self.used() + width <= self.available {
      self.width += width;
      // reserve ahead when the next item out will have to be shortened
      let crowded = beyond.is_some_and(|next| {
        self.used() + self.items[next].display_width(self.format) > self.available
      });
      let frontier = self.frontier_mut(side);
      frontier.parts.push(text);
      frontier.next = beyond;
      frontier.reserved |= crowded;
      frontier.done = beyond.is_none();
      return true;
    }

    self.frontier_mut(side).reserved = true;
    let budget = self.available.saturating_sub(self.used());
    let shortened = truncate(&self.items[index], self.format, budget);
    if let Some((_, width)) = &shortened {
      self.width += width;
    }

    let frontier = self.frontier_mut(side);
    frontier.truncated = true;
    frontier.done = true;
    match shortened {
      Some((text, _)) => {
        frontier.parts.push(text);
        true
      },
      None => false,
    }
  }
}

/// Formats `item` with its content cut to `…` plus the longest tail that
/// keeps the result within `budget` columns.
fn truncate(item: &Item, format: &dyn ItemFormat, budget: usize) -> Option<(String, usize)> {
  if budget == 0 {
    return None;
  }
  let mut shortened = item.clone();
  for tail in statusline::tails(&item.content) {
    shortened.content = format!("{ELLIPSIS}{tail}");
    let text = format.format(&shortened);
    let width = statusline::width(&text);
    if width <= budget {
      return Some((text, width));
    }
  }
  None
}

/// Lays out `items` around `anchor` within `available` columns.
pub fn layout(
  items: &[Item],
  anchor: usize,
  available: usize,
  format: &dyn ItemFormat,
  indicators: &Indicators,
) -> Line {
  if items.is_empty() {
    return Line::empty();
  }
  let anchor = anchor.min(items.len() - 1);
  let anchor_text = format.format(&items[anchor]);

  let mut packer = Packer {
    items,
    format,
    available,
    width: statusline::width(&anchor_text),
    left: Frontier::new(anchor.checked_sub(1), statusline::width(&indicators.left)),
    right: Frontier::new(
      (anchor + 1 < items.len()).then_some(anchor + 1),
      statusline::width(&indicators.right),
    ),
  };

  if packer.used() > available {
    // the anchor is shown whole even when it alone overflows
    for frontier in [&mut packer.left, &mut packer.right] {
      frontier.truncated = frontier.next.is_some();
      frontier.reserved = frontier.truncated;
      frontier.done = true;
    }
  }

  while !(packer.left.done && packer.right.done) {
    let mut progressed = false;
    for side in [Side::Left, Side::Right] {
      if !packer.frontier(side).done {
        progressed |= packer.step(side);
      }
    }
    if !progressed {
      break;
    }
  }

  let Packer {
    mut width,
    left,
    right,
    ..
  } = packer;

  let mut text = String::new();
  if left.truncated {
    text.push_str(&statusline::highlight(INDICATOR_GROUP));
    text.push_str(&indicators.left);
    width += left.reserve;
  }
  for part in left.parts.iter().rev() {
    text.push_str(part);
  }
  text.push_str(&anchor_text);
  for part in &right.parts {
    text.push_str(part);
  }
  text.push_str(&statusline::highlight(FILL_GROUP));
  if right.truncated {
    let pad = available.saturating_sub(width + right.reserve);
    text.extend(std::iter::repeat_n(' ', pad));
    text.push_str(&statusline::highlight(INDICATOR_GROUP));
    text.push_str(&indicators.right);
    width += pad + right.reserve;
  }

  Line {
    text,
    width,
    truncated_left: left.truncated,
    truncated_right: right.truncated,
    visible: anchor - left.parts.len()..anchor + 1 + right.parts.len(),
  }
}
