//! Measurement of host statusline strings.
//!
//! A statusline string is ordinary text interleaved with `%` directives:
//!
//! - `%#Group#` switches the highlight group and occupies no columns.
//! - `%%` renders a literal percent sign (one column).
//! - `%=` and other single-character directives occupy no columns.
//!
//! All widths here are measured in rendered columns, so a string carrying
//! highlight switches reports the width the user actually sees.

use std::borrow::Cow;

use unicode_segmentation::{
  GraphemeIndices,
  UnicodeSegmentation,
};

use crate::grapheme::grapheme_width;

/// A smallest indivisible piece of a statusline string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit<'a> {
  pub text:  &'a str,
  pub width: usize,
}

impl Unit<'_> {
  pub fn is_directive(&self) -> bool {
    self.width == 0 && self.text.starts_with('%')
  }
}

/// Iterator over the [`Unit`]s of a statusline string.
pub struct Units<'a> {
  text:      &'a str,
  graphemes: GraphemeIndices<'a>,
}

impl<'a> Iterator for Units<'a> {
  type Item = Unit<'a>;

  fn next(&mut self) -> Option<Self::Item> {
    let (start, g) = self.graphemes.next()?;
    if g != "%" {
      return Some(Unit {
        text:  g,
        width: grapheme_width(g),
      });
    }

    match self.graphemes.next() {
      // A dangling `%` is shown as-is by every host we care about.
      None => {
        Some(Unit {
          text:  g,
          width: 1,
        })
      },
      Some((idx, "%")) => {
        Some(Unit {
          text:  &self.text[start..idx + 1],
          width: 1,
        })
      },
      Some((_, "#")) => {
        let mut end = self.text.len();
        for (idx, g) in self.graphemes.by_ref() {
          if g == "#" {
            end = idx + 1;
            break;
          }
        }
        Some(Unit {
          text:  &self.text[start..end],
          width: 0,
        })
      },
      Some((idx, g)) => {
        Some(Unit {
          text:  &self.text[start..idx + g.len()],
          width: 0,
        })
      },
    }
  }
}

pub fn units(text: &str) -> Units<'_> {
  Units {
    text,
    graphemes: text.grapheme_indices(true),
  }
}

/// Rendered width of a statusline string.
pub fn width(text: &str) -> usize {
  units(text).map(|unit| unit.width).sum()
}

/// Escapes literal `%` so the host does not read it as a directive.
pub fn escape(text: &str) -> Cow<'_, str> {
  if text.contains('%') {
    Cow::Owned(text.replace('%', "%%"))
  } else {
    Cow::Borrowed(text)
  }
}

/// Highlight switch for `group`.
pub fn highlight(group: &str) -> String {
  format!("%#{group}#")
}

/// Proper, non-empty suffixes of `text` that start on a unit boundary,
/// longest first.
///
/// Escaped percent signs are never split, so every suffix is itself a
/// well-formed statusline string.
pub fn tails(text: &str) -> impl Iterator<Item = &str> + '_ {
  let mut offset = 0;
  let mut starts = Vec::new();
  for unit in units(text) {
    if offset > 0 {
      starts.push(offset);
    }
    offset += unit.text.len();
  }
  starts.into_iter().map(move |start| &text[start..])
}
