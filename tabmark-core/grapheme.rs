//! Display width of unicode text, measured in terminal columns.

use unicode_width::UnicodeWidthStr;

/// Returns the number of columns a single grapheme cluster occupies.
pub fn grapheme_width(g: &str) -> usize {
  if g.is_ascii() {
    // Fast-path for pure ASCII: each byte renders with width 1.
    g.len()
  } else {
    // Ensure a minimum width of 1 for ill-formed clusters so
    // they never collapse to nothing on screen.
    UnicodeWidthStr::width(g).max(1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_grapheme_width_function() {
    assert_eq!(grapheme_width("a"), 1);
    assert_eq!(grapheme_width("\u{0007}"), 1);
    assert_eq!(grapheme_width("a\u{0301}"), 1);
    assert_eq!(grapheme_width("漢"), 2);
  }
}
