//! Text measurement primitives shared by the tabmark crates.

pub mod grapheme;
pub mod statusline;
