//! Display items: one per tracked record, rebuilt on every uncached render.

use std::path::{
  Path,
  PathBuf,
};

use tabmark_core::statusline;

use crate::{
  config::Config,
  host::{
    Host,
    IconProvider,
  },
  store::Record,
};

/// Content shown when a record has no file name component.
pub const UNNAMED: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightClass {
  Normal,
  NormalModified,
  Current,
  CurrentModified,
  Marked,
  MarkedModified,
  MarkedCurrent,
  MarkedCurrentModified,
}

impl HighlightClass {
  pub fn new(marked: bool, current: bool, modified: bool) -> Self {
    match (marked, current, modified) {
      (false, false, false) => Self::Normal,
      (false, false, true) => Self::NormalModified,
      (false, true, false) => Self::Current,
      (false, true, true) => Self::CurrentModified,
      (true, false, false) => Self::Marked,
      (true, false, true) => Self::MarkedModified,
      (true, true, false) => Self::MarkedCurrent,
      (true, true, true) => Self::MarkedCurrentModified,
    }
  }

  pub fn is_current(self) -> bool {
    matches!(
      self,
      Self::Current | Self::CurrentModified | Self::MarkedCurrent | Self::MarkedCurrentModified
    )
  }

  pub fn is_modified(self) -> bool {
    matches!(
      self,
      Self::NormalModified | Self::CurrentModified | Self::MarkedModified | Self::MarkedCurrentModified
    )
  }

  /// Highlight group the host is expected to define.
  pub fn group_name(self) -> &'static str {
    match self {
      Self::Normal => "TabmarkNormal",
      Self::NormalModified => "TabmarkNormalModified",
      Self::Current => "TabmarkCurrent",
      Self::CurrentModified => "TabmarkCurrentModified",
      Self::Marked => "TabmarkMarked",
      Self::MarkedModified => "TabmarkMarkedModified",
      Self::MarkedCurrent => "TabmarkMarkedCurrent",
      Self::MarkedCurrentModified => "TabmarkMarkedCurrentModified",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
  pub mark:      char,
  pub filename:  PathBuf,
  pub label:     String,
  /// Display name. After disambiguation this is escaped statusline text.
  pub content:   String,
  pub icon:      Option<String>,
  pub highlight: HighlightClass,
}

impl Item {
  pub fn is_current(&self) -> bool {
    self.highlight.is_current()
  }

  /// Rendered width of this item under `format`.
  pub fn display_width(&self, format: &dyn ItemFormat) -> usize {
    statusline::width(&format.format(self))
  }
}

/// Turns an item into decorated statusline text.
pub trait ItemFormat {
  fn format(&self, item: &Item) -> String;
}

/// `%#Group# <icon> <mark> <name> `
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFormat;

impl ItemFormat for DefaultFormat {
  fn format(&self, item: &Item) -> String {
    let mut out = statusline::highlight(item.highlight.group_name());
    out.push(' ');
    if let Some(icon) = &item.icon {
      out.push_str(icon);
      out.push(' ');
    }
    out.push_str(&item.label);
    out.push_str(&item.content);
    out.push(' ');
    out
  }
}

pub fn base_name(filename: &Path) -> String {
  filename
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .filter(|name| !name.is_empty())
    .unwrap_or_else(|| UNNAMED.to_string())
}

/// Builds one item per record, in record order.
pub fn build_items(
  records: &[Record],
  config: &Config,
  host: &dyn Host,
  current: Option<&Path>,
  icons: Option<&dyn IconProvider>,
) -> Vec<Item> {
  records
    .iter()
    .map(|record| {
      let marked = config.tier(record.mark).is_pinned();
      let is_current = current == Some(record.filename.as_path());
      let modified = host.is_modified(&record.filename);
      Item {
        mark:      record.mark,
        filename:  record.filename.clone(),
        label:     format!("{} ", record.mark),
        content:   base_name(&record.filename),
        icon:      icons.and_then(|icons| icons.icon(&record.filename)),
        highlight: HighlightClass::new(marked, is_current, modified),
      }
    })
    .collect()
}
