//! The boundary between tabmark and the editor that embeds it.
//!
//! Everything tabmark knows about buffers, windows and tab pages comes
//! through [`Host`]. [`MemoryHost`] is a plain in-memory implementation used
//! by the command line front end and the tests.

use std::{
  num::NonZeroUsize,
  path::{
    Path,
    PathBuf,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(NonZeroUsize);

impl BufferId {
  pub const fn new(id: NonZeroUsize) -> Self {
    Self(id)
  }

  pub const fn get(self) -> NonZeroUsize {
    self.0
  }
}

impl From<NonZeroUsize> for BufferId {
  fn from(value: NonZeroUsize) -> Self {
    Self::new(value)
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
  #[default]
  Normal,
  /// Help, quickfix, prompt, picker and other non-file buffers.
  Special,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferInfo {
  pub name:         PathBuf,
  pub loaded:       bool,
  pub listed:       bool,
  pub kind:         BufferKind,
  pub modified:     bool,
  pub is_directory: bool,
}

impl BufferInfo {
  pub fn file(name: impl Into<PathBuf>) -> Self {
    Self {
      name:         name.into(),
      loaded:       true,
      listed:       true,
      kind:         BufferKind::Normal,
      modified:     false,
      is_directory: false,
    }
  }

  /// Whether the buffer may be tracked and displayed.
  pub fn is_showable(&self) -> bool {
    !self.is_directory
      && self.loaded
      && self.listed
      && self.kind == BufferKind::Normal
      && !self.name.as_os_str().is_empty()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMetrics {
  pub columns:       usize,
  pub tabpage_id:    u64,
  /// 1-based index of the current tab page.
  pub tabpage_index: usize,
  pub tabpage_count: usize,
}

impl Default for DisplayMetrics {
  fn default() -> Self {
    Self {
      columns:       80,
      tabpage_id:    1,
      tabpage_index: 1,
      tabpage_count: 1,
    }
  }
}

pub trait Host {
  fn buffer_by_name(&self, name: &Path) -> Option<BufferId>;

  /// `None` when the handle no longer refers to a buffer.
  fn buffer_info(&self, buffer: BufferId) -> Option<BufferInfo>;

  fn current_buffer(&self) -> Option<BufferId>;

  fn metrics(&self) -> DisplayMetrics;

  /// Makes the file the active buffer, loading it if needed.
  fn switch_to(&mut self, name: &Path) -> bool;

  /// Name of `buffer` if it passes the showability predicate.
  fn showable_name(&self, buffer: BufferId) -> Option<PathBuf> {
    self
      .buffer_info(buffer)
      .filter(BufferInfo::is_showable)
      .map(|info| info.name)
  }

  fn is_showable(&self, name: &Path) -> bool {
    self
      .buffer_by_name(name)
      .and_then(|buffer| self.buffer_info(buffer))
      .is_some_and(|info| info.is_showable())
  }

  fn is_modified(&self, name: &Path) -> bool {
    self
      .buffer_by_name(name)
      .and_then(|buffer| self.buffer_info(buffer))
      .is_some_and(|info| info.modified)
  }

  fn current_name(&self) -> Option<PathBuf> {
    self
      .current_buffer()
      .and_then(|buffer| self.showable_name(buffer))
  }
}

/// Decorative glyphs shown in front of file names.
pub trait IconProvider {
  fn icon(&self, name: &Path) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
  buffers: Vec<BufferInfo>,
  current: Option<BufferId>,
  metrics: DisplayMetrics,
}

impl MemoryHost {
  pub fn new(columns: usize) -> Self {
    Self {
      metrics: DisplayMetrics {
        columns,
        ..DisplayMetrics::default()
      },
      ..Self::default()
    }
  }

  fn id_for_index(index: usize) -> BufferId {
    BufferId::new(NonZeroUsize::MIN.saturating_add(index))
  }

  /// Adds a buffer, or returns the existing one with the same name.
  pub fn add(&mut self, info: BufferInfo) -> BufferId {
    if let Some(id) = self.buffer_by_name(&info.name) {
      return id;
    }
    self.buffers.push(info);
    Self::id_for_index(self.buffers.len() - 1)
  }

  /// Adds (or reloads) an ordinary file buffer and makes it current.
  pub fn open(&mut self, name: impl Into<PathBuf>) -> BufferId {
    let id = self.add(BufferInfo::file(name));
    if let Some(info) = self.info_mut(id) {
      info.loaded = true;
      info.listed = true;
    }
    self.current = Some(id);
    id
  }

  /// Unloads and unlists the buffer, as `:bdelete` would.
  pub fn close(&mut self, id: BufferId) {
    if let Some(info) = self.info_mut(id) {
      info.loaded = false;
      info.listed = false;
    }
    if self.current == Some(id) {
      self.current = None;
    }
  }

  pub fn info_mut(&mut self, id: BufferId) -> Option<&mut BufferInfo> {
    self.buffers.get_mut(id.get().get() - 1)
  }

  pub fn set_current(&mut self, id: Option<BufferId>) {
    self.current = id;
  }

  pub fn set_modified(&mut self, id: BufferId, modified: bool) {
    if let Some(info) = self.info_mut(id) {
      info.modified = modified;
    }
  }

  pub fn set_columns(&mut self, columns: usize) {
    self.metrics.columns = columns;
  }

  pub fn set_tabpages(&mut self, id: u64, index: usize, count: usize) {
    self.metrics.tabpage_id = id;
    self.metrics.tabpage_index = index;
    self.metrics.tabpage_count = count;
  }
}

impl Host for MemoryHost {
  fn buffer_by_name(&self, name: &Path) -> Option<BufferId> {
    self
      .buffers
      .iter()
      .position(|info| info.name == name)
      .map(Self::id_for_index)
  }

  fn buffer_info(&self, buffer: BufferId) -> Option<BufferInfo> {
    self.buffers.get(buffer.get().get() - 1).cloned()
  }

  fn current_buffer(&self) -> Option<BufferId> {
    self.current
  }

  fn metrics(&self) -> DisplayMetrics {
    self.metrics
  }

  fn switch_to(&mut self, name: &Path) -> bool {
    self.open(name.to_path_buf());
    true
  }
}
