//! Memoization of the rendered tabline.

use crate::host::{
  BufferId,
  DisplayMetrics,
};

/// Everything outside the record list that changes the rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
  pub tabpage_id:     u64,
  pub tabpage_count:  usize,
  pub columns:        usize,
  pub current_buffer: Option<BufferId>,
  pub any_modified:   bool,
}

impl Fingerprint {
  pub fn new(metrics: DisplayMetrics, current_buffer: Option<BufferId>, any_modified: bool) -> Self {
    Self {
      tabpage_id: metrics.tabpage_id,
      tabpage_count: metrics.tabpage_count,
      columns: metrics.columns,
      current_buffer,
      any_modified,
    }
  }
}

#[derive(Debug, Default, Clone)]
pub struct RenderCache {
  key:  Option<Fingerprint>,
  line: String,
}

impl RenderCache {
  pub fn get(&self, key: &Fingerprint) -> Option<&str> {
    (self.key.as_ref() == Some(key)).then_some(self.line.as_str())
  }

  pub fn store(&mut self, key: Fingerprint, line: String) {
    self.key = Some(key);
    self.line = line;
  }

  pub fn invalidate(&mut self) {
    self.key = None;
  }

  pub fn is_valid(&self) -> bool {
    self.key.is_some()
  }
}
