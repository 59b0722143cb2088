//! The tracker of one editor instance.
//!
//! A [`Session`] owns the configuration, the record store, the render cache
//! and the change subscribers. Host events and user commands come in through
//! its methods, and [`Session::render`] turns the current state into the
//! tabline string.
//!
//! Every successful mutation invalidates the render cache and is reported to
//! the subscribers as a [`Change`]. Invalid targets (unknown buffers, files
//! that fail the showability predicate, absent marks) are silent no-ops.

use std::{
  fmt,
  path::{
    Path,
    PathBuf,
  },
  sync::Arc,
};

use tabmark_core::statusline;

use crate::{
  cache::{
    Fingerprint,
    RenderCache,
  },
  config::Config,
  disambiguate::disambiguate,
  host::{
    BufferId,
    Host,
    IconProvider,
  },
  item::{
    self,
    DefaultFormat,
    ItemFormat,
  },
  layout,
  marks::{
    self,
    ListOrder,
    MarkOrder,
    Tier,
  },
  recency,
  snapshot,
  store::{
    Record,
    StateStore,
  },
};

pub const TABPAGE_GROUP: &str = "TabmarkTabpage";

/// Which records [`Session::unmark`] removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmarkSelector {
  Marks(Vec<char>),
  /// Every record outside the recency window.
  Marklist,
  /// Every record inside the recency window.
  Buflist,
  All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
  /// `mark` is the file's mark after the command, `None` if it is no longer
  /// tracked.
  Marked {
    filename: PathBuf,
    mark:     Option<char>,
  },
  Unmarked {
    removed: usize,
  },
  Shown {
    filename: PathBuf,
  },
  Closed {
    filename: PathBuf,
  },
  Renamed {
    from: PathBuf,
    to:   PathBuf,
  },
  Switched {
    filename: PathBuf,
  },
  Loaded {
    records: usize,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Subscriber = Box<dyn FnMut(&Change)>;

pub struct Session {
  config:      Config,
  store:       StateStore,
  format:      Box<dyn ItemFormat>,
  icons:       Option<Box<dyn IconProvider>>,
  cache:       RenderCache,
  subscribers: Vec<(SubscriptionId, Subscriber)>,
  next_id:     usize,
}

impl fmt::Debug for Session {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Session")
      .field("config", &self.config)
      .field("store", &self.store)
      .field("cache", &self.cache)
      .field("subscribers", &self.subscribers.len())
      .finish_non_exhaustive()
  }
}

impl Session {
  pub fn new(config: Config) -> Self {
    let order = Arc::new(ListOrder::from_config(&config));
    Self {
      store: StateStore::new(order),
      config,
      format: Box::new(DefaultFormat),
      icons: None,
      cache: RenderCache::default(),
      subscribers: Vec::new(),
      next_id: 0,
    }
  }

  pub fn with_order(mut self, order: Arc<dyn MarkOrder>) -> Self {
    let records = self.store.all();
    self.store = StateStore::new(order);
    self.store.replace_all(records);
    self.cache.invalidate();
    self
  }

  pub fn with_format(mut self, format: Box<dyn ItemFormat>) -> Self {
    self.format = format;
    self.cache.invalidate();
    self
  }

  pub fn with_icons(mut self, icons: Box<dyn IconProvider>) -> Self {
    self.icons = Some(icons);
    self.cache.invalidate();
    self
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn records(&self) -> &[Record] {
    self.store.records()
  }

  pub fn get_by_mark(&self, mark: char) -> Option<&Record> {
    self.store.get_by_mark(mark)
  }

  pub fn get_by_filename(&self, filename: &Path) -> Option<&Record> {
    self.store.get_by_filename(filename)
  }

  pub fn list_all(&self) -> Vec<Record> {
    self.store.all()
  }

  /// Registers a callback fired after every successful mutation.
  pub fn subscribe(&mut self, subscriber: impl FnMut(&Change) + 'static) -> SubscriptionId {
    let id = SubscriptionId(self.next_id);
    self.next_id += 1;
    self.subscribers.push((id, Box::new(subscriber)));
    id
  }

  pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
    let before = self.subscribers.len();
    self.subscribers.retain(|(other, _)| *other != id);
    self.subscribers.len() != before
  }

  fn changed(&mut self, change: Change) {
    self.cache.invalidate();
    for (_, subscriber) in &mut self.subscribers {
      subscriber(&change);
    }
  }

  /// Toggles the mark of `buffer` (the active buffer when `None`).
  ///
  /// - `mark` held by another record: that record is rebound to the file;
  /// - file in the recency window: promoted to `mark` or the next free mark;
  /// - file pinned: demoted back into the recency window;
  /// - file untracked: pinned under `mark` or the next free mark.
  pub fn mark(&mut self, host: &dyn Host, buffer: Option<BufferId>, mark: Option<char>) -> bool {
    let Some(filename) = buffer
      .or_else(|| host.current_buffer())
      .and_then(|buffer| host.showable_name(buffer))
    else {
      tracing::debug!(?buffer, "mark: no showable buffer");
      return false;
    };

    let held = mark.filter(|&mark| self.store.get_by_mark(mark).is_some());
    let tracked = self.store.get_by_filename(&filename).map(|record| record.mark);

    match (held, tracked) {
      (Some(mark), _) => {
        tracing::debug!(%mark, file = %filename.display(), "rebinding mark");
        self.store.insert(Record::new(mark, filename.clone()));
      },
      (None, Some(current)) if self.config.tier(current) == Tier::Recent => {
        let mark = mark.unwrap_or_else(|| marks::next_unused(&self.config, &self.store));
        self.store.insert(Record::new(mark, filename.clone()));
      },
      (None, Some(_)) => {
        self.store.delete(&filename);
        recency::shift_in(&mut self.store, &self.config.buflist, filename.clone());
      },
      (None, None) => {
        let mark = mark.unwrap_or_else(|| marks::next_unused(&self.config, &self.store));
        self.store.insert(Record::new(mark, filename.clone()));
      },
    }

    let mark = self.store.get_by_filename(&filename).map(|record| record.mark);
    self.changed(Change::Marked { filename, mark });
    true
  }

  /// Removes the records selected by `selector` and returns how many were
  /// removed. The active buffer is fed back into the recency window if it
  /// ended up untracked.
  pub fn unmark(&mut self, host: &dyn Host, selector: UnmarkSelector) -> usize {
    let targets: Vec<char> = match selector {
      UnmarkSelector::Marks(marks) => marks,
      UnmarkSelector::All => self.store.records().iter().map(|r| r.mark).collect(),
      UnmarkSelector::Marklist => self.marks_in_window(false),
      UnmarkSelector::Buflist => self.marks_in_window(true),
    };

    let mut removed = 0;
    for mark in targets {
      match self.store.delete_mark(mark) {
        Some(_) => removed += 1,
        None => tracing::debug!(%mark, "unmark: mark not held"),
      }
    }

    let refed = host
      .current_name()
      .is_some_and(|current| recency::shift_in(&mut self.store, &self.config.buflist, current));

    if removed > 0 || refed {
      self.changed(Change::Unmarked { removed });
    }
    removed
  }

  fn marks_in_window(&self, recent: bool) -> Vec<char> {
    self
      .store
      .records()
      .iter()
      .map(|record| record.mark)
      .filter(|&mark| (self.config.tier(mark) == Tier::Recent) == recent)
      .collect()
  }

  pub fn cycle_next(&mut self, host: &mut dyn Host) -> bool {
    self.cycle(host, 1)
  }

  pub fn cycle_prev(&mut self, host: &mut dyn Host) -> bool {
    self.cycle(host, -1)
  }

  fn cycle(&mut self, host: &mut dyn Host, direction: isize) -> bool {
    let count = self.store.len();
    let Some(index) = host
      .current_name()
      .and_then(|current| self.store.position_of(&current))
    else {
      tracing::debug!("cycle: active buffer is not tracked");
      return false;
    };

    let target = index as isize + direction;
    if !self.config.wraparound && !(0..count as isize).contains(&target) {
      return false;
    }
    let next = target.rem_euclid(count as isize) as usize;
    let filename = self.store.records()[next].filename.clone();
    self.switch(host, filename)
  }

  /// Switches to the file holding `mark`.
  pub fn jump(&mut self, host: &mut dyn Host, mark: char) -> bool {
    let Some(filename) = self.store.get_by_mark(mark).map(|r| r.filename.clone()) else {
      tracing::debug!(%mark, "jump: mark not held");
      return false;
    };
    self.switch(host, filename)
  }

  fn switch(&mut self, host: &mut dyn Host, filename: PathBuf) -> bool {
    if !host.switch_to(&filename) {
      tracing::debug!(file = %filename.display(), "host refused to switch");
      return false;
    }
    self.changed(Change::Switched { filename });
    true
  }

  /// A buffer became visible in a window.
  pub fn on_file_shown(&mut self, host: &dyn Host, buffer: BufferId) -> bool {
    let Some(filename) = host.showable_name(buffer) else {
      return false;
    };
    if !recency::shift_in(&mut self.store, &self.config.buflist, filename.clone()) {
      return false;
    }
    self.changed(Change::Shown { filename });
    true
  }

  pub fn on_file_closed(&mut self, filename: &Path) -> bool {
    if self.store.delete(filename).is_none() {
      return false;
    }
    self.changed(Change::Closed {
      filename: filename.to_path_buf(),
    });
    true
  }

  pub fn on_file_renamed(&mut self, from: &Path, to: &Path) -> bool {
    if !self.store.rename(from, to) {
      return false;
    }
    self.changed(Change::Renamed {
      from: from.to_path_buf(),
      to:   to.to_path_buf(),
    });
    true
  }

  /// Renders the tabline for the host's current state.
  ///
  /// Records whose buffers are no longer showable are dropped first and
  /// reported to subscribers as [`Change::Closed`].
  pub fn render(&mut self, host: &dyn Host) -> String {
    let pruned = self.store.retain(|record| host.is_showable(&record.filename));
    if !pruned.is_empty() {
      tracing::debug!(count = pruned.len(), "pruned records of hidden buffers");
    }
    for record in pruned {
      self.changed(Change::Closed {
        filename: record.filename,
      });
    }

    let metrics = host.metrics();
    let any_modified = self
      .store
      .records()
      .iter()
      .any(|record| host.is_modified(&record.filename));
    let key = Fingerprint::new(metrics, host.current_buffer(), any_modified);
    if let Some(line) = self.cache.get(&key) {
      return line.to_string();
    }

    let tabpages = if metrics.tabpage_count > 1 {
      format!(" {}/{} ", metrics.tabpage_index, metrics.tabpage_count)
    } else {
      String::new()
    };
    let mut tail = String::from("%=");
    if !tabpages.is_empty() {
      tail.push_str(&statusline::highlight(TABPAGE_GROUP));
      tail.push_str(&tabpages);
    }

    let available = metrics.columns.saturating_sub(statusline::width(&tabpages));
    let line = if available == 0 {
      tail
    } else {
      let current = host.current_name();
      let icons = self.icons.as_deref().filter(|_| self.config.icons);
      let mut items = item::build_items(
        self.store.records(),
        &self.config,
        host,
        current.as_deref(),
        icons,
      );
      disambiguate(&mut items);
      let anchor = items.iter().position(|item| item.is_current()).unwrap_or(0);
      let mut line = layout::layout(
        &items,
        anchor,
        available,
        self.format.as_ref(),
        &self.config.indicators,
      )
      .text;
      line.push_str(&tail);
      line
    };

    self.cache.store(key, line.clone());
    line
  }

  pub fn save_snapshot(&self, name: &str) -> snapshot::Result<()> {
    let path = snapshot::session_path(name).inspect_err(|err| {
      tracing::warn!(name, "cannot locate session: {err}");
    })?;
    self.save_snapshot_to(&path)
  }

  pub fn save_snapshot_to(&self, path: &Path) -> snapshot::Result<()> {
    snapshot::write(path, self.store.records()).inspect_err(|err| {
      tracing::warn!(path = %path.display(), "failed to save session: {err}");
    })
  }

  /// Replaces every record with the saved session `name`. On failure the
  /// current records are left untouched.
  pub fn load_snapshot(&mut self, name: &str) -> snapshot::Result<usize> {
    let path = snapshot::session_path(name).inspect_err(|err| {
      tracing::warn!(name, "cannot locate session: {err}");
    })?;
    self.load_snapshot_from(&path)
  }

  pub fn load_snapshot_from(&mut self, path: &Path) -> snapshot::Result<usize> {
    let records = snapshot::read(path).inspect_err(|err| {
      tracing::warn!(path = %path.display(), "failed to load session: {err}");
    })?;
    let count = records.len();
    self.store.replace_all(records);
    self.changed(Change::Loaded { records: count });
    Ok(count)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::RefCell,
    rc::Rc,
  };

  use super::*;
  use crate::host::MemoryHost;

  fn config(marklist: &str, buflist: &str) -> Config {
    Config {
      marklist: marklist.into(),
      buflist: buflist.into(),
      ..Config::default()
    }
  }

  fn marks(session: &Session) -> Vec<(char, String)> {
    session
      .records()
      .iter()
      .map(|r| (r.mark, r.filename.display().to_string()))
      .collect()
  }

  #[test]
  fn mark_untracked_takes_next_free_mark() {
    let mut host = MemoryHost::new(80);
    let mut session = Session::new(config("as", "z"));
    host.open("/p/one.rs");
    assert!(session.mark(&host, None, None));
    host.open("/p/two.rs");
    assert!(session.mark(&host, None, None));
    assert_eq!(marks(&session), vec![
      ('a', "/p/one.rs".to_string()),
      ('s', "/p/two.rs".to_string()),
    ]);
  }

  #[test]
  fn overflow_mark_has_a_single_holder() {
    let mut host = MemoryHost::new(80);
    let mut session = Session::new(config("a", "z"));
    for file in ["/p/1", "/p/2", "/p/3"] {
      let id = host.open(file);
      session.mark(&host, Some(id), None);
    }
    assert_eq!(marks(&session), vec![
      ('a', "/p/1".to_string()),
      ('*', "/p/3".to_string()),
    ]);
  }

  #[test]
  fn unshowable_buffers_are_ignored() {
    let mut host = MemoryHost::new(80);
    let mut session = Session::new(Config::default());
    let id = host.open("/p/dir");
    if let Some(info) = host.info_mut(id) {
      info.is_directory = true;
    }
    assert!(!session.mark(&host, None, None));
    assert!(!session.on_file_shown(&host, id));
    assert!(session.records().is_empty());
  }

  #[test]
  fn subscribers_see_mutations_until_unsubscribed() {
    let mut host = MemoryHost::new(80);
    let mut session = Session::new(Config::default());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let id = session.subscribe(move |change| sink.borrow_mut().push(change.clone()));

    let buffer = host.open("/p/a.rs");
    session.on_file_shown(&host, buffer);
    // already tracked, nothing to report
    session.on_file_shown(&host, buffer);
    assert!(session.unsubscribe(id));
    session.on_file_closed(Path::new("/p/a.rs"));

    assert_eq!(*seen.borrow(), vec![Change::Shown {
      filename: "/p/a.rs".into(),
    }]);
    assert!(!session.unsubscribe(id));
  }

  #[test]
  fn render_reuses_cached_line() {
    let mut host = MemoryHost::new(80);
    let mut session = Session::new(Config::default());
    let buffer = host.open("/p/a.rs");
    session.on_file_shown(&host, buffer);

    let first = session.render(&host);
    assert!(session.cache.is_valid());
    assert_eq!(session.render(&host), first);

    session.mark(&host, None, None);
    assert!(!session.cache.is_valid());
    assert_ne!(session.render(&host), first);
  }

  #[test]
  fn render_prunes_closed_buffers() {
    let mut host = MemoryHost::new(80);
    let mut session = Session::new(Config::default());
    let a = host.open("/p/a.rs");
    session.on_file_shown(&host, a);
    let b = host.open("/p/b.rs");
    session.on_file_shown(&host, b);
    host.close(a);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    session.subscribe(move |change| sink.borrow_mut().push(change.clone()));

    session.render(&host);
    assert_eq!(marks(&session), vec![('z', "/p/b.rs".to_string())]);
    assert_eq!(*seen.borrow(), vec![Change::Closed {
      filename: "/p/a.rs".into(),
    }]);

    // nothing left to prune
    session.render(&host);
    assert_eq!(seen.borrow().len(), 1);
  }

  #[test]
  fn tab_page_segment_only_with_several_pages() {
    let mut host = MemoryHost::new(40);
    let mut session = Session::new(Config::default());
    let buffer = host.open("/p/a.rs");
    session.on_file_shown(&host, buffer);
    assert!(!session.render(&host).contains(TABPAGE_GROUP));

    host.set_tabpages(7, 2, 3);
    let line = session.render(&host);
    assert!(line.ends_with(&format!("%=%#{TABPAGE_GROUP}# 2/3 ")));
  }

  #[test]
  fn no_room_leaves_only_the_tab_page_segment() {
    let mut host = MemoryHost::new(5);
    let mut session = Session::new(Config::default());
    let buffer = host.open("/p/a.rs");
    session.on_file_shown(&host, buffer);
    host.set_tabpages(7, 2, 3);
    assert_eq!(session.render(&host), format!("%=%#{TABPAGE_GROUP}# 2/3 "));
  }
}
