use std::{
  cell::RefCell,
  fs,
  path::Path,
  rc::Rc,
};

use tabmark_lib::{
  Session,
  config::Config,
  host::{
    Host,
    IconProvider,
    MemoryHost,
  },
  item::{
    Item,
    ItemFormat,
  },
  session::{
    Change,
    UnmarkSelector,
  },
  snapshot::SnapshotError,
  store::Record,
};

fn config(marklist: &str, buflist: &str) -> Config {
  Config {
    marklist: marklist.into(),
    buflist: buflist.into(),
    ..Config::default()
  }
}

// two pinned files (1, 2) and two recent ones (3, 4), with 4 active
fn populated() -> (Session, MemoryHost) {
  let mut host = MemoryHost::new(80);
  let mut session = Session::new(config("as", "zx"));
  for file in ["/p/1", "/p/2"] {
    let buffer = host.open(file);
    session.mark(&host, Some(buffer), None);
  }
  for file in ["/p/3", "/p/4"] {
    let buffer = host.open(file);
    session.on_file_shown(&host, buffer);
  }
  (session, host)
}

#[test]
fn test_unmark_marklist_keeps_the_window() {
  let (mut session, host) = populated();
  assert_eq!(session.unmark(&host, UnmarkSelector::Marklist), 2);
  assert_eq!(session.list_all(), vec![
    Record::new('z', "/p/4"),
    Record::new('x', "/p/3"),
  ]);
}

#[test]
fn test_unmark_buflist_refeeds_the_active_buffer() {
  let (mut session, host) = populated();
  assert_eq!(session.unmark(&host, UnmarkSelector::Buflist), 2);
  assert_eq!(session.list_all(), vec![
    Record::new('a', "/p/1"),
    Record::new('s', "/p/2"),
    Record::new('z', "/p/4"),
  ]);
}

#[test]
fn test_unmark_all() {
  let (mut session, mut host) = populated();
  host.set_current(None);
  assert_eq!(session.unmark(&host, UnmarkSelector::All), 4);
  assert!(session.list_all().is_empty());
}

#[test]
fn test_unmark_absent_marks_is_a_no_op() {
  let (mut session, host) = populated();
  let before = session.list_all();
  let changes = Rc::new(RefCell::new(0));
  let counter = Rc::clone(&changes);
  session.subscribe(move |_| *counter.borrow_mut() += 1);

  assert_eq!(session.unmark(&host, UnmarkSelector::Marks(vec!['q', 'd'])), 0);
  assert_eq!(session.list_all(), before);
  assert_eq!(*changes.borrow(), 0);

  assert_eq!(session.unmark(&host, UnmarkSelector::Marks(vec!['q', 'a'])), 1);
  assert_eq!(*changes.borrow(), 1);
}

#[test]
fn test_every_mutation_notifies_in_order() {
  let mut host = MemoryHost::new(80);
  let mut session = Session::new(Config::default());
  let seen = Rc::new(RefCell::new(Vec::new()));
  let sink = Rc::clone(&seen);
  session.subscribe(move |change: &Change| sink.borrow_mut().push(change.clone()));

  let buffer = host.open("/p/old.rs");
  session.on_file_shown(&host, buffer);
  session.mark(&host, None, None);
  session.on_file_renamed(Path::new("/p/old.rs"), Path::new("/p/new.rs"));
  session.on_file_closed(Path::new("/p/new.rs"));

  assert_eq!(*seen.borrow(), vec![
    Change::Shown {
      filename: "/p/old.rs".into(),
    },
    Change::Marked {
      filename: "/p/old.rs".into(),
      mark:     Some('a'),
    },
    Change::Renamed {
      from: "/p/old.rs".into(),
      to:   "/p/new.rs".into(),
    },
    Change::Closed {
      filename: "/p/new.rs".into(),
    },
  ]);
}

#[test]
fn test_rename_keeps_the_mark() {
  let (mut session, _host) = populated();
  assert!(session.on_file_renamed(Path::new("/p/2"), Path::new("/p/3")));
  assert_eq!(session.get_by_filename(Path::new("/p/3")).map(|r| r.mark), Some('s'));
  assert!(session.get_by_mark('x').is_none());
  assert!(!session.on_file_renamed(Path::new("/p/missing"), Path::new("/p/9")));
}

#[test]
fn test_render_follows_state_changes() {
  let mut host = MemoryHost::new(80);
  let mut session = Session::new(Config::default());
  let buffer = host.open("/p/a.rs");
  session.on_file_shown(&host, buffer);
  let plain = session.render(&host);
  assert!(plain.contains("%#TabmarkCurrent# z a.rs "), "{plain}");

  host.set_modified(buffer, true);
  let modified = session.render(&host);
  assert!(modified.contains("%#TabmarkCurrentModified# z a.rs "), "{modified}");

  session.mark(&host, None, None);
  let marked = session.render(&host);
  assert!(marked.contains("%#TabmarkMarkedCurrentModified# a a.rs "), "{marked}");
}

#[test]
fn test_narrow_terminal_shows_indicators() {
  let mut host = MemoryHost::new(30);
  let mut session = Session::new(config("asdfg", "z"));
  for file in ["/p/one.rs", "/p/two.rs", "/p/three.rs", "/p/four.rs", "/p/five.rs"] {
    let buffer = host.open(file);
    session.mark(&host, Some(buffer), None);
  }
  let buffer = host.buffer_by_name(Path::new("/p/three.rs"));
  host.set_current(buffer);

  let line = session.render(&host);
  assert!(line.contains(" d three.rs "), "{line}");
  assert!(line.contains("%#TabmarkIndicator# < "), "{line}");
  assert!(line.contains("%#TabmarkIndicator# > "), "{line}");
  assert!(tabmark_core::statusline::width(&line) <= 30);
}

struct Bracketed;

impl ItemFormat for Bracketed {
  fn format(&self, item: &Item) -> String {
    format!("[{}{}]", item.label, item.content)
  }
}

struct Dot;

impl IconProvider for Dot {
  fn icon(&self, _name: &Path) -> Option<String> {
    Some("•".to_string())
  }
}

#[test]
fn test_custom_format_and_icons() {
  let mut host = MemoryHost::new(80);
  let mut session = Session::new(Config::default())
    .with_format(Box::new(Bracketed))
    .with_icons(Box::new(Dot));
  let buffer = host.open("/p/a.rs");
  session.on_file_shown(&host, buffer);
  assert!(session.render(&host).starts_with("[z a.rs]"));

  let mut session = Session::new(Config::default()).with_icons(Box::new(Dot));
  session.on_file_shown(&host, buffer);
  assert!(session.render(&host).contains(" • z a.rs "));

  let mut session = Session::new(Config {
    icons: false,
    ..Config::default()
  })
  .with_icons(Box::new(Dot));
  session.on_file_shown(&host, buffer);
  assert!(!session.render(&host).contains('•'));
}

#[test]
fn test_snapshot_round_trip() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("work.json");
  let (session, _host) = populated();
  session.save_snapshot_to(&path).unwrap();

  let mut restored = Session::new(config("as", "zx"));
  let loaded = Rc::new(RefCell::new(None));
  let sink = Rc::clone(&loaded);
  restored.subscribe(move |change| {
    if let Change::Loaded { records } = change {
      *sink.borrow_mut() = Some(*records);
    }
  });

  assert_eq!(restored.load_snapshot_from(&path).unwrap(), 4);
  assert_eq!(restored.list_all(), session.list_all());
  assert_eq!(*loaded.borrow(), Some(4));
}

#[test]
fn test_failed_load_leaves_state_untouched() {
  let dir = tempfile::tempdir().unwrap();
  let (mut session, _host) = populated();
  let before = session.list_all();

  let missing = dir.path().join("missing.json");
  assert!(matches!(session.load_snapshot_from(&missing), Err(SnapshotError::Io(_))));

  let duplicate = dir.path().join("duplicate.json");
  fs::write(&duplicate, r#"["a", "/p/1", "a", "/p/2"]"#).unwrap();
  assert!(matches!(
    session.load_snapshot_from(&duplicate),
    Err(SnapshotError::Malformed(_))
  ));

  assert_eq!(session.list_all(), before);
}
