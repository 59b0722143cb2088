use std::{
  io,
  path::Path,
};

use anyhow::{
  Context,
  Result,
};
use tabmark_lib::{
  Session,
  config::Config,
  host::{
    BufferId,
    BufferInfo,
    Host,
    MemoryHost,
  },
  snapshot::SnapshotError,
};

use crate::cli::{
  CliOptions,
  Command,
};

mod cli;

fn setup_logging(verbosity: u8) -> Result<()> {
  let mut base_config = fern::Dispatch::new();

  base_config = match verbosity {
    0 => base_config.level(log::LevelFilter::Warn),
    1 => base_config.level(log::LevelFilter::Info),
    2 => base_config.level(log::LevelFilter::Debug),
    _3_or_more => base_config.level(log::LevelFilter::Trace),
  };

  let file_config = fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.target(),
        record.level(),
        message
      ))
    })
    .chain(fern::log_file(tabmark_loader::log_file())?);

  base_config.chain(file_config).apply()?;

  Ok(())
}

fn main() -> Result<()> {
  let exit_code = main_impl()?;
  std::process::exit(exit_code);
}

fn main_impl() -> Result<i32> {
  let args = CliOptions::parse()?;

  tabmark_loader::initialize_config_file(args.config_file.clone());
  tabmark_loader::initialize_log_file(args.log_file.clone());
  setup_logging(args.verbosity).context("failed to initialize logging")?;

  let config = Config::load_default().context("failed to load config")?;
  let mut session = Session::new(config);
  match session.load_snapshot(&args.session) {
    Ok(count) => log::debug!("restored {count} records from session '{}'", args.session),
    Err(SnapshotError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {},
    Err(err) => {
      return Err(err).with_context(|| format!("failed to restore session '{}'", args.session));
    },
  }

  let mut host = MemoryHost::new(args.columns);
  for record in session.records() {
    host.add(buffer_info(&record.filename));
  }
  if let Some(current) = &args.current {
    let buffer = host.add(buffer_info(current));
    host.set_current(Some(buffer));
  }

  let code = run(&mut session, &mut host, &args.command)?;

  if args.command.mutates() {
    session
      .save_snapshot(&args.session)
      .with_context(|| format!("failed to save session '{}'", args.session))?;
  }

  Ok(code)
}

/// Describes a file as the editor would see it after opening it.
fn buffer_info(path: &Path) -> BufferInfo {
  BufferInfo {
    loaded: path.exists(),
    is_directory: path.is_dir(),
    ..BufferInfo::file(path)
  }
}

fn open(host: &mut MemoryHost, path: &Path) -> BufferId {
  let buffer = host.add(buffer_info(path));
  host.set_current(Some(buffer));
  buffer
}

fn print_current(host: &MemoryHost) {
  if let Some(current) = host.current_name() {
    println!("{}", current.display());
  }
}

fn run(session: &mut Session, host: &mut MemoryHost, command: &Command) -> Result<i32> {
  let done = match command {
    Command::Show(files) => {
      for file in files {
        let buffer = open(host, file);
        session.on_file_shown(&*host, buffer);
      }
      true
    },
    Command::Mark { file, mark } => {
      let buffer = file.as_deref().map(|file| open(host, file));
      let done = session.mark(&*host, buffer, *mark);
      if let Some(record) = host
        .current_name()
        .and_then(|current| session.get_by_filename(&current))
      {
        println!("{}", record.mark);
      }
      done
    },
    Command::Unmark(selector) => {
      let removed = session.unmark(&*host, selector.clone());
      println!("{removed}");
      true
    },
    Command::Close(file) => {
      if let Some(buffer) = host.buffer_by_name(file) {
        host.close(buffer);
      }
      session.on_file_closed(file)
    },
    Command::Jump(mark) => {
      let done = session.jump(host, *mark);
      print_current(host);
      done
    },
    Command::Next => {
      let done = session.cycle_next(host);
      print_current(host);
      done
    },
    Command::Prev => {
      let done = session.cycle_prev(host);
      print_current(host);
      done
    },
    Command::List => {
      for record in session.records() {
        println!("{} {}", record.mark, record.filename.display());
      }
      true
    },
    Command::Render => {
      println!("{}", session.render(&*host));
      true
    },
  };

  Ok(if done { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  fn session() -> Session {
    Session::new(Config::default())
  }

  #[test]
  fn missing_files_are_not_showable() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("a.rs");
    std::fs::write(&existing, "").unwrap();

    assert!(buffer_info(&existing).is_showable());
    assert!(!buffer_info(&dir.path().join("gone.rs")).is_showable());
    assert!(!buffer_info(dir.path()).is_showable());
  }

  #[test]
  fn show_then_mark() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.rs");
    std::fs::write(&file, "").unwrap();

    let mut session = session();
    let mut host = MemoryHost::new(80);
    assert_eq!(run(&mut session, &mut host, &Command::Show(vec![file.clone()])).unwrap(), 0);
    assert_eq!(session.get_by_filename(&file).map(|r| r.mark), Some('z'));

    let mark = Command::Mark {
      file: None,
      mark: None,
    };
    assert_eq!(run(&mut session, &mut host, &mark).unwrap(), 0);
    assert_eq!(session.get_by_filename(&file).map(|r| r.mark), Some('a'));
  }

  #[test]
  fn failed_commands_exit_non_zero() {
    let mut session = session();
    let mut host = MemoryHost::new(80);
    assert_eq!(run(&mut session, &mut host, &Command::Jump('a')).unwrap(), 1);
    assert_eq!(run(&mut session, &mut host, &Command::Next).unwrap(), 1);
    let close = Command::Close(PathBuf::from("/p/none"));
    assert_eq!(run(&mut session, &mut host, &close).unwrap(), 1);
  }
}
