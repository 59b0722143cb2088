use std::path::PathBuf;

use anyhow::Result;
use clap::{
  ArgAction,
  Args,
  Parser,
  Subcommand,
};
use tabmark_lib::session::UnmarkSelector;

#[derive(Clone, Debug)]
pub struct CliOptions {
  pub verbosity:   u8,
  pub log_file:    Option<PathBuf>,
  pub config_file: Option<PathBuf>,
  pub session:     String,
  pub current:     Option<PathBuf>,
  pub columns:     usize,
  pub command:     Command,
}

impl CliOptions {
  pub fn parse() -> Result<Self> {
    let raw = RawCli::parse();
    raw.try_into()
  }
}

#[derive(Parser, Debug)]
#[command(name = "tabmark", about, long_about = None, version)]
struct RawCli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count, global = true)]
  verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE", value_parser = parse_pathbuf, global = true)]
  log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE", value_parser = parse_pathbuf, global = true)]
  config_file: Option<PathBuf>,

  /// Name of the saved session to operate on
  #[arg(long = "session", value_name = "NAME", default_value = "default", global = true)]
  session: String,

  /// File to treat as the active buffer
  #[arg(long = "current", value_name = "FILE", value_parser = parse_pathbuf, global = true)]
  current: Option<PathBuf>,

  /// Width of the rendered tabline
  #[arg(long = "columns", value_name = "N", default_value_t = 80, global = true)]
  columns: usize,

  #[command(subcommand)]
  command: RawCommand,
}

#[derive(Subcommand, Debug)]
enum RawCommand {
  /// Report files as shown, feeding them into the recency window
  Show {
    #[arg(value_name = "FILE", required = true, value_parser = parse_pathbuf)]
    files: Vec<PathBuf>,
  },
  /// Toggle the mark of a file (the active one by default)
  Mark {
    #[arg(value_name = "FILE", value_parser = parse_pathbuf)]
    file: Option<PathBuf>,
    /// Use this mark instead of the next free one
    #[arg(long = "as", value_name = "MARK")]
    mark: Option<char>,
  },
  /// Remove marks
  Unmark(UnmarkArgs),
  /// Report a file as closed
  Close {
    #[arg(value_name = "FILE", value_parser = parse_pathbuf)]
    file: PathBuf,
  },
  /// Switch to the file holding a mark
  Jump {
    #[arg(value_name = "MARK")]
    mark: char,
  },
  /// Switch to the next tracked file
  Next,
  /// Switch to the previous tracked file
  Prev,
  /// Print every tracked file with its mark
  List,
  /// Print the tabline
  Render,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct UnmarkArgs {
  /// Remove every record
  #[arg(long)]
  all:      bool,
  /// Remove every pinned record
  #[arg(long)]
  marklist: bool,
  /// Remove every record of the recency window
  #[arg(long)]
  buflist:  bool,
  #[arg(value_name = "MARK")]
  marks:    Vec<char>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
  Show(Vec<PathBuf>),
  Mark {
    file: Option<PathBuf>,
    mark: Option<char>,
  },
  Unmark(UnmarkSelector),
  Close(PathBuf),
  Jump(char),
  Next,
  Prev,
  List,
  Render,
}

impl Command {
  /// Whether the command can change the saved session.
  pub fn mutates(&self) -> bool {
    !matches!(self, Self::List | Self::Render)
  }
}

impl From<UnmarkArgs> for UnmarkSelector {
  fn from(args: UnmarkArgs) -> Self {
    if args.all {
      Self::All
    } else if args.marklist {
      Self::Marklist
    } else if args.buflist {
      Self::Buflist
    } else {
      Self::Marks(args.marks)
    }
  }
}

impl TryFrom<RawCli> for CliOptions {
  type Error = anyhow::Error;

  fn try_from(raw: RawCli) -> Result<Self> {
    let command = match raw.command {
      RawCommand::Show { files } => Command::Show(files),
      RawCommand::Mark { file, mark } => Command::Mark { file, mark },
      RawCommand::Unmark(args) => Command::Unmark(args.into()),
      RawCommand::Close { file } => Command::Close(file),
      RawCommand::Jump { mark } => Command::Jump(mark),
      RawCommand::Next => Command::Next,
      RawCommand::Prev => Command::Prev,
      RawCommand::List => Command::List,
      RawCommand::Render => Command::Render,
    };

    if raw.columns == 0 {
      anyhow::bail!("--columns must be at least 1");
    }

    Ok(Self {
      verbosity: raw.verbosity,
      log_file: raw.log_file,
      config_file: raw.config_file,
      session: raw.session,
      current: raw.current,
      columns: raw.columns,
      command,
    })
  }
}

// files that do not exist yet are only made absolute
fn parse_pathbuf(value: &str) -> std::result::Result<PathBuf, String> {
  tabmark_stdx::path::canonicalize(value)
    .or_else(|_| tabmark_stdx::path::absolute(value))
    .map_err(|err| format!("{err:#}"))
}
