use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Record a running tmux session as a script that recreates it")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Session to record
    #[arg(value_name = "SESSION")]
    pub session: Option<String>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Leave the recreated session detached instead of attaching to it
    #[arg(short = 'd', long = "detach")]
    pub detach: bool,

    /// Path to a config file (default: ~/.config/scribe/config.yaml)
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// tmux binary to run (overrides the config file)
    #[arg(long = "tmux", value_name = "BINARY", global = true)]
    pub tmux: Option<String>,

    /// Seconds to wait for any single tmux call (overrides the config file)
    #[arg(long = "timeout", value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Log every tmux invocation to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Shell script, one tmux command per line
    Text,
    /// Session model and construction steps
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the inferred split tree of every window
    #[command(visible_alias = "show")]
    Inspect {
        /// Session to inspect
        session: String,
        /// Print panes as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Recreate a session under a new name
    Clone {
        /// Session to copy
        session: String,
        /// Name of the new session
        new_name: String,
        /// Attach to the new session once it is built
        #[arg(short = 'a', long = "attach")]
        attach: bool,
    },

    /// Ask every pane of a session to exit
    Close {
        /// Session to close
        session: String,
        /// Print the tmux commands instead of running them
        #[arg(short = 'n', long = "dry-run")]
        dry_run: bool,
    },
}
