//! mpq-cli - Command-line tool for reading patch chains of MPQ archives
//!
//! Archives are given in attach order; by default the last one given wins
//! when several contain the same name.

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

mod commands;
mod config;
mod output;
mod session;

use mpq::Priority;

// Global context for commands to access
pub static GLOBAL_OPTS: OnceLock<GlobalOptions> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub output: OutputFormat,
    pub verbose: u8,
    pub quiet: bool,
    pub no_color: bool,
}

/// Options for the current invocation, or defaults before they are set
pub fn global_opts() -> &'static GlobalOptions {
    GLOBAL_OPTS.get_or_init(GlobalOptions::default)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    fn from_config(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

#[derive(Parser)]
#[command(
    name = "mpq-cli",
    about = "Command-line tool for reading patch chains of MPQ archives",
    long_about = None,
    after_help = "EXAMPLES:
    # List every file named by the archives' (listfile)
    mpq-cli list common.MPQ patch.MPQ

    # Show which archive serves a file
    mpq-cli find common.MPQ patch.MPQ -f Interface/FrameXML/UIParent.lua

    # Print a file to stdout
    mpq-cli cat common.MPQ patch.MPQ -f Interface/FrameXML/UIParent.lua

    # Extract all files
    mpq-cli extract common.MPQ patch.MPQ -t extracted/

    # Generate shell completions
    mpq-cli completion bash > ~/.bash_completion.d/mpq-cli.bash

STORMLIB:
    Archives are read through StormLib, loaded at run time. Use --library
    or MPQ_STORMLIB to point at the shared library if it is not on the
    loader's search path."
)]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(global = true, short = 'o', long, value_enum)]
    output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(global = true, short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(global = true, short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,

    /// Disable colored output
    #[arg(global = true, long)]
    no_color: bool,

    /// Path to the StormLib shared library
    #[arg(global = true, long, env = "MPQ_STORMLIB")]
    library: Option<PathBuf>,

    /// Let earlier archives win over later ones
    #[arg(global = true, long)]
    base_first: bool,

    /// Configuration file (default: ~/.config/mpq-cli/config.toml)
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List files in a set of archives
    List {
        /// MPQ archives in attach order
        #[arg(required = true)]
        archives: Vec<PathBuf>,
        /// Only show names matching this glob (case-insensitive)
        #[arg(short, long)]
        pattern: Option<String>,
    },
    /// Find which archive serves a file
    Find {
        /// MPQ archives in attach order
        #[arg(required = true)]
        archives: Vec<PathBuf>,
        /// File name to look up
        #[arg(short, long)]
        file: String,
    },
    /// Write a file's contents to stdout
    Cat {
        /// MPQ archives in attach order
        #[arg(required = true)]
        archives: Vec<PathBuf>,
        /// File name to print
        #[arg(short, long)]
        file: String,
        /// Ignore engine-level patches
        #[arg(long)]
        base_only: bool,
    },
    /// Extract files from a set of archives
    Extract {
        /// MPQ archives in attach order
        #[arg(required = true)]
        archives: Vec<PathBuf>,
        /// Target directory
        #[arg(short, long, default_value = ".")]
        target: PathBuf,
        /// Specific files to extract (if not specified, extracts all listed files)
        #[arg(short, long)]
        file: Vec<String>,
    },
    /// Show metadata of a file
    Info {
        /// MPQ archives in attach order
        #[arg(required = true)]
        archives: Vec<PathBuf>,
        /// File name to describe
        #[arg(short, long)]
        file: String,
    },
    /// Generate shell completion scripts
    #[command(about = "Generate completion scripts for your shell")]
    Completion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = config::load_config(cli.config.as_deref())?;

    let output = cli
        .output
        .or_else(|| {
            config
                .default_output
                .as_deref()
                .and_then(OutputFormat::from_config)
        })
        .unwrap_or_default();

    // Set up colored output based on flags
    if cli.no_color || output != OutputFormat::Text {
        colored::control::set_override(false);
    }

    // Store global options for commands to access
    let global_opts = GlobalOptions {
        output,
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_color: cli.no_color,
    };

    GLOBAL_OPTS
        .set(global_opts)
        .map_err(|_| anyhow!("Global options already initialized"))?;

    let priority = if cli.base_first {
        Priority::FirstAttachedFirst
    } else {
        config.priority.unwrap_or_default()
    };
    let library = cli.library.or(config.library);
    let session = session::SessionOptions { library, priority };

    // Execute command
    match cli.command {
        Commands::List { archives, pattern } => {
            let mut set = session.open(&archives)?;
            commands::list::list(&mut set, pattern.as_deref())?;
        }
        Commands::Find { archives, file } => {
            let set = session.open(&archives)?;
            commands::find::find(&set, &file)?;
        }
        Commands::Cat {
            archives,
            file,
            base_only,
        } => {
            let set = session.open(&archives)?;
            commands::cat::cat(&set, &file, base_only)?;
        }
        Commands::Extract {
            archives,
            target,
            file,
        } => {
            let mut set = session.open(&archives)?;
            commands::extract::extract(&mut set, &target, &file)?;
        }
        Commands::Info { archives, file } => {
            let set = session.open(&archives)?;
            commands::info::info(&set, &file)?;
        }
        Commands::Completion { shell } => {
            // Generate completion script for the specified shell
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
