use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::filter::FilterMode;
use crate::i18n::Language;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "kaarya",
    version,
    about = "Kaarya: bilingual personal task list backed by a hosted service",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "kaaryarc", global = true)]
    pub kaaryarc: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        email: String,
        #[arg(long, env = "KAARYA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account; the service mails a confirmation link
    Signup {
        email: String,
        #[arg(long, env = "KAARYA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Mail a password reset link
    Reset { email: String },
    /// Sign out and forget the session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show counts and the filtered task list
    List {
        #[arg(long, value_enum, default_value_t = FilterMode::All)]
        filter: FilterMode,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Add a task
    Add {
        title: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change the title and notes of a task
    Edit {
        id: String,
        #[arg(long)]
        title: String,
        /// Replaces the notes; `--notes ""` clears them, omitting keeps them
        #[arg(long)]
        notes: Option<String>,
    },
    /// Toggle a task between pending and completed
    Done { id: String },
    /// Delete a task
    Delete { id: String },
    /// Add four suggested tasks for a goal
    Suggest { goal: String },
    /// Show or switch the display language
    Lang { language: Option<Language> },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
