use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use wiper_core::StrategyKind;

use crate::platform::LogDestination;

/// Wipe and delete your own messages from a chat channel, one at a time,
/// through a real browser session.
#[derive(Parser, Debug)]
#[command(name = "wiper", version)]
pub struct Cli {
    /// How messages are discovered.
    #[arg(long, value_enum, default_value_t = ModeArg::Scan)]
    pub mode: ModeArg,

    /// Channel to open before scanning. Prompted for when omitted.
    #[arg(long, value_name = "URL")]
    pub channel: Option<String>,

    /// Server to open before searching.
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Author the search is scoped to.
    #[arg(long, value_name = "NAME")]
    pub author: Option<String>,

    /// Stop after this many messages were deleted. 0 for unlimited.
    #[arg(long, value_name = "N")]
    pub limit: Option<u32>,

    /// Skip every prompt, including the final confirmation.
    #[arg(long, short = 'y', default_value_t = false)]
    pub yes: bool,

    /// Give up on a message after it failed this many times. 0 for never.
    #[arg(long = "max-attempts", value_name = "N", default_value_t = 0)]
    pub max_attempts: u32,

    /// RON config file with launch settings, waits and selector overrides.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write a JSON report of the run to this file.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Rehearse discovery against a saved HTML page instead of a browser.
    #[arg(long, value_name = "FILE", conflicts_with = "report")]
    pub snapshot: Option<PathBuf>,

    /// Run the browser without a window. Only useful with an existing profile.
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    #[arg(long, value_enum, default_value_t = LogArg::Both)]
    pub log: LogArg,

    /// Log at debug level.
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,

    /// Print the effective config as RON and exit.
    #[arg(long = "dump-config", default_value_t = false)]
    pub dump_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Scan,
    Search,
}

impl From<ModeArg> for StrategyKind {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Scan => StrategyKind::Scan,
            ModeArg::Search => StrategyKind::Search,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogArg {
    File,
    Terminal,
    Both,
}

impl From<LogArg> for LogDestination {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::File => LogDestination::File,
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::Both => LogDestination::Both,
        }
    }
}
