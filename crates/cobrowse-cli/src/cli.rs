use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// cobrowse: mirror a page between a host and a guest over a relay.
#[derive(Parser, Debug)]
#[command(name = "cobrowse", version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Relay URL override (ws:// or wss://).
    #[arg(long, global = true)]
    pub relay: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start a new session and print its id.
    Host,
    /// Join an existing session.
    Join {
        /// Session id shared by the host.
        session_id: String,
    },
}

pub fn parse() -> Args {
    Args::parse()
}
