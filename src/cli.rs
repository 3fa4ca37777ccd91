use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ticket-watcher")]
#[command(version, about = "Watch a ticket page for the sold-out marker and broadcast a LINE message when sales open")]
pub struct Cli {
    /// Optional settings file (TOML, YAML or JSON); environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write daily-rotated log files into this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Check the page once and exit (0 sold out, 1 available or failed, 2 config error, 3 unexpected)
    Check {
        /// Print the check outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Keep checking on an interval until interrupted
    Watch {
        /// Seconds between checks, overriding CHECK_INTERVAL_SECS
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// Send a test broadcast to verify the LINE credential
    TestNotify {
        /// Text to send instead of the default test message
        #[arg(short, long)]
        message: Option<String>,
    },
}
