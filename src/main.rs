use anyhow::Result;
use clap::Parser;
use ticket_watcher::app;
use ticket_watcher::cli::{Cli, Command};
use ticket_watcher::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flushes the log file on drop, so it must outlive the command
    let log_guard = logging::init(cli.log_dir.as_deref())?;

    let config_file = cli.config.as_deref();
    let code = match cli.command {
        Command::Check { json } => app::run_check(config_file, json).await,
        Command::Watch { interval } => app::run_watch(config_file, interval).await,
        Command::TestNotify { message } => app::run_test_notify(config_file, message).await,
    };

    drop(log_guard);
    std::process::exit(code);
}
