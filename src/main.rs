mod cli;
mod error;
pub(crate) mod git;
pub(crate) mod io_utils;
mod logging;
pub(crate) mod pattern;
pub(crate) mod profile;
pub(crate) mod serde_helpers;
pub(crate) mod time_utils;
pub(crate) mod workspace;

pub(crate) use error::{AppError, AppResult};

use clap::Parser;
use cli::{Cli, GetVerbosity};
use std::process::exit;
use tracing::error;

// Single-threaded so the local UTC offset can be read safely.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::setup_logger(
        cli.cmd.get_verbosity().tracing_level_filter(),
        cli.use_ansi(),
    );
    if let Err(e) = cli.cmd.run().await {
        error!("{}", e);
        exit(1);
    }
}
