//! WX CLI - import station measurements and forecast by analog days.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "wx-cli",
    version,
    about = "Weather station analog-day forecasting toolkit"
)]
struct Cli {
    /// SQLite file holding the measurements
    #[arg(long, global = true, default_value = "weather.sqlite3")]
    db: PathBuf,

    #[command(subcommand)]
    command: wx_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("using store {}", cli.db.display());
    wx_cmd::run(&cli.db, cli.command).await
}
