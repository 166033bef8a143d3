mod utils;

pub mod commands;
pub mod console;
pub mod engagement;
pub mod events;
pub mod journal;
pub mod mood;
pub mod session;
pub mod settings;
pub mod streamer;
pub mod timer;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::LevelFilter;

pub use session::{SanctuarySession, SessionSnapshot};
pub use settings::{Settings, SettingsStore};
pub use streamer::StreamMode;

const SHUTDOWN_GRACE_MS: u64 = 200;

#[derive(Debug, Parser)]
#[command(name = "mood-sanctuary", version, about = "Journal, mood and focus companion")]
struct Cli {
    /// Settings file (defaults to <config dir>/mood-sanctuary/settings.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Script endpoint for this session only
    #[arg(long, env = "MOOD_SANCTUARY_ENDPOINT")]
    endpoint: Option<String>,

    /// Read the script output in one piece instead of streaming it
    #[arg(long)]
    buffered: bool,
}

fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mood-sanctuary").join("settings.json"))
}

pub fn run() -> Result<()> {
    // Reads RUST_LOG; info otherwise
    utils::init_logging(LevelFilter::Info);

    let cli = Cli::parse();
    log::info!("Mood Sanctuary starting up...");

    let settings_path = cli
        .config
        .or_else(default_settings_path)
        .ok_or_else(|| anyhow!("no config directory on this platform; pass --config"))?;
    let settings = Arc::new(SettingsStore::new(settings_path)?);
    settings.apply_overrides(cli.endpoint, cli.buffered.then_some(StreamMode::Buffered));

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let result = runtime.block_on(async {
        let session = SanctuarySession::new(&settings.get())?;
        console::run_console(session, Arc::clone(&settings)).await
    });
    runtime.shutdown_timeout(Duration::from_millis(SHUTDOWN_GRACE_MS));

    result
}
