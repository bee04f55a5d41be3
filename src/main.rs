mod cli;
mod config;
mod container;
mod controller;
mod input;
mod keymap;
mod logging;
mod model;
mod storage;
#[cfg(test)]
mod testing;
mod ui;
mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

fn main() -> Result<()> {
    let _args = cli::Cli::parse();
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();

    // Installed before the config is read so config discovery gets logged.
    let _log_guard = match logging::default_log_dir() {
        Some(dir) => logging::init(&dir)?,
        None => None,
    };
    let config = config::Config::load().context("loading configuration")?;
    let data_dir = config.data_dir()?;

    let keymap = keymap::Keymap::from_config(&config.keybinds).context("reading key bindings")?;
    let theme = ui::Theme::from_config(&config).context("reading theme")?;

    let path = storage::database_path(&data_dir, &config.database.name);
    let mut store = storage::YamlStore::open(&path)
        .with_context(|| format!("opening task store {}", path.display()))?;
    let controller = controller::bootstrap(&mut store).context("loading lists")?;
    info!(path = %path.display(), "session started");

    let worker = worker::StoreWorker::spawn(store)?;
    ui::run(controller, worker, keymap, theme, path.display().to_string())
}
