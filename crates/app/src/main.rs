use std::path::Path;

use clap::Parser;
use engine::{Inventory, MemoryGateway, SettingsStore};
use gateway::{HttpGateway, session_file};

use crate::{cli::Cli, error::Result, settings::AppSettings};

mod cli;
mod commands;
mod error;
mod prompt;
mod settings;

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("{}", err.alert());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = AppSettings::load(&cli.global)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(format!(
            "lotbook={level},engine={level},gateway={level}",
            level = settings.level
        ))
        .init();

    let mut preferences = SettingsStore::load(&settings.settings_path)?;
    let mut stdout = std::io::stdout().lock();

    if settings.offline {
        tracing::info!("working offline against the demo lot");
        let mut inventory = Inventory::new(MemoryGateway::demo().await?);
        return commands::run(cli.command, &mut inventory, &mut preferences, &mut stdout).await;
    }

    let session_path = Path::new(&settings.session_path);
    let gateway = HttpGateway::builder()
        .base_url(&settings.base_url)
        .anon_key(&settings.anon_key)
        .session(session_file::load(session_path)?)
        .build()?;
    let mut inventory = Inventory::new(gateway);
    let result = commands::run(cli.command, &mut inventory, &mut preferences, &mut stdout).await;

    // Sign in, sign out and an expired token all change the session.
    session_file::store(session_path, inventory.gateway().session().await.as_ref())?;
    result
}
