mod app;
mod config;
mod error;
mod ui;

use std::path::Path;

use engine::{Inventory, MemoryGateway, SettingsStore};
use gateway::{HttpGateway, session_file};

use crate::{app::App, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    let settings = SettingsStore::load(&config.settings_path)?;

    if config.offline {
        let gateway = MemoryGateway::demo().await?;
        let mut app = App::new(Inventory::new(gateway), settings, &config.email);
        return app.run().await;
    }

    let session_path = Path::new(&config.session_path);
    let gateway = HttpGateway::builder()
        .base_url(&config.base_url)
        .anon_key(&config.anon_key)
        .session(session_file::load(session_path)?)
        .build()?;
    let mut app = App::new(Inventory::new(gateway), settings, &config.email);
    let result = app.run().await;
    session_file::store(
        session_path,
        app.inventory().gateway().session().await.as_ref(),
    )?;
    result
}
