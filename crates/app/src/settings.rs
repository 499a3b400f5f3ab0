//! Runtime configuration: optional TOML file, `LOTBOOK_*` environment
//! variables, then command-line overrides.

use serde::Deserialize;

use crate::{cli::GlobalArgs, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/lotbook.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub base_url: String,
    pub anon_key: String,
    pub level: String,
    pub session_path: String,
    pub settings_path: String,
    pub offline: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            anon_key: String::new(),
            level: "warn".to_string(),
            session_path: "config/session.json".to_string(),
            settings_path: engine::settings::DEFAULT_SETTINGS_PATH.to_string(),
            offline: false,
        }
    }
}

impl AppSettings {
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("LOTBOOK"));
        let mut settings: AppSettings = builder.build()?.try_deserialize()?;

        if let Some(base_url) = &args.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(anon_key) = &args.anon_key {
            settings.anon_key = anon_key.clone();
        }
        if let Some(level) = &args.level {
            settings.level = level.clone();
        }
        if args.offline {
            settings.offline = true;
        }

        Ok(settings)
    }
}
