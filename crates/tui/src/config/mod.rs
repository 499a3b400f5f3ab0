use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/lotbook.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub anon_key: String,
    pub email: String,
    pub session_path: String,
    pub settings_path: String,
    pub offline: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            anon_key: String::new(),
            email: String::new(),
            session_path: "config/session.json".to_string(),
            settings_path: engine::settings::DEFAULT_SETTINGS_PATH.to_string(),
            offline: false,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "lotbook_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the backend project URL.
    #[arg(long)]
    base_url: Option<String>,
    /// Override the backend anon key.
    #[arg(long)]
    anon_key: Option<String>,
    /// Prefill the sign-in email (the password is never read from CLI).
    #[arg(long)]
    email: Option<String>,
    /// Browse an in-memory demo lot instead of the backend.
    #[arg(long)]
    offline: bool,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("LOTBOOK"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(anon_key) = args.anon_key {
        settings.anon_key = anon_key;
    }
    if let Some(email) = args.email {
        settings.email = email;
    }
    if args.offline {
        settings.offline = true;
    }

    Ok(settings)
}
