//! Client-local preferences.
//!
//! The only preference is dark mode. It lives in a small JSON key/value file
//! under the fixed key [`SETTINGS_KEY`], so other keys written by older
//! clients are preserved on save.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EngineError, ResultEngine};

pub const SETTINGS_KEY: &str = "settingsStore";
pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.json";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub dark_mode: bool,
}

/// Settings bound to the file they are loaded from and saved to.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Load settings; a missing file or missing key yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> ResultEngine<Self> {
        let path = path.into();
        let settings = match read_map(&path)?.get(SETTINGS_KEY) {
            Some(value) => serde_json::from_value(value.clone()).map_err(|err| {
                EngineError::Settings(format!("invalid settings in {}: {err}", path.display()))
            })?,
            None => Settings::default(),
        };
        Ok(Self { path, settings })
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn dark_mode(&self) -> bool {
        self.settings.dark_mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flip dark mode and persist it. Returns the new value.
    pub fn toggle_dark_mode(&mut self) -> ResultEngine<bool> {
        self.set_dark_mode(!self.settings.dark_mode)?;
        Ok(self.settings.dark_mode)
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) -> ResultEngine<()> {
        let previous = self.settings;
        self.settings.dark_mode = dark_mode;
        if let Err(err) = self.save() {
            self.settings = previous;
            return Err(err);
        }
        tracing::debug!("dark mode set to {dark_mode}");
        Ok(())
    }

    fn save(&self) -> ResultEngine<()> {
        let mut map = read_map(&self.path)?;
        let value = serde_json::to_value(self.settings)
            .map_err(|err| EngineError::Settings(format!("serialize settings: {err}")))?;
        map.insert(SETTINGS_KEY.to_string(), value);
        write_map(&self.path, &map)
            .map_err(|err| EngineError::Settings(format!("settings save failed: {err}")))
    }
}

fn read_map(path: &Path) -> ResultEngine<Map<String, Value>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(err) => {
            return Err(EngineError::Settings(format!(
                "cannot read {}: {err}",
                path.display()
            )));
        }
    };
    serde_json::from_str(&raw)
        .map_err(|err| EngineError::Settings(format!("invalid {}: {err}", path.display())))
}

fn write_map(path: &Path, map: &Map<String, Value>) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(map)
        .map_err(|_| std::io::Error::other("serialize failed"))?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("lotbook_settings_{}", Uuid::new_v4()))
            .join("settings.json")
    }

    #[test]
    fn missing_file_defaults_to_light_mode() {
        let store = SettingsStore::load(temp_path()).unwrap();
        assert!(!store.dark_mode());
    }

    #[test]
    fn toggle_persists_under_fixed_key() {
        let path = temp_path();
        let mut store = SettingsStore::load(&path).unwrap();
        assert!(store.toggle_dark_mode().unwrap());

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[SETTINGS_KEY]["darkMode"], Value::Bool(true));

        let reloaded = SettingsStore::load(&path).unwrap();
        assert!(reloaded.dark_mode());

        let mut reloaded = reloaded;
        assert!(!reloaded.toggle_dark_mode().unwrap());
        assert!(!SettingsStore::load(&path).unwrap().dark_mode());
    }

    #[test]
    fn unrelated_keys_survive_a_save() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"cars": [], "settingsStore": {"darkMode": false}}"#).unwrap();

        let mut store = SettingsStore::load(&path).unwrap();
        store.set_dark_mode(true).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get("cars").is_some());
        assert_eq!(raw[SETTINGS_KEY]["darkMode"], Value::Bool(true));
    }
}
