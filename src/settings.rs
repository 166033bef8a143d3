use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::streamer::{StreamMode, DEFAULT_SCRIPT_ENDPOINT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub script_endpoint: String,
    pub stream_mode: StreamMode,
    pub focus_presets: Vec<u32>,
    pub default_focus_minutes: u32,
    pub tick_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            script_endpoint: DEFAULT_SCRIPT_ENDPOINT.into(),
            stream_mode: StreamMode::Incremental,
            focus_presets: vec![25, 50],
            default_focus_minutes: 25,
            tick_interval_ms: 1000,
        }
    }
}

impl Settings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    /// Loads `path` if it exists. Unparseable contents fall back to defaults
    /// rather than refusing to start.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring malformed settings in {}: {err}", path.display());
                Settings::default()
            })
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> Settings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_script_endpoint(&self, endpoint: &str) -> Result<()> {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            bail!("script endpoint must be an http(s) URL, got '{endpoint}'");
        }

        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.script_endpoint = endpoint.to_string();
        self.persist(&guard)
    }

    /// In-memory override that is not written back (command-line flags).
    pub fn apply_overrides(&self, endpoint: Option<String>, stream_mode: Option<StreamMode>) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(endpoint) = endpoint {
            guard.script_endpoint = endpoint;
        }
        if let Some(mode) = stream_mode {
            guard.stream_mode = mode;
        }
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.get();
        assert_eq!(settings.script_endpoint, "http://localhost:4000/run-script");
        assert_eq!(settings.focus_presets, vec![25, 50]);
        assert_eq!(settings.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "stream_mode": "buffered", "default_focus_minutes": 50 }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().get();
        assert_eq!(settings.stream_mode, StreamMode::Buffered);
        assert_eq!(settings.default_focus_minutes, 50);
        assert_eq!(settings.tick_interval_ms, 1000);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(SettingsStore::new(path).unwrap().get(), Settings::default());
    }

    #[test]
    fn endpoint_update_is_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        store
            .update_script_endpoint("http://localhost:5000/run-script")
            .unwrap();
        assert!(store.update_script_endpoint("ftp://nope").is_err());

        let reloaded = SettingsStore::new(path).unwrap().get();
        assert_eq!(reloaded.script_endpoint, "http://localhost:5000/run-script");
    }

    #[test]
    fn overrides_are_not_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        store.apply_overrides(Some("http://10.0.0.2:4000/run-script".into()), None);
        assert_eq!(store.get().script_endpoint, "http://10.0.0.2:4000/run-script");
        assert!(!path.exists());
    }
}
