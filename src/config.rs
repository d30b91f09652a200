use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Zone;

/// Values that survive between sessions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_zone: Option<Zone>,
}

impl State {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };

        serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

pub fn default_state_path() -> PathBuf {
    config_dir().join("flaredns").join("state.json")
}

pub fn default_log_path() -> PathBuf {
    env::temp_dir().join("flaredns.log")
}

fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        env::var_os("APPDATA")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from(".").join(".config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_state_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        env::temp_dir()
            .join(format!("flaredns_state_test_{name}_{nanos}"))
            .join("state.json")
    }

    #[test]
    fn missing_file_is_empty_state() {
        let state = State::load(temp_state_path("missing")).unwrap();
        assert_eq!(state, State::default());
    }

    #[test]
    fn save_then_load_keeps_token_and_zone() {
        let path = temp_state_path("roundtrip");
        let state = State {
            api_token: Some("secret".to_string()),
            current_zone: Some(Zone {
                id: "z1".to_string(),
                name: "example.com".to_string(),
                status: "active".to_string(),
            }),
        };
        state.save(&path).unwrap();
        assert_eq!(State::load(&path).unwrap(), state);
    }

    #[test]
    fn cleared_token_is_not_written() {
        let path = temp_state_path("cleared");
        State::default().save(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = temp_state_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        let err = State::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
