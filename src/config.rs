use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::catalog::{DEFAULT_HIGH_URL, Event, EventCatalog};
use crate::error::PhotoError;

pub const CONFIG_FILE_NAME: &str = "bibphotos.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub high_url: Option<String>,
    #[serde(default)]
    pub events: Vec<EventEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EventEntry {
    pub key: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
    #[serde(default)]
    pub high_url: Option<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<EventCatalog, PhotoError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => match Self::discover() {
                Some(found) => found,
                None => return Ok(EventCatalog::builtin()),
            },
        };

        let content = fs::read_to_string(&config_path)
            .map_err(|_| PhotoError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| PhotoError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<EventCatalog, PhotoError> {
        if config.events.is_empty() {
            return Err(PhotoError::ConfigParse(
                "catalog defines no events".to_string(),
            ));
        }
        let shared_high = config
            .high_url
            .unwrap_or_else(|| DEFAULT_HIGH_URL.to_string());

        let events = config
            .events
            .into_iter()
            .map(|entry| {
                let key = entry.key.trim().to_string();
                if key.is_empty() {
                    return Err(PhotoError::ConfigParse("event key is empty".to_string()));
                }
                if !entry.url.contains("{}") {
                    return Err(PhotoError::ConfigParse(format!(
                        "listing url for {key} has no {{}} placeholder"
                    )));
                }
                Ok(Event {
                    year: entry.year.unwrap_or_default(),
                    name: entry.name.unwrap_or_else(|| key.clone()),
                    listing_url: entry.url,
                    high_url: entry.high_url.unwrap_or_else(|| shared_high.clone()),
                    key,
                })
            })
            .collect::<Result<Vec<_>, PhotoError>>()?;

        Ok(EventCatalog::new(events))
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("", "", "bibphotos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }
}
