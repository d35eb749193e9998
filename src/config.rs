use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ArcIndexError;

pub const DEFAULT_CONFIG_FILE: &str = "arc-index.json";
pub const DEFAULT_INDEX_FILE: &str = "searchableArcs.json";

const KNOWN_HUBS: [(&str, &str); 3] = [
    ("freiburg", "https://git.nfdi4plants.org"),
    ("plantmicrobe", "https://gitlab.plantmicrobe.de"),
    ("tuebingen", "https://gitlab.nfdi4plants.de"),
];

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub hubs: Option<Vec<HubEntry>>,
    #[serde(default)]
    pub index_path: Option<String>,
    #[serde(default)]
    pub mirror_dir: Option<String>,
    #[serde(default)]
    pub fresh_since: Option<String>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HubEntry {
    Shorthand(String),
    Detailed(HubEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HubEntryObject {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSpec {
    pub name: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub hubs: Vec<HubSpec>,
    pub index_path: Utf8PathBuf,
    pub mirror_dir: Option<Utf8PathBuf>,
    pub fresh_since: Option<NaiveDate>,
    pub workers: usize,
    pub timeout_secs: u64,
    pub per_page: u32,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ArcIndexError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ArcIndexError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ArcIndexError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ArcIndexError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let hubs = match config.hubs {
            Some(entries) => entries
                .into_iter()
                .map(|entry| match entry {
                    HubEntry::Shorthand(name) => known_hub(&name),
                    HubEntry::Detailed(obj) => match obj.url {
                        Some(url) => Ok(HubSpec {
                            name: obj.name,
                            base_url: url.trim_end_matches('/').to_string(),
                        }),
                        None => known_hub(&obj.name),
                    },
                })
                .collect::<Result<Vec<_>, ArcIndexError>>()?,
            None => default_hubs(),
        };

        let fresh_since = match config.fresh_since {
            Some(value) => Some(
                NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                    .map_err(|_| ArcIndexError::InvalidFreshness(value.clone()))?,
            ),
            None => Some(start_of_current_year()),
        };

        Ok(ResolvedConfig {
            schema_version,
            hubs,
            index_path: Utf8PathBuf::from(
                config
                    .index_path
                    .unwrap_or_else(|| DEFAULT_INDEX_FILE.to_string()),
            ),
            mirror_dir: config.mirror_dir.map(Utf8PathBuf::from),
            fresh_since,
            workers: config.workers.unwrap_or(4).max(1),
            timeout_secs: config.timeout_secs.unwrap_or(60),
            per_page: config.per_page.unwrap_or(100).clamp(1, 100),
        })
    }
}

pub fn default_hubs() -> Vec<HubSpec> {
    KNOWN_HUBS
        .iter()
        .map(|(name, url)| HubSpec {
            name: name.to_string(),
            base_url: url.to_string(),
        })
        .collect()
}

fn known_hub(name: &str) -> Result<HubSpec, ArcIndexError> {
    KNOWN_HUBS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(name, url)| HubSpec {
            name: name.to_string(),
            base_url: url.to_string(),
        })
        .ok_or_else(|| ArcIndexError::UnknownHub(name.to_string()))
}

fn start_of_current_year() -> NaiveDate {
    let year = Utc::now().year();
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}
