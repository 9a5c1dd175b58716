//! Runtime configuration. Every field has a default so a missing or partial JSON file works.

use std::{
    error::Error,
    fmt::Display,
    path::{Path, PathBuf},
    time::Duration,
};

use geo_types::Coord;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{provider::ProviderKind, retry::RetryPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the listings API. Relative popup and card links resolve against it as well.
    pub api_base: String,
    /// Selects the hosted map service instead of the open tile renderer. Read once at startup.
    pub use_hosted_maps: bool,
    pub hosted: HostedConfig,
    pub tiles: TileConfig,
    pub map: MapConfig,
    pub search: SearchConfig,
    pub sdk_retry: RetryPolicy,
    pub geolocation: GeolocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5000/".to_string(),
            use_hosted_maps: false,
            hosted: HostedConfig::default(),
            tiles: TileConfig::default(),
            map: MapConfig::default(),
            search: SearchConfig::default(),
            sdk_retry: RetryPolicy::default(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn provider_kind(&self) -> ProviderKind {
        ProviderKind::from_flag(self.use_hosted_maps)
    }

    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_base)
            .map_err(|err| ConfigError::InvalidUrl(format!("{}: {err}", self.api_base)))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.sdk_retry
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }
}

/// Hosted map service. The bootstrap URL serves a TileJSON document whose first `tiles` entry
/// is used as the tile URL template. `{key}` is replaced by the API key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedConfig {
    pub bootstrap_url: String,
    pub api_key: Option<String>,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            bootstrap_url: "https://api.maptiler.com/maps/streets-v2/tiles.json?key={key}"
                .to_string(),
            api_key: None,
        }
    }
}

impl HostedConfig {
    pub fn bootstrap_url(&self) -> String {
        self.bootstrap_url
            .replace("{key}", self.api_key.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    pub url_template: String,
    pub cache_dir: Option<PathBuf>,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            cache_dir: Some(PathBuf::from(".tile_cache")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub container: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container: "map".to_string(),
            center_lat: 19.076,
            center_lng: 72.8777,
            zoom: 12.0,
        }
    }
}

impl MapConfig {
    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: self.center_lng,
            y: self.center_lat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub limit: u32,
    pub findmates_limit: u32,
    pub debounce_ms: u64,
    pub property_types: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            findmates_limit: 6,
            debounce_ms: 300,
            property_types: ["pg", "hostel", "apartment", "studio"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum GeolocationConfig {
    Disabled,
    Fixed { latitude: f64, longitude: f64 },
    Ip { endpoint: String },
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self::Ip {
            endpoint: "https://ipapi.co/json/".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(serde_json::Error),
    InvalidUrl(String),
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(_, err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidUrl(_) => None,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, err) => write!(f, "could not read {}: {err}", path.display()),
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidUrl(url) => write!(f, "invalid url {url}"),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}
