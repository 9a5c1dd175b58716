use std::{fmt::Display, path::PathBuf, str::FromStr};

use clap::Parser;
use roommap::{
    Config,
    config::{ConfigError, GeolocationConfig},
};

#[derive(Debug, Parser)]
#[command(version, about = "Browse room listings on a map")]
pub struct Cli {
    /// JSON configuration file. Missing fields keep their defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use the hosted map service instead of the open tile server.
    #[arg(long)]
    pub hosted_maps: bool,

    /// API key of the hosted map service.
    #[arg(long)]
    pub map_key: Option<String>,

    /// Base URL of the listings API.
    #[arg(long)]
    pub api: Option<String>,

    /// Fixed position reported by "Locate me", as `lat,lng`.
    #[arg(long)]
    pub location: Option<Location>,
}

impl Cli {
    /// Loads the configuration file, if any, and applies the command line overrides.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::from_path(path)?,
            None => Config::default(),
        };

        if self.hosted_maps {
            config.use_hosted_maps = true;
        }
        if let Some(key) = self.map_key {
            config.hosted.api_key = Some(key);
        }
        if let Some(api) = self.api {
            config.api_base = api;
        }
        if let Some(Location {
            latitude,
            longitude,
        }) = self.location
        {
            config.geolocation = GeolocationConfig::Fixed {
                latitude,
                longitude,
            };
        }

        config.api_base_url()?;

        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl FromStr for Location {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (latitude, longitude) = s.split_once(',').ok_or(LocationParseError)?;
        let latitude = latitude.trim().parse::<f64>().map_err(|_| LocationParseError)?;
        let longitude = longitude.trim().parse::<f64>().map_err(|_| LocationParseError)?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationParseError);
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParseError;

impl std::error::Error for LocationParseError {}

impl Display for LocationParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "expected `lat,lng` in degrees, e.g. `19.076,72.8777`")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let config = Cli::try_parse_from(["roommap-gui"])
            .unwrap()
            .into_config()
            .unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn flags_override_the_configuration() {
        let config = Cli::try_parse_from([
            "roommap-gui",
            "--hosted-maps",
            "--map-key",
            "abc",
            "--api",
            "https://rooms.example/",
            "--location",
            "19.05, 72.85",
        ])
        .unwrap()
        .into_config()
        .unwrap();

        assert!(config.use_hosted_maps);
        assert_eq!(config.hosted.api_key.as_deref(), Some("abc"));
        assert_eq!(config.api_base, "https://rooms.example/");
        assert_eq!(
            config.geolocation,
            GeolocationConfig::Fixed {
                latitude: 19.05,
                longitude: 72.85
            }
        );
    }

    #[test]
    fn bad_locations_are_rejected() {
        assert!(Cli::try_parse_from(["roommap-gui", "--location", "19.05"]).is_err());
        assert!(Cli::try_parse_from(["roommap-gui", "--location", "95,72"]).is_err());
        assert!(
            Cli::try_parse_from(["roommap-gui", "--api", "not a url"])
                .unwrap()
                .into_config()
                .is_err()
        );
    }
}
