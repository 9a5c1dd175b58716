use std::{error::Error, fmt::Display, future::Future};

use geo_types::Coord;
use reqwest::{Client, Url, header::ACCEPT};
use serde::Deserialize;

use crate::config::{ConfigError, GeolocationConfig};

pub const LOCATE_LABEL: &str = "Locate me";
pub const LOCATING_LABEL: &str = "Locating…";
/// Zoom the map jumps to after a successful lookup.
pub const LOCATED_ZOOM: f64 = 14.0;

/// One-shot source of the user's position.
pub trait Geolocator: Send + Sync + 'static {
    fn locate(&self) -> impl Future<Output = Result<Coord<f64>, GeolocationError>> + Send;
}

/// Always answers with the same position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedGeolocator {
    position: Coord<f64>,
}

impl FixedGeolocator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Coord {
                x: longitude,
                y: latitude,
            },
        }
    }
}

impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coord<f64>, GeolocationError> {
        Ok(self.position)
    }
}

#[derive(Debug, Deserialize)]
struct IpLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Looks the position up from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    client: Client,
    endpoint: Url,
}

impl IpGeolocator {
    pub fn new(endpoint: Url) -> Result<Self, GeolocationError> {
        let client = Client::builder()
            .user_agent(concat!("roommap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| GeolocationError::Unavailable(err.to_string()))?;

        Ok(Self { client, endpoint })
    }
}

impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coord<f64>, GeolocationError> {
        let unavailable = |err: reqwest::Error| GeolocationError::Unavailable(err.to_string());

        let location: IpLocation = self
            .client
            .get(self.endpoint.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;

        match (location.latitude, location.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Ok(Coord { x: lng, y: lat })
            }
            _ => Err(GeolocationError::Unavailable(
                "lookup returned no coordinates".to_string(),
            )),
        }
    }
}

/// The geolocation backend picked from configuration.
#[derive(Debug, Clone)]
pub enum GeolocationSource {
    Unsupported,
    Fixed(FixedGeolocator),
    Ip(IpGeolocator),
}

impl GeolocationSource {
    pub fn from_config(config: &GeolocationConfig) -> Result<Self, ConfigError> {
        Ok(match config {
            GeolocationConfig::Disabled => Self::Unsupported,
            GeolocationConfig::Fixed {
                latitude,
                longitude,
            } => Self::Fixed(FixedGeolocator::new(*latitude, *longitude)),
            GeolocationConfig::Ip { endpoint } => {
                let endpoint = Url::parse(endpoint)
                    .map_err(|err| ConfigError::InvalidUrl(format!("{endpoint}: {err}")))?;
                Self::Ip(
                    IpGeolocator::new(endpoint)
                        .map_err(|err| ConfigError::InvalidUrl(err.to_string()))?,
                )
            }
        })
    }
}

impl Geolocator for GeolocationSource {
    async fn locate(&self) -> Result<Coord<f64>, GeolocationError> {
        match self {
            Self::Unsupported => Err(GeolocationError::Unsupported),
            Self::Fixed(fixed) => fixed.locate().await,
            Self::Ip(ip) => ip.locate().await,
        }
    }
}

/// State of the "locate me" button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocateControl {
    busy: bool,
}

impl LocateControl {
    /// Disables the control. Returns `false` if a lookup is already running.
    pub fn begin(&mut self) -> bool {
        !std::mem::replace(&mut self.busy, true)
    }

    pub fn finish(&mut self) {
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn label(&self) -> &'static str {
        if self.busy { LOCATING_LABEL } else { LOCATE_LABEL }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeolocationError {
    Unsupported,
    Unavailable(String),
}

impl GeolocationError {
    /// Text of the blocking alert shown to the user.
    pub fn alert_text(&self) -> &'static str {
        match self {
            Self::Unsupported => "Geolocation is not supported on this device",
            Self::Unavailable(_) => {
                "Unable to retrieve your location. Please check your permissions."
            }
        }
    }
}

impl Error for GeolocationError {}

impl Display for GeolocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported => write!(f, "geolocation is not available"),
            Self::Unavailable(msg) => write!(f, "could not determine location: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_source_answers_its_position() {
        let source = GeolocationSource::from_config(&GeolocationConfig::Fixed {
            latitude: 19.05,
            longitude: 72.85,
        })
        .unwrap();

        assert_eq!(source.locate().await, Ok(Coord { x: 72.85, y: 19.05 }));
    }

    #[tokio::test]
    async fn disabled_source_is_unsupported() {
        let source = GeolocationSource::from_config(&GeolocationConfig::Disabled).unwrap();
        let err = source.locate().await.unwrap_err();

        assert_eq!(err, GeolocationError::Unsupported);
        assert_eq!(err.alert_text(), "Geolocation is not supported on this device");
    }

    #[test]
    fn bad_endpoint_is_a_config_error() {
        let result = GeolocationSource::from_config(&GeolocationConfig::Ip {
            endpoint: "not a url".to_string(),
        });
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn control_label_follows_busy_state() {
        let mut control = LocateControl::default();
        assert_eq!(control.label(), LOCATE_LABEL);

        assert!(control.begin());
        assert!(!control.begin());
        assert_eq!(control.label(), "Locating…");

        control.finish();
        assert!(!control.is_busy());
    }
}
