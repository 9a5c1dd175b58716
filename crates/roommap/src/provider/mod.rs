//! Uniform facade over the map backends.
//!
//! Two backends exist, an open tile renderer and a hosted map service. Which one is used is
//! decided once at startup from [`crate::config::Config::use_hosted_maps`] and never changes
//! afterwards. Everything above this module talks to a [`MapProvider`] only.

use std::{
    error::Error,
    fmt::Display,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use geo_types::Coord;
use serde::{Deserialize, Serialize};

mod scene;
pub mod viewport;

pub use scene::{MarkerScene, OpenPopup, PlacedMarker};
pub use viewport::{ScreenSize, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl MarkerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerStyle {
    /// Red teardrop pin with a white dot.
    Listing,
    /// Filled blue circle with a white ring.
    UserLocation,
    /// Amber disc with a lightning bolt.
    FlashDeal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PopupAnchor {
    Marker(MarkerId),
    Position(Coord<f64>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupLink {
    pub label: String,
    pub href: String,
    pub primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupContent {
    pub title: String,
    pub lines: Vec<String>,
    pub links: Vec<PopupLink>,
}

impl PopupContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn with_link(mut self, label: impl Into<String>, href: impl Into<String>) -> Self {
        self.links.push(PopupLink {
            label: label.into(),
            href: href.into(),
            primary: false,
        });
        self
    }

    pub fn with_primary_link(mut self, label: impl Into<String>, href: impl Into<String>) -> Self {
        self.links.push(PopupLink {
            label: label.into(),
            href: href.into(),
            primary: true,
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    OpenTiles,
    Hosted,
}

impl ProviderKind {
    pub fn from_flag(use_hosted_maps: bool) -> Self {
        if use_hosted_maps {
            Self::Hosted
        } else {
            Self::OpenTiles
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::OpenTiles => "open tiles",
                Self::Hosted => "hosted",
            }
        )
    }
}

/// Shared flag telling whether a backend can build its map yet.
#[derive(Debug, Clone, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn ready() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn mark_ready(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Contract every map backend fulfils.
///
/// The backend owns its map, so there is no separate map handle: a provider that returned `Ok`
/// from [`MapProvider::create_map`] *is* the map.
pub trait MapProvider {
    fn kind(&self) -> ProviderKind;

    fn readiness(&self) -> Readiness;

    /// Builds the map inside `container`. Fails with [`ProviderError::NotReady`] while the
    /// backend is still loading.
    fn create_map(
        &mut self,
        container: &str,
        center: Coord<f64>,
        zoom: f64,
    ) -> Result<(), ProviderError>;

    fn add_marker(
        &mut self,
        position: Coord<f64>,
        style: MarkerStyle,
    ) -> Result<MarkerId, ProviderError>;

    /// Removing an unknown marker is a no-op.
    fn remove_marker(&mut self, marker: MarkerId);

    /// Moves the viewport so every position is visible. An empty slice leaves the viewport alone.
    fn fit_bounds(&mut self, positions: &[Coord<f64>]);

    fn open_popup(&mut self, anchor: PopupAnchor, content: PopupContent)
    -> Result<(), ProviderError>;

    fn close_popup(&mut self);

    /// Centers the map on `position`, keeping the current zoom when `zoom` is `None`.
    fn pan_to(&mut self, position: Coord<f64>, zoom: Option<f64>);

    /// `None` until the map has been created.
    fn viewport(&self) -> Option<Viewport>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    NotReady,
    NotCreated,
    UnknownMarker(MarkerId),
    Backend(String),
}

impl Error for ProviderError {}

impl Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "map backend is still loading"),
            Self::NotCreated => write!(f, "map has not been created"),
            Self::UnknownMarker(marker) => write!(f, "{marker} is not on the map"),
            Self::Backend(msg) => write!(f, "map error: {msg}"),
        }
    }
}
