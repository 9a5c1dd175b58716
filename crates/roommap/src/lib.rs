//! Map and listings search for the room rental marketplace.
//!
//! The crate is headless: a map backend plugs in through [`provider::MapProvider`] and the
//! listings backend through [`api::ListingsApi`]. [`explorer::Explorer`] ties both to the search
//! form, the sidebar and the locate control.

pub mod api;
pub mod cards;
pub mod config;
pub mod debounce;
pub mod events;
pub mod explorer;
pub mod filter;
pub mod format;
pub mod geolocation;
pub mod provider;
pub mod retry;
pub mod search;
pub mod sync;
pub mod types;

pub use config::Config;
pub use explorer::{Explorer, MapState};
