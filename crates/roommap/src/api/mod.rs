//! Client side of the listings REST API.

use std::{error::Error, fmt::Display, future::Future};

use crate::types::{FlashDealsResponse, Listing, ListingId, RoomsResponse, Suggestion};

mod http;
mod query;

pub use http::HttpListingsApi;
pub use query::RoomQuery;

/// Read access to the listings backend.
pub trait ListingsApi: Send + Sync + 'static {
    /// `GET /api/rooms`
    fn fetch_rooms(
        &self,
        query: &RoomQuery,
    ) -> impl Future<Output = Result<RoomsResponse, ApiError>> + Send;

    /// `GET /api/search/autocomplete?q`
    fn autocomplete(&self, query: &str)
    -> impl Future<Output = Result<Vec<Listing>, ApiError>> + Send;

    /// `GET /api/suggestions?q`
    fn suggestions(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Suggestion>, ApiError>> + Send;

    /// `GET /api/colleges`
    fn colleges(&self) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    /// `GET /api/flash-deals`
    fn flash_deals(&self) -> impl Future<Output = Result<FlashDealsResponse, ApiError>> + Send;

    /// Looks a single room up through `GET /api/rooms?room_id`.
    fn room_by_id(
        &self,
        id: &ListingId,
    ) -> impl Future<Output = Result<Option<Listing>, ApiError>> + Send {
        let query = RoomQuery::room(id);
        async move { Ok(self.fetch_rooms(&query).await?.rooms.into_iter().next()) }
    }
}

#[derive(Debug)]
pub enum ApiError {
    InvalidUrl(String),
    Network(reqwest::Error),
    Status { status: u16, body: String },
    Decode(serde_json::Error),
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Network(err) => Some(err),
            Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(url) => write!(f, "invalid endpoint url '{url}'"),
            Self::Network(err) => write!(f, "request failed: {err}"),
            Self::Status { status, body } if body.is_empty() => {
                write!(f, "server answered with status {status}")
            }
            Self::Status { status, body } => {
                write!(f, "server answered with status {status}: {body}")
            }
            Self::Decode(err) => write!(f, "malformed response body: {err}"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}
