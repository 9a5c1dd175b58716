use reqwest::{Client, Request, Url, header::ACCEPT};
use serde::de::DeserializeOwned;

use super::{ApiError, ListingsApi, RoomQuery, query::TextQuery};
use crate::types::{
    AutocompleteResponse, FlashDealsResponse, Listing, RoomsResponse, Suggestion,
};

/// [`ListingsApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpListingsApi {
    client: Client,
    base: Url,
}

impl HttpListingsApi {
    pub fn new(base: Url) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("roommap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::InvalidUrl(format!("{}{path}: {err}", self.base)))
    }

    /// Builds the `GET /api/rooms` request without sending it.
    pub fn rooms_request(&self, query: &RoomQuery) -> Result<Request, ApiError> {
        Ok(self
            .client
            .get(self.endpoint("/api/rooms")?)
            .query(query)
            .header(ACCEPT, "application/json")
            .build()?)
    }

    fn text_request(&self, path: &str, query: &str) -> Result<Request, ApiError> {
        Ok(self
            .client
            .get(self.endpoint(path)?)
            .query(&TextQuery { q: query })
            .header(ACCEPT, "application/json")
            .build()?)
    }

    fn plain_request(&self, path: &str) -> Result<Request, ApiError> {
        Ok(self
            .client
            .get(self.endpoint(path)?)
            .header(ACCEPT, "application/json")
            .build()?)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: Request) -> Result<T, ApiError> {
        log::debug!("[api] GET {}", request.url());
        let response = self.client.execute(request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[api] Request failed with status {status}");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl ListingsApi for HttpListingsApi {
    async fn fetch_rooms(&self, query: &RoomQuery) -> Result<RoomsResponse, ApiError> {
        let request = self.rooms_request(query)?;
        self.get_json(request).await
    }

    async fn autocomplete(&self, query: &str) -> Result<Vec<Listing>, ApiError> {
        let request = self.text_request("/api/search/autocomplete", query)?;
        let response: AutocompleteResponse = self.get_json(request).await?;
        Ok(response.results)
    }

    async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, ApiError> {
        let request = self.text_request("/api/suggestions", query)?;
        self.get_json(request).await
    }

    async fn colleges(&self) -> Result<Vec<String>, ApiError> {
        let request = self.plain_request("/api/colleges")?;
        self.get_json(request).await
    }

    async fn flash_deals(&self) -> Result<FlashDealsResponse, ApiError> {
        let request = self.plain_request("/api/flash-deals")?;
        self.get_json(request).await
    }
}
