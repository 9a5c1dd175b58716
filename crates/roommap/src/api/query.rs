use serde::Serialize;

use crate::{filter::SortOrder, types::ListingId};

/// Query string of `GET /api/rooms`. Unset parameters are left out of the URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoomQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_unverified: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_available: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

impl RoomQuery {
    /// Rooms with open slots, most open slots first.
    pub fn findmates(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            sort: Some(SortOrder::SlotsDesc),
            min_available: Some(1),
            ..Default::default()
        }
    }

    pub fn room(id: &ListingId) -> Self {
        Self {
            room_id: Some(id.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TextQuery<'a> {
    pub q: &'a str,
}
