use serde::{Deserialize, Serialize};

use super::ListingId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashDeal {
    pub room_id: ListingId,
    pub original_price: f64,
    pub deal_price: f64,
    pub discount_percent: f64,
    pub time_remaining_hours: f64,
}

impl FlashDeal {
    pub fn hours_left(&self) -> u64 {
        self.time_remaining_hours.max(0.0).floor() as u64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlashDealsResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub deals: Vec<FlashDeal>,
}
