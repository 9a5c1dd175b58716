//! View models for the listing cards and map popups.

use crate::{
    format::{format_capacity, format_inr, format_monthly},
    provider::PopupContent,
    types::{FlashDeal, Listing, ListingId},
};

pub const NO_RESULTS: &str = "No rooms found matching your criteria.";
pub const NO_LISTINGS: &str =
    "No listings match your filters right now. Try widening the criteria.";

/// Compact card shown in the sidebar next to the map.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarCard {
    pub listing_id: ListingId,
    pub title: String,
    pub price: String,
    pub location: String,
    pub meta: String,
    pub image_url: String,
    pub booking_path: String,
}

impl From<&Listing> for SidebarCard {
    fn from(listing: &Listing) -> Self {
        Self {
            listing_id: listing.id.clone(),
            title: listing.title.clone(),
            price: format_monthly(listing.price),
            location: listing.location.clone(),
            meta: format!(
                "{} • {} slots left",
                listing.property_type,
                listing.open_slots()
            ),
            image_url: listing.image_url.clone(),
            booking_path: listing.booking_path(),
        }
    }
}

/// Full card of the results grid and the findmates panel.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomCard {
    pub listing_id: ListingId,
    pub title: String,
    pub subtitle: String,
    pub price: String,
    pub verified: bool,
    pub amenities: String,
    pub owner: String,
    pub capacity: String,
    pub image_url: String,
}

impl From<&Listing> for RoomCard {
    fn from(listing: &Listing) -> Self {
        let amenities = listing
            .amenities
            .iter()
            .take(4)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" • ");

        Self {
            listing_id: listing.id.clone(),
            title: listing.title.clone(),
            subtitle: match &listing.college {
                Some(college) => format!("{} • {college}", listing.location),
                None => listing.location.clone(),
            },
            price: format_inr(listing.price),
            verified: listing.verified,
            amenities: if amenities.is_empty() {
                "Amenities coming soon".to_string()
            } else {
                amenities
            },
            owner: match &listing.owner {
                Some(owner) => format!("Managed by {}", owner.name),
                None => "Owner verification pending".to_string(),
            },
            capacity: format_capacity(listing),
            image_url: listing.image_url.clone(),
        }
    }
}

pub fn listing_popup(listing: &Listing) -> PopupContent {
    PopupContent::new(listing.title.clone())
        .with_line(format_monthly(listing.price))
        .with_line(listing.location.clone())
        .with_link("View", listing.detail_path())
        .with_primary_link("Book Now", listing.booking_path())
}

pub fn user_location_popup() -> PopupContent {
    PopupContent::new("You are here")
}

pub fn flash_deal_popup(deal: &FlashDeal, listing: &Listing) -> PopupContent {
    PopupContent::new("⚡ FLASH DEAL ⚡")
        .with_line(listing.title.clone())
        .with_line(format!(
            "{} → {}",
            format_inr(deal.original_price),
            format_inr(deal.deal_price)
        ))
        .with_line(format!("{}% OFF", deal.discount_percent.round()))
        .with_line(format!("⏰ {}h remaining", deal.hours_left()))
        .with_primary_link("Book Now", listing.booking_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Owner;

    fn setup() -> Listing {
        serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Bandra Apartment",
            "price": 12000,
            "location": "Bandra West",
            "property_type": "apartment",
            "latitude": 19.033,
            "longitude": 72.8569,
            "image_url": "/static/img/3.jpg",
            "available_slots": 2,
            "college": "St. Xavier's",
            "amenities": ["wifi", "ac", "meals", "laundry", "gym"],
            "capacity_total": 4,
            "capacity_occupied": 2,
        }))
        .unwrap()
    }

    #[test]
    fn sidebar_card() {
        let card = SidebarCard::from(&setup());

        assert_eq!(card.price, "₹12,000/mo");
        assert_eq!(card.meta, "apartment • 2 slots left");
        assert_eq!(card.booking_path, "/book/3");
    }

    #[test]
    fn room_card_limits_amenities() {
        let mut listing = setup();
        let card = RoomCard::from(&listing);
        assert_eq!(card.amenities, "wifi • ac • meals • laundry");
        assert_eq!(card.subtitle, "Bandra West • St. Xavier's");
        assert_eq!(card.owner, "Owner verification pending");
        assert_eq!(card.capacity, "2/4 occupied · 2 open");

        listing.amenities.clear();
        listing.owner = Some(Owner {
            name: "Mrs. Kulkarni".to_string(),
        });
        let card = RoomCard::from(&listing);
        assert_eq!(card.amenities, "Amenities coming soon");
        assert_eq!(card.owner, "Managed by Mrs. Kulkarni");
    }

    #[test]
    fn listing_popup_links() {
        let popup = listing_popup(&setup());

        assert_eq!(popup.title, "Bandra Apartment");
        assert_eq!(popup.lines, vec!["₹12,000/mo", "Bandra West"]);
        assert_eq!(popup.links[0].href, "/room/3");
        assert!(!popup.links[0].primary);
        assert_eq!(popup.links[1].label, "Book Now");
        assert_eq!(popup.links[1].href, "/book/3");
    }

    #[test]
    fn flash_deal_hours_are_floored() {
        let deal = FlashDeal {
            room_id: ListingId::Number(3),
            original_price: 12000.0,
            deal_price: 9600.0,
            discount_percent: 20.0,
            time_remaining_hours: 5.9,
        };
        let popup = flash_deal_popup(&deal, &setup());

        assert_eq!(popup.lines[1], "₹12,000 → ₹9,600");
        assert_eq!(popup.lines[2], "20% OFF");
        assert_eq!(popup.lines[3], "⏰ 5h remaining");
    }
}
