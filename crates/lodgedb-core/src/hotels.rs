use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Price fields parsed from a rate-information block.
///
/// The `*_display` fields hold the text as rendered; currency and amount are
/// split out of it when the text looks like `"US$1,234"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stay_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxes_and_charges: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price_display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price_amount_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_breakdown_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price_display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price_amount_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price_amount: Option<Decimal>,
}

impl PriceInfo {
    /// Returns `true` when no field was populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One entry of a room's "number of rooms" selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A bookable room option on a hotel page, with its photo gallery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounded_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occupancy_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occupancy: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bed_configuration: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_facilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_amount_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability: Vec<AvailabilityOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<String>,
    /// Full-resolution image URLs in first-seen order, no duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gallery: Vec<String>,
}

/// Hotel-level data from one hotel detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gallery: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facilities: Vec<String>,
    /// Kept as text exactly as the page exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PriceInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rooms: Vec<RoomRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_pricing: Option<PriceInfo>,
}

impl HotelRecord {
    /// Room images that also appear in the hotel-level gallery, as
    /// `(room name, url)` pairs in room order.
    #[must_use]
    pub fn room_gallery_overlap(&self) -> Vec<(&str, &str)> {
        let hotel_images: HashSet<&str> = self.gallery.iter().map(String::as_str).collect();
        self.rooms
            .iter()
            .flat_map(|room| {
                room.gallery
                    .iter()
                    .filter(|url| hotel_images.contains(url.as_str()))
                    .map(move |url| (room.name.as_str(), url.as_str()))
            })
            .collect()
    }

    /// Total number of room images across all rooms.
    #[must_use]
    pub fn room_image_count(&self) -> usize {
        self.rooms.iter().map(|r| r.gallery.len()).sum()
    }
}

/// A hotel link collected from a search results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_city: Option<String>,
    #[serde(default, skip_serializing_if = "PriceInfo::is_empty")]
    pub search_pricing: PriceInfo,
}
