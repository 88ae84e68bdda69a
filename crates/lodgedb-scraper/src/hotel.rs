//! Hotel detail page parsing.
//!
//! Structured data (the page's `Hotel` JSON-LD block) is preferred where it
//! exists; DOM selectors fill whatever it leaves out. The result carries the
//! page's room rows unassembled, since gallery resolution needs the live
//! session.

use std::sync::LazyLock;

use lodgedb_core::HotelRecord;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::parse_helpers::{attr_chain, element_text, select_text, unique_non_empty};
use crate::price::{extract_price_info, RATE_BLOCK_SELECTOR};
use crate::rooms::{parse_room_rows, RoomRow, ROOM_ROW_SELECTOR};

/// Elements whose presence means the hotel page has rendered enough to read.
pub const HOTEL_READY_SELECTORS: [&str; 3] = [
    "[data-testid='title']",
    ROOM_ROW_SELECTOR,
    "div.hp-description",
];

const COUNTRY_LABELS: [&str; 3] = ["uae", "united arab emirates", "united arab emirates (uae)"];

static REVIEWS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[,\s]\d{3})*)\s*reviews?\b").expect("valid reviews regex")
});
static MAP_CENTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"center=(-?[\d.]+)(?:,|%2C)(-?[\d.]+)").expect("valid map center regex")
});
static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid ld+json selector")
});
static PHOTO_WRAPPER_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#photo_wrapper img").expect("valid selector"));
static FACILITY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.f6b6d2a959, [data-testid='facility-badge']").expect("valid selector")
});
static STATIC_MAP: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.a88a546fb2 img, img[data-testid='static-map']").expect("valid selector")
});
static SEARCH_INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[name="ss"]"#).expect("valid selector"));
static REVIEW_SPANS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.f63b14ab7a, span.fb14de7f14, span.eaa8455879").expect("valid selector")
});
static TEXT_BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, div, p").expect("valid selector"));
static RATING_PRIMARY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.f63b14ab7a.dff2e52086").expect("valid selector"));
static RATING_FALLBACK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.f63b14ab7a").expect("valid selector"));
static RATE_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(RATE_BLOCK_SELECTOR).expect("valid selector"));

/// A parsed hotel page: hotel-level fields plus the raw room rows.
#[derive(Debug, Clone)]
pub struct ParsedHotel {
    /// `rooms` is left empty; see [`crate::rooms::assemble_rooms`].
    pub record: HotelRecord,
    pub rooms: Vec<RoomRow>,
}

/// Parses a hotel detail page.
#[must_use]
pub fn parse_hotel_page(url: &str, html: &str) -> ParsedHotel {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    let ld = hotel_structured_data(&doc);

    let title = ld_str(ld.as_ref(), "name")
        .or_else(|| select_text(&root, "[data-testid='title']"))
        .or_else(|| select_text(&root, "h1"))
        .or_else(|| select_text(&root, "h2"));
    let description =
        ld_str(ld.as_ref(), "description").or_else(|| select_text(&root, "div.hp-description p"));

    let gallery = unique_non_empty(
        ld_images(ld.as_ref())
            .into_iter()
            .map(Some)
            .chain(doc.select(&PHOTO_WRAPPER_IMG).map(|img| {
                attr_chain(&img, &["src", "data-src", "data-lazy"])
            })),
    );

    let facilities = unique_non_empty(
        ld_amenities(ld.as_ref())
            .into_iter()
            .map(Some)
            .chain(doc.select(&FACILITY).map(|el| element_text(&el))),
    );

    let (latitude, longitude) = coordinates(&doc, ld.as_ref()).unzip();

    let pricing = doc
        .select(&RATE_BLOCK)
        .next()
        .map(|block| extract_price_info(&block))
        .filter(|info| !info.is_empty());

    let record = HotelRecord {
        url: url.to_string(),
        title,
        description,
        gallery,
        facilities,
        latitude,
        longitude,
        city: city(&doc, ld.as_ref()),
        reviews_count: reviews_count(&doc),
        rating: rating(&doc, ld.as_ref()),
        pricing,
        ..HotelRecord::default()
    };

    ParsedHotel {
        record,
        rooms: parse_room_rows(&doc),
    }
}

/// First JSON-LD object (or array entry) with `"@type": "Hotel"`.
fn hotel_structured_data(doc: &Html) -> Option<Value> {
    doc.select(&LD_JSON).find_map(|script| {
        let raw: String = script.text().collect();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(Value::Array(entries)) => entries.into_iter().find(is_hotel),
            Ok(value) if is_hotel(&value) => Some(value),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unparseable ld+json block");
                None
            }
        }
    })
}

fn is_hotel(value: &Value) -> bool {
    value.get("@type").and_then(Value::as_str) == Some("Hotel")
}

fn ld_str(ld: Option<&Value>, key: &str) -> Option<String> {
    ld?.get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn ld_images(ld: Option<&Value>) -> Vec<String> {
    let Some(images) = ld.and_then(|v| v.get("image")) else {
        return Vec::new();
    };
    let entries: Vec<&Value> = match images {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(url) => Some(url.clone()),
            Value::Object(obj) => obj
                .get("url")
                .or_else(|| obj.get("contentUrl"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

fn ld_amenities(ld: Option<&Value>) -> Vec<String> {
    ld.and_then(|v| v.get("amenityFeature"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Coordinates kept as text: JSON-LD `geo`, then the `hasMap` URL's
/// `center=`, then the static map image.
fn coordinates(doc: &Html, ld: Option<&Value>) -> Option<(String, String)> {
    let geo = ld.and_then(|v| v.get("geo")).and_then(|geo| {
        let lat = scalar_text(geo.get("latitude")?)?;
        let lon = scalar_text(geo.get("longitude")?)?;
        Some((lat, lon))
    });
    if geo.is_some() {
        return geo;
    }

    let from_map_link = ld
        .and_then(|v| v.get("hasMap"))
        .and_then(Value::as_str)
        .and_then(|href| url::Url::parse(href).ok())
        .and_then(|parsed| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "center")
                .and_then(|(_, center)| {
                    let (lat, lon) = center.split_once(',')?;
                    Some((lat.trim().to_string(), lon.trim().to_string()))
                })
        });
    if from_map_link.is_some() {
        return from_map_link;
    }

    let map_src = doc
        .select(&STATIC_MAP)
        .next()
        .and_then(|img| attr_chain(&img, &["src", "data-src"]))?;
    let caps = MAP_CENTER_RE.captures(&map_src)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_country_label(value: &str) -> bool {
    COUNTRY_LABELS.contains(&value.trim().to_lowercase().as_str())
}

/// City from the search box, then JSON-LD `addressLocality`, then the
/// address line.
fn city(doc: &Html, ld: Option<&Value>) -> Option<String> {
    let from_search = doc
        .select(&SEARCH_INPUT)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::trim)
        .filter(|v| !v.is_empty() && !is_country_label(v))
        .map(str::to_string);
    if from_search.is_some() {
        return from_search;
    }

    let from_ld = ld
        .and_then(|v| v.get("address"))
        .and_then(|address| address.get("addressLocality"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    if from_ld.is_some() {
        return from_ld;
    }

    let address = select_text(
        &doc.root_element(),
        "[data-testid='address'], .hp_address_subtitle, .hp_address",
    )?;
    city_from_address(&address)
}

/// `"Old Boulevard, Batumi (Old Boulevard)"` → `Batumi`;
/// `"Sheikh Zayed Road, Dubai, UAE"` → `Dubai`.
fn city_from_address(address: &str) -> Option<String> {
    let before_paren = address.split('(').next().unwrap_or_default();
    before_paren
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .rev()
        .find(|part| !is_country_label(part) && !part.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

fn reviews_count(doc: &Html) -> Option<u32> {
    doc.select(&REVIEW_SPANS)
        .find_map(reviews_in)
        .or_else(|| doc.select(&TEXT_BLOCKS).find_map(reviews_in))
}

fn reviews_in(el: ElementRef<'_>) -> Option<u32> {
    let text = element_text(&el)?;
    let caps = REVIEWS_RE.captures(&text)?;
    caps[1]
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()
}

fn rating(doc: &Html, ld: Option<&Value>) -> Option<f64> {
    doc.select(&RATING_PRIMARY)
        .find_map(rating_in)
        .or_else(|| doc.select(&RATING_FALLBACK).find_map(rating_in))
        .or_else(|| {
            let value = ld?.get("aggregateRating")?.get("ratingValue")?;
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            parsed.and_then(valid_rating)
        })
}

/// Short numeric text such as `"9.0"`; review counts and labels are skipped.
fn rating_in(el: ElementRef<'_>) -> Option<f64> {
    let text = element_text(&el)?;
    if text.len() >= 10 || text.to_lowercase().contains("review") {
        return None;
    }
    valid_rating(text.parse().ok()?)
}

fn valid_rating(value: f64) -> Option<f64> {
    (0.0..=10.0).contains(&value).then_some(value)
}

#[cfg(test)]
#[path = "hotel_test.rs"]
mod tests;
