//! Price text parsing.
//!
//! Displayed prices look like `"US$1,234"`, `"AED 2.310,50"` or
//! `"€ 99"`. The currency label is everything before the first digit run;
//! the amount's decimal separator is inferred from the separators present.

use std::str::FromStr;
use std::sync::LazyLock;

use lodgedb_core::PriceInfo;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Selector};

use crate::parse_helpers::{element_text, normalize_text, select_text};

static PRICE_COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<currency>[^\d\s]+)\s*(?P<amount>[\d.,]+)").expect("valid price regex")
});
static ORIGINAL_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)original price\s+(?P<value>\D*\d[\d.,]*)").expect("valid regex")
});
static CURRENT_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)current price\s+(?P<value>\D*\d[\d.,]*)").expect("valid regex")
});
static DIV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("valid div selector"));

/// Page-level rate block on hotel pages.
pub const RATE_BLOCK_SELECTOR: &str = "[data-testid='availability-rate-information']";

/// Parses an amount with inferred separators: `"1,234.50"`, `"1.234,50"`,
/// `"2,310"` and `"12,5"` all work. Returns `None` for text without digits.
#[must_use]
pub fn parse_amount(amount_text: &str) -> Option<Decimal> {
    let cleaned: String = amount_text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    let (decimal_sep, thousands_sep) = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) if comma > dot => (Some(','), Some('.')),
        (Some(_), Some(_)) => (Some('.'), Some(',')),
        (Some(pos), None) => lone_separator(&cleaned, pos, ','),
        (None, Some(pos)) => lone_separator(&cleaned, pos, '.'),
        (None, None) => (None, None),
    };

    let mut normalized: String = cleaned
        .chars()
        .filter(|c| Some(*c) != thousands_sep)
        .collect();
    match decimal_sep {
        Some(',') => normalized = normalized.replace(',', "."),
        Some(_) => {}
        None => normalized.retain(|c| c != ',' && c != '.'),
    }

    Decimal::from_str(&normalized).ok()
}

/// A single kind of separator is a decimal point only when followed by one
/// or two digits at the end of the text.
fn lone_separator(cleaned: &str, pos: usize, sep: char) -> (Option<char>, Option<char>) {
    let fractional = &cleaned[pos + sep.len_utf8()..];
    let is_decimal = !fractional.is_empty()
        && fractional.len() <= 2
        && fractional.chars().all(|c| c.is_ascii_digit());
    if is_decimal {
        (Some(sep), None)
    } else {
        (None, Some(sep))
    }
}

/// Splits `"US$1,234.50"` into `(Some("US$"), Some("1,234.50"), Some(1234.50))`.
///
/// Text without a currency-then-number shape comes back as
/// `(None, Some(text), None)`.
#[must_use]
pub fn split_price_components(text: &str) -> (Option<String>, Option<String>, Option<Decimal>) {
    let cleaned = text.replace('\u{a0}', " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return (None, None, None);
    }

    let Some(caps) = PRICE_COMPONENT_RE.captures(cleaned) else {
        return (None, Some(cleaned.to_string()), None);
    };

    let currency = caps
        .name("currency")
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());
    let amount_text = caps
        .name("amount")
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());
    let amount = amount_text.as_deref().and_then(parse_amount);
    (currency, amount_text, amount)
}

/// Parses a rate block (page-level or search-card) into [`PriceInfo`].
#[must_use]
pub fn extract_price_info(container: &ElementRef<'_>) -> PriceInfo {
    let mut info = PriceInfo {
        stay_summary: select_text(container, "[data-testid='price-for-x-nights']"),
        taxes_and_charges: select_text(container, "[data-testid='taxes-and-charges']"),
        ..PriceInfo::default()
    };

    if let Some(display) = select_text(container, "[data-testid='price-and-discounted-price']") {
        let (currency, amount_text, amount) = split_price_components(&display);
        info.current_price_display = Some(display);
        info.current_price_currency = currency;
        info.current_price_amount_text = amount_text;
        info.current_price_amount = amount;
    }

    let Some(breakdown) = breakdown_text(container) else {
        return info;
    };

    if let Some(display) = capture_price(&ORIGINAL_PRICE_RE, &breakdown) {
        let (currency, amount_text, amount) = split_price_components(&display);
        info.original_price_display = Some(display);
        info.original_price_currency = currency;
        info.original_price_amount_text = amount_text;
        info.original_price_amount = amount;
    }

    if info.current_price_display.is_none() {
        if let Some(display) = capture_price(&CURRENT_PRICE_RE, &breakdown) {
            let (currency, amount_text, amount) = split_price_components(&display);
            info.current_price_display = Some(display);
            info.current_price_currency = currency;
            info.current_price_amount_text = amount_text;
            info.current_price_amount = amount;
        }
    }

    info.price_breakdown_text = Some(breakdown);
    info
}

/// The screen-reader sentence "Original price X. Current price Y." that
/// sits somewhere inside the rate block.
fn breakdown_text(container: &ElementRef<'_>) -> Option<String> {
    container
        .select(&DIV_SELECTOR)
        .filter_map(|div| element_text(&div))
        .filter(|text| {
            let lower = text.to_lowercase();
            lower.contains("original price") || lower.contains("current price")
        })
        .min_by_key(String::len)
}

fn capture_price(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.name("value"))
        .and_then(|m| normalize_text(m.as_str().trim_end_matches(['.', ','])))
}
