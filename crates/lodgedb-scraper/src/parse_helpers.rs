//! Small DOM and text primitives shared by the page parsers.
//!
//! Selectors passed as `&str` are parsed on each call; an invalid selector
//! behaves like one that matches nothing.

use std::collections::HashSet;

use scraper::{ElementRef, Selector};

/// Collapses whitespace runs (including non-breaking spaces) to a single
/// space and trims. Returns `None` when nothing is left.
pub(crate) fn normalize_text(value: &str) -> Option<String> {
    let cleaned = value
        .split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Drops `None`s and repeats, keeping first-seen order.
pub(crate) fn unique_non_empty<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .flatten()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Normalized text content of an element.
pub(crate) fn element_text(el: &ElementRef<'_>) -> Option<String> {
    normalize_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first element under `root` matching `css`.
pub(crate) fn select_text(root: &ElementRef<'_>, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    root.select(&selector).next().and_then(|el| element_text(&el))
}

/// Deduplicated text of every element under `root` matching `css`.
pub(crate) fn select_all_text(root: &ElementRef<'_>, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };
    unique_non_empty(root.select(&selector).map(|el| element_text(&el)))
}

/// First non-blank value among `attrs` on `el`.
pub(crate) fn attr_chain(el: &ElementRef<'_>, attrs: &[&str]) -> Option<String> {
    attrs
        .iter()
        .filter_map(|name| el.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
