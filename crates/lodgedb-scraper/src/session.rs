//! The page-session seam between the gallery engine and a live browser.
//!
//! [`PageSession`] carries only the primitives the gallery engine needs, so
//! the close guarantee and fail-closed behavior can be exercised against an
//! in-memory fake. [`PageNavigator`] adds the navigation plumbing the
//! hotel pipeline uses on top of it.

use std::time::Duration;

use crate::error::ScraperError;

/// Finds a room's disclosure control (the room-name link) on the live page.
///
/// The room-type id is the stable identifier; the row's block id is the
/// fallback when the id lookup finds nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlLocator {
    pub room_type_id: Option<String>,
    pub block_id: Option<String>,
}

impl ControlLocator {
    /// Returns `None` when neither identifier is present.
    #[must_use]
    pub fn new(room_type_id: Option<String>, block_id: Option<String>) -> Option<Self> {
        let room_type_id = room_type_id.filter(|s| !s.trim().is_empty());
        let block_id = block_id.filter(|s| !s.trim().is_empty());
        if room_type_id.is_none() && block_id.is_none() {
            return None;
        }
        Some(Self {
            room_type_id,
            block_id,
        })
    }

    /// CSS selectors to try in order; the first one that matches wins.
    #[must_use]
    pub fn selectors(&self) -> Vec<String> {
        let mut selectors = Vec::with_capacity(4);
        if let Some(id) = &self.room_type_id {
            let id = css_string(id);
            selectors.push(format!("a.hprt-roomtype-link[id=\"{id}\"]"));
            selectors.push(format!("[id=\"{id}\"] a.hprt-roomtype-link"));
            selectors.push(format!(
                ".hprt-roomtype-block:has([id=\"{id}\"]) a.hprt-roomtype-link"
            ));
        }
        if let Some(block) = &self.block_id {
            let block = css_string(block);
            selectors.push(format!(
                "tr[data-block-id=\"{block}\"] a.hprt-roomtype-link"
            ));
        }
        selectors
    }

    /// Short label for log lines.
    #[must_use]
    pub fn describe(&self) -> String {
        match (&self.room_type_id, &self.block_id) {
            (Some(id), _) => format!("room type {id}"),
            (None, Some(block)) => format!("block {block}"),
            (None, None) => "unidentified room".to_string(),
        }
    }
}

/// Escapes a value for use inside a double-quoted CSS attribute selector.
fn css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Exclusive handle on one rendered page, used by one gallery resolution
/// at a time.
#[allow(async_fn_in_trait)]
pub trait PageSession {
    /// Handle to a located disclosure control.
    type Control;

    /// Returns `Ok(None)` when no selector from `locator` matches.
    async fn locate_control(
        &mut self,
        locator: &ControlLocator,
    ) -> Result<Option<Self::Control>, ScraperError>;

    async fn scroll_into_view(&mut self, control: &Self::Control) -> Result<(), ScraperError>;

    /// Pointer activation of the control.
    async fn activate(&mut self, control: &Self::Control) -> Result<(), ScraperError>;

    /// Waits up to `timeout` for `selector` to match; `Ok(false)` on timeout.
    async fn wait_for_marker(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError>;

    /// Outer HTML of the first element matching `selector`.
    async fn snapshot(&mut self, selector: &str) -> Result<Option<String>, ScraperError>;

    /// Sends an escape/cancel signal to the page.
    async fn dismiss(&mut self) -> Result<(), ScraperError>;

    /// Records that a modal was abandoned while open, e.g. when the
    /// resolving future was dropped mid-await.
    fn defer_dismiss(&mut self) {}

    /// Returns and clears the flag set by [`PageSession::defer_dismiss`].
    fn take_deferred_dismiss(&mut self) -> bool {
        false
    }
}

/// Navigation primitives used by the hotel pipeline.
#[allow(async_fn_in_trait)]
pub trait PageNavigator: PageSession {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError>;

    /// Waits up to `timeout` for any of `selectors` to match.
    async fn wait_for_any(
        &mut self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<bool, ScraperError>;

    /// Full HTML of the current page.
    async fn content(&mut self) -> Result<String, ScraperError>;
}

/// Search-results plumbing: lazy loading by scrolling and the
/// "load more results" button.
#[allow(async_fn_in_trait)]
pub trait SearchPage: PageNavigator {
    async fn scroll_to_bottom(&mut self) -> Result<(), ScraperError>;

    /// Clicks the load-more button; `Ok(false)` when none is present.
    async fn click_load_more(&mut self) -> Result<bool, ScraperError>;

    /// Number of elements currently matching `selector`.
    async fn count_matches(&mut self, selector: &str) -> Result<usize, ScraperError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_requires_an_identifier() {
        assert!(ControlLocator::new(None, None).is_none());
        assert!(ControlLocator::new(Some("  ".to_string()), Some(String::new())).is_none());
        assert!(ControlLocator::new(None, Some("123_4".to_string())).is_some());
    }

    #[test]
    fn selectors_try_room_type_id_before_block_id() {
        let locator =
            ControlLocator::new(Some("12345601".to_string()), Some("12345601_9_2_0".to_string()))
                .unwrap();
        assert_eq!(
            locator.selectors(),
            vec![
                "a.hprt-roomtype-link[id=\"12345601\"]".to_string(),
                "[id=\"12345601\"] a.hprt-roomtype-link".to_string(),
                ".hprt-roomtype-block:has([id=\"12345601\"]) a.hprt-roomtype-link".to_string(),
                "tr[data-block-id=\"12345601_9_2_0\"] a.hprt-roomtype-link".to_string(),
            ]
        );
    }

    #[test]
    fn selectors_escape_quotes() {
        let locator = ControlLocator::new(Some("a\"b".to_string()), None).unwrap();
        assert_eq!(locator.selectors()[0], "a.hprt-roomtype-link[id=\"a\\\"b\"]");
    }

    #[test]
    fn describe_prefers_room_type() {
        let both = ControlLocator::new(Some("7".to_string()), Some("7_1".to_string())).unwrap();
        assert_eq!(both.describe(), "room type 7");
        let block = ControlLocator::new(None, Some("7_1".to_string())).unwrap();
        assert_eq!(block.describe(), "block 7_1");
    }
}
