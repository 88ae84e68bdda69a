//! In-memory page session for exercising the gallery engine and the hotel
//! pipeline without a browser.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use crate::error::ScraperError;
use scraper::{Html, Selector};

use crate::session::{ControlLocator, PageNavigator, PageSession, SearchPage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Locate(String),
    Scroll(String),
    Activate(String),
    WaitForMarker(String),
    Snapshot(String),
    Dismiss,
    Goto(String),
    WaitForAny,
    Content,
    ScrollToBottom,
    LoadMore,
}

/// Controls are keyed by room-type id, falling back to block id.
#[derive(Debug, Default)]
pub(crate) struct FakeSession {
    pub calls: Vec<Call>,
    /// Modal HTML shown after activating the keyed control.
    pub modals: HashMap<String, String>,
    /// Controls that exist but whose modal never renders.
    pub never_ready: HashSet<String>,
    /// Controls that exist but reject activation.
    pub broken_controls: HashSet<String>,
    pub fail_dismiss: bool,
    /// `scroll_into_view` fails for every control.
    pub fail_scroll: bool,
    /// `wait_for_marker` never completes.
    pub hang_on_wait: bool,
    /// Set by `defer_dismiss`.
    pub deferred_dismiss: bool,
    /// HTML returned by `content`.
    pub page_html: String,
    /// Number of leading `goto` calls that fail with a navigation error.
    pub failing_gotos: usize,
    /// Pages that replace `page_html`, one per load-more click.
    pub result_pages: VecDeque<String>,
    /// Key of the control whose modal is currently open.
    pub open: Option<String>,
}

impl FakeSession {
    pub fn with_modal(mut self, key: &str, html: &str) -> Self {
        self.modals.insert(key.to_string(), html.to_string());
        self
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn dismiss_count(&self) -> usize {
        self.count(|c| *c == Call::Dismiss)
    }

    pub fn locate_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Locate(_)))
    }

    fn key(locator: &ControlLocator) -> String {
        locator
            .room_type_id
            .clone()
            .or_else(|| locator.block_id.clone())
            .unwrap_or_default()
    }

    fn knows(&self, key: &str) -> bool {
        self.modals.contains_key(key)
            || self.never_ready.contains(key)
            || self.broken_controls.contains(key)
    }
}

impl PageSession for FakeSession {
    type Control = String;

    async fn locate_control(
        &mut self,
        locator: &ControlLocator,
    ) -> Result<Option<String>, ScraperError> {
        let key = Self::key(locator);
        self.calls.push(Call::Locate(key.clone()));
        Ok(self.knows(&key).then_some(key))
    }

    async fn scroll_into_view(&mut self, control: &String) -> Result<(), ScraperError> {
        self.calls.push(Call::Scroll(control.clone()));
        if self.fail_scroll {
            return Err(ScraperError::Interaction {
                action: "scroll",
                reason: "element is detached".to_string(),
            });
        }
        Ok(())
    }

    async fn activate(&mut self, control: &String) -> Result<(), ScraperError> {
        self.calls.push(Call::Activate(control.clone()));
        if self.broken_controls.contains(control) {
            return Err(ScraperError::Interaction {
                action: "click",
                reason: "element is not clickable".to_string(),
            });
        }
        self.open = Some(control.clone());
        Ok(())
    }

    async fn wait_for_marker(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, ScraperError> {
        self.calls.push(Call::WaitForMarker(selector.to_string()));
        if self.hang_on_wait {
            std::future::pending::<()>().await;
        }
        Ok(self
            .open
            .as_ref()
            .is_some_and(|key| !self.never_ready.contains(key)))
    }

    async fn snapshot(&mut self, selector: &str) -> Result<Option<String>, ScraperError> {
        self.calls.push(Call::Snapshot(selector.to_string()));
        Ok(self.open.as_ref().and_then(|key| self.modals.get(key).cloned()))
    }

    async fn dismiss(&mut self) -> Result<(), ScraperError> {
        self.calls.push(Call::Dismiss);
        self.open = None;
        if self.fail_dismiss {
            return Err(ScraperError::Interaction {
                action: "escape",
                reason: "body not focusable".to_string(),
            });
        }
        Ok(())
    }

    fn defer_dismiss(&mut self) {
        self.deferred_dismiss = true;
    }

    fn take_deferred_dismiss(&mut self) -> bool {
        std::mem::take(&mut self.deferred_dismiss)
    }
}

impl PageNavigator for FakeSession {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError> {
        self.calls.push(Call::Goto(url.to_string()));
        if self.failing_gotos > 0 {
            self.failing_gotos -= 1;
            return Err(ScraperError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        Ok(())
    }

    async fn wait_for_any(
        &mut self,
        _selectors: &[&str],
        _timeout: Duration,
    ) -> Result<bool, ScraperError> {
        self.calls.push(Call::WaitForAny);
        Ok(true)
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        self.calls.push(Call::Content);
        Ok(self.page_html.clone())
    }
}

impl SearchPage for FakeSession {
    async fn scroll_to_bottom(&mut self) -> Result<(), ScraperError> {
        self.calls.push(Call::ScrollToBottom);
        Ok(())
    }

    async fn click_load_more(&mut self) -> Result<bool, ScraperError> {
        self.calls.push(Call::LoadMore);
        match self.result_pages.pop_front() {
            Some(next) => {
                self.page_html = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_matches(&mut self, selector: &str) -> Result<usize, ScraperError> {
        let Ok(selector) = Selector::parse(selector) else {
            return Ok(0);
        };
        Ok(Html::parse_document(&self.page_html)
            .select(&selector)
            .count())
    }
}

/// Modal markup with one carousel slide and one thumbnail per id.
pub(crate) fn modal_html(ids: &[u32]) -> String {
    let mut body = String::new();
    for id in ids {
        body.push_str(&format!(
            r#"<div class="slide" style="background-image: url(&quot;https://cf.bstatic.com/xdata/images/hotel/max1024x768/{id}.jpg&quot;)"></div>"#
        ));
    }
    for id in ids {
        body.push_str(&format!(
            r#"<img src="https://cf.bstatic.com/xdata/images/hotel/square60/{id}.jpg">"#
        ));
    }
    format!(r#"<div data-testid="roomPagePhotos">{body}</div>"#)
}

pub(crate) fn image_url(id: u32) -> String {
    format!("https://cf.bstatic.com/xdata/images/hotel/max1024x768/{id}.jpg")
}
