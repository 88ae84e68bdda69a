//! Chromium-backed [`PageSession`] built on `chromiumoxide`.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use lodgedb_core::AppConfig;
use tokio::task::JoinHandle;

use crate::error::ScraperError;
use crate::gallery::normalize::SITE_ORIGIN;
use crate::session::{ControlLocator, PageNavigator, PageSession, SearchPage};

const HIDE_WEBDRIVER_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight); true";

/// Clicks the first button whose text mentions "load more results".
const CLICK_LOAD_MORE_JS: &str = r"(() => {
  const button = Array.from(document.querySelectorAll('button')).find(
    (b) => (b.innerText || '').trim().toLowerCase().includes('load more results')
  );
  if (!button) { return false; }
  button.click();
  return true;
})()";

const SCRIPTED_CLICK_JS: &str = "function() { this.click(); }";

const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub user_agent: String,
    pub page_load_timeout: Duration,
    pub window_size: (u32, u32),
}

impl BrowserOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
            window_size: (1920, 1080),
        }
    }

    /// Command-line switches passed to Chromium.
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-infobars".to_string(),
            "--no-first-run".to_string(),
            format!("--window-size={},{}", self.window_size.0, self.window_size.1),
        ];
        if !self.user_agent.trim().is_empty() {
            args.push(format!("--user-agent={}", self.user_agent.trim()));
        }
        args
    }
}

/// One browser with one working tab.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    page_load_timeout: Duration,
    dismiss_owed: bool,
}

impl BrowserSession {
    /// Starts Chromium and opens a blank tab with `navigator.webdriver`
    /// hidden on every document.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::BrowserConfig`] if the configuration is
    /// rejected, or [`ScraperError::Browser`] if Chromium fails to start.
    pub async fn launch(opts: &BrowserOptions) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .window_size(opts.window_size.0, opts.window_size.1)
            .args(opts.launch_args());
        builder = if opts.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        let config = builder.build().map_err(ScraperError::BrowserConfig)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler event error");
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(HIDE_WEBDRIVER_JS))
            .await?;

        tracing::info!(headless = opts.headless, "browser launched");
        Ok(Self {
            browser,
            page,
            handler_task,
            page_load_timeout: opts.page_load_timeout,
            dismiss_owed: false,
        })
    }

    /// Sets the display-currency cookies and loads the home page once so
    /// the site picks them up.
    ///
    /// # Errors
    ///
    /// Returns browser or navigation errors.
    pub async fn set_currency(&mut self, currency: &str) -> Result<(), ScraperError> {
        let cookies = ["currency", "b_selected_currency"]
            .into_iter()
            .map(|name| {
                let mut cookie = CookieParam::new(name, currency);
                cookie.domain = Some(".booking.com".to_string());
                cookie.path = Some("/".to_string());
                cookie
            })
            .collect::<Vec<_>>();
        self.page.set_cookies(cookies).await?;

        let url = format!("{SITE_ORIGIN}/index.html?selected_currency={currency}");
        self.goto(&url).await?;
        tracing::info!(currency, "display currency set");
        Ok(())
    }

    /// Closes the browser and stops the event handler.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "browser did not close cleanly");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "waiting for browser exit failed");
        }
        self.handler_task.abort();
    }

    async fn first_match(&self, selector: &str) -> Result<Option<Element>, ScraperError> {
        Ok(self.page.find_elements(selector).await?.into_iter().next())
    }

    async fn evaluate_bool(&self, js: &str, action: &'static str) -> Result<bool, ScraperError> {
        self.page
            .evaluate(js)
            .await?
            .into_value::<bool>()
            .map_err(|e| ScraperError::Interaction {
                action,
                reason: e.to_string(),
            })
    }
}

impl PageSession for BrowserSession {
    type Control = Element;

    async fn locate_control(
        &mut self,
        locator: &ControlLocator,
    ) -> Result<Option<Element>, ScraperError> {
        for selector in locator.selectors() {
            match self.first_match(&selector).await {
                Ok(Some(element)) => return Ok(Some(element)),
                Ok(None) => {}
                // `:has()` is not supported by every Chromium build
                Err(e) => tracing::debug!(selector = %selector, error = %e, "selector lookup failed"),
            }
        }
        Ok(None)
    }

    async fn scroll_into_view(&mut self, control: &Element) -> Result<(), ScraperError> {
        control.scroll_into_view().await?;
        Ok(())
    }

    async fn activate(&mut self, control: &Element) -> Result<(), ScraperError> {
        let Err(click_err) = control.click().await else {
            return Ok(());
        };
        tracing::debug!(error = %click_err, "pointer click failed, using scripted click");
        control
            .call_js_fn(SCRIPTED_CLICK_JS, false)
            .await
            .map(|_| ())
            .map_err(|e| ScraperError::Interaction {
                action: "click",
                reason: format!("{click_err}; scripted click: {e}"),
            })
    }

    async fn wait_for_marker(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.first_match(selector).await?.is_some() {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(MARKER_POLL_INTERVAL).await;
        }
    }

    async fn snapshot(&mut self, selector: &str) -> Result<Option<String>, ScraperError> {
        match self.first_match(selector).await? {
            Some(element) => Ok(element.outer_html().await?),
            None => Ok(None),
        }
    }

    async fn dismiss(&mut self) -> Result<(), ScraperError> {
        let body = self.page.find_element("body").await?;
        body.press_key("Escape").await?;
        Ok(())
    }

    fn defer_dismiss(&mut self) {
        self.dismiss_owed = true;
    }

    fn take_deferred_dismiss(&mut self) -> bool {
        std::mem::take(&mut self.dismiss_owed)
    }
}

impl PageNavigator for BrowserSession {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError> {
        let timeout_secs = self.page_load_timeout.as_secs();
        match tokio::time::timeout(self.page_load_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ScraperError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ScraperError::PageLoadTimeout {
                url: url.to_string(),
                timeout_secs,
            }),
        }
    }

    async fn wait_for_any(
        &mut self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<bool, ScraperError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            for selector in selectors {
                if self.first_match(selector).await?.is_some() {
                    return Ok(true);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(MARKER_POLL_INTERVAL).await;
        }
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        Ok(self.page.content().await?)
    }
}

impl SearchPage for BrowserSession {
    async fn scroll_to_bottom(&mut self) -> Result<(), ScraperError> {
        self.page.evaluate(SCROLL_TO_BOTTOM_JS).await?;
        Ok(())
    }

    async fn click_load_more(&mut self) -> Result<bool, ScraperError> {
        self.evaluate_bool(CLICK_LOAD_MORE_JS, "load more").await
    }

    async fn count_matches(&mut self, selector: &str) -> Result<usize, ScraperError> {
        Ok(self.page.find_elements(selector).await?.len())
    }
}
