//! Room photo modal lifecycle.
//!
//! One resolution attempt walks
//! `Idle → Disclosing → AwaitingReady → SnapshotTaken → Closing → Done`,
//! or ends in `Failed`. Once the disclosure control has been activated the
//! modal counts as acquired, and [`with_room_modal`] sends the dismiss
//! signal on every exit path from then on, including a panic inside the
//! caller's inspection closure. If the attempt is dropped mid-await the
//! controller's `Drop` records the owed dismiss on the session, and the next
//! attempt sends it before touching the page.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use scraper::Html;

use super::GalleryFailure;
use crate::session::PageSession;

/// Marker element that appears once the room photo modal has rendered.
pub const ROOM_PHOTOS_MARKER: &str = "[data-testid='roomPagePhotos']";

/// Immutable copy of the modal's DOM subtree, taken after readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalSnapshot {
    html: String,
}

impl ModalSnapshot {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    pub(crate) fn parse(&self) -> Html {
        Html::parse_fragment(&self.html)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Idle,
    Disclosing,
    AwaitingReady,
    SnapshotTaken,
    Closing,
    Done,
    Failed,
}

/// Timing and marker for one modal attempt.
#[derive(Debug, Clone)]
pub struct ModalSettings {
    pub marker: String,
    /// Upper bound on the readiness wait.
    pub timeout: Duration,
    /// Pause after readiness so carousel slides finish rendering.
    pub settle: Duration,
}

impl Default for ModalSettings {
    fn default() -> Self {
        Self {
            marker: ROOM_PHOTOS_MARKER.to_string(),
            timeout: Duration::from_millis(5000),
            settle: Duration::from_millis(800),
        }
    }
}

impl ModalSettings {
    #[must_use]
    pub fn from_config(config: &lodgedb_core::AppConfig) -> Self {
        Self {
            marker: ROOM_PHOTOS_MARKER.to_string(),
            timeout: Duration::from_millis(config.modal_timeout_ms),
            settle: Duration::from_millis(config.modal_settle_ms),
        }
    }
}

struct ModalController<'s, S: PageSession> {
    session: &'s mut S,
    settings: &'s ModalSettings,
    state: ModalState,
    /// Set from activation until a dismiss has been sent.
    owes_dismiss: bool,
}

impl<S: PageSession> Drop for ModalController<'_, S> {
    fn drop(&mut self) {
        if self.owes_dismiss {
            tracing::warn!(state = ?self.state, "room modal abandoned while open, dismissing on next attempt");
            self.session.defer_dismiss();
        }
    }
}

impl<S: PageSession> ModalController<'_, S> {
    fn transition(&mut self, next: ModalState) {
        tracing::trace!(from = ?self.state, to = ?next, "room modal state");
        self.state = next;
    }

    fn fail(&mut self, failure: GalleryFailure) -> GalleryFailure {
        self.transition(ModalState::Failed);
        failure
    }

    /// Scrolls to and activates the control. Nothing needs closing when
    /// this fails.
    async fn disclose(&mut self, control: &S::Control) -> Result<(), GalleryFailure> {
        self.transition(ModalState::Disclosing);
        if let Err(e) = self.session.scroll_into_view(control).await {
            return Err(self.fail(GalleryFailure::ControlNotFound {
                reason: format!("scroll failed: {e}"),
            }));
        }
        self.owes_dismiss = true;
        if let Err(e) = self.session.activate(control).await {
            self.owes_dismiss = false;
            return Err(self.fail(GalleryFailure::ControlNotFound {
                reason: format!("activation failed: {e}"),
            }));
        }
        Ok(())
    }

    async fn await_snapshot(&mut self) -> Result<ModalSnapshot, GalleryFailure> {
        self.transition(ModalState::AwaitingReady);
        let settings = self.settings;
        let marker = settings.marker.as_str();
        match self.session.wait_for_marker(marker, settings.timeout).await {
            Ok(true) => {}
            Ok(false) => {
                let timeout_ms = u64::try_from(settings.timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(self.fail(GalleryFailure::ModalTimeout { timeout_ms }));
            }
            Err(e) => return Err(self.fail(GalleryFailure::Session(e))),
        }

        if !settings.settle.is_zero() {
            tokio::time::sleep(settings.settle).await;
        }

        match self.session.snapshot(marker).await {
            Ok(Some(html)) => {
                self.transition(ModalState::SnapshotTaken);
                Ok(ModalSnapshot::new(html))
            }
            Ok(None) => Err(self.fail(GalleryFailure::ExtractionEmpty)),
            Err(e) => Err(self.fail(GalleryFailure::Session(e))),
        }
    }

    /// Best-effort dismiss. A failure here is logged and swallowed.
    async fn close(&mut self) {
        let failed = self.state == ModalState::Failed;
        if !failed {
            self.transition(ModalState::Closing);
        }
        let dismissed = self.session.dismiss().await;
        self.owes_dismiss = false;
        if let Err(e) = dismissed {
            let failure = GalleryFailure::CloseFailed {
                reason: e.to_string(),
            };
            tracing::warn!(error = %failure, "room modal may still be open");
        }
        if !failed {
            self.transition(ModalState::Done);
        }
    }
}

/// Opens the room modal behind `control`, hands a snapshot of it to
/// `inspect`, and dismisses the modal before returning.
///
/// Disclosure failures return without touching the page further. Every
/// later outcome (readiness timeout, snapshot error, a panic in
/// `inspect`) still reaches the dismiss step.
///
/// # Errors
///
/// Returns the [`GalleryFailure`] that stopped the attempt. A failed
/// dismiss is never returned.
pub async fn with_room_modal<S, T, F>(
    session: &mut S,
    control: &S::Control,
    settings: &ModalSettings,
    inspect: F,
) -> Result<T, GalleryFailure>
where
    S: PageSession,
    F: FnOnce(&ModalSnapshot) -> T,
{
    send_deferred_dismiss(session).await;

    let mut controller = ModalController {
        session,
        settings,
        state: ModalState::Idle,
        owes_dismiss: false,
    };

    controller.disclose(control).await?;

    let outcome = match controller.await_snapshot().await {
        Ok(snapshot) => catch_unwind(AssertUnwindSafe(|| inspect(&snapshot))).map_err(|panic| {
            GalleryFailure::Extraction {
                reason: panic_message(panic.as_ref()),
            }
        }),
        Err(failure) => Err(failure),
    };
    if outcome.is_err() && controller.state != ModalState::Failed {
        controller.transition(ModalState::Failed);
    }

    controller.close().await;
    outcome
}

/// Dismisses a modal left open by an earlier, abandoned attempt.
pub(crate) async fn send_deferred_dismiss<S: PageSession>(session: &mut S) {
    if !session.take_deferred_dismiss() {
        return;
    }
    if let Err(e) = session.dismiss().await {
        tracing::warn!(error = %e, "could not dismiss abandoned room modal");
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "extraction panicked".to_string()
    }
}
