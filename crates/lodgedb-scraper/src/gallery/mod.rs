//! Room gallery resolution.
//!
//! For one room row: locate the room-name link, open its photo modal,
//! snapshot the modal, run the three image extractors over the snapshot,
//! merge their output, and close the modal again. Every failure degrades
//! to an empty [`Gallery`] and a log line, so one bad room never stops the
//! rooms after it.

pub mod extract;
pub mod merge;
pub mod modal;
pub mod normalize;

use thiserror::Error;

use crate::error::ScraperError;
use crate::session::{ControlLocator, PageSession};
use extract::collect_candidates;
use merge::merge_candidates;
pub use modal::{with_room_modal, ModalSettings, ModalSnapshot, ModalState, ROOM_PHOTOS_MARKER};

/// Ordered, duplicate-free list of full-resolution CDN image URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gallery(Vec<String>);

impl Gallery {
    /// Callers guarantee the URLs are normalized, on the CDN, and unique.
    pub(crate) fn from_validated(urls: Vec<String>) -> Self {
        Self(urls)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Gallery {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Why a room ended up without a gallery.
#[derive(Debug, Error)]
pub enum GalleryFailure {
    #[error("disclosure control not found: {reason}")]
    ControlNotFound { reason: String },

    #[error("room modal did not become ready within {timeout_ms}ms")]
    ModalTimeout { timeout_ms: u64 },

    #[error("room modal opened but no image candidates survived")]
    ExtractionEmpty,

    #[error("room modal could not be dismissed: {reason}")]
    CloseFailed { reason: String },

    #[error("image extraction aborted: {reason}")]
    Extraction { reason: String },

    #[error("page session error: {0}")]
    Session(#[from] ScraperError),
}

/// Resolves the photo gallery of the room behind `locator`.
///
/// Never fails: a missing control, a modal that never renders, or a modal
/// without usable images all yield an empty gallery.
pub async fn resolve_room_gallery<S: PageSession>(
    session: &mut S,
    locator: &ControlLocator,
    settings: &ModalSettings,
) -> Gallery {
    match try_resolve(session, locator, settings).await {
        Ok(gallery) => {
            tracing::debug!(room = %locator.describe(), images = gallery.len(), "resolved room gallery");
            gallery
        }
        Err(failure) => {
            log_failure(locator, &failure);
            Gallery::default()
        }
    }
}

async fn try_resolve<S: PageSession>(
    session: &mut S,
    locator: &ControlLocator,
    settings: &ModalSettings,
) -> Result<Gallery, GalleryFailure> {
    modal::send_deferred_dismiss(session).await;

    let control = session
        .locate_control(locator)
        .await
        .map_err(|e| GalleryFailure::ControlNotFound {
            reason: e.to_string(),
        })?
        .ok_or_else(|| GalleryFailure::ControlNotFound {
            reason: format!("no element matched {}", locator.describe()),
        })?;

    let gallery = with_room_modal(session, &control, settings, |snapshot| {
        merge_candidates(collect_candidates(snapshot))
    })
    .await?;

    if gallery.is_empty() {
        return Err(GalleryFailure::ExtractionEmpty);
    }
    Ok(gallery)
}

fn log_failure(locator: &ControlLocator, failure: &GalleryFailure) {
    let room = locator.describe();
    match failure {
        GalleryFailure::ControlNotFound { .. } | GalleryFailure::ExtractionEmpty => {
            tracing::debug!(room = %room, reason = %failure, "no gallery for room");
        }
        GalleryFailure::ModalTimeout { .. }
        | GalleryFailure::CloseFailed { .. }
        | GalleryFailure::Extraction { .. }
        | GalleryFailure::Session(_) => {
            tracing::warn!(room = %room, reason = %failure, "room gallery resolution failed");
        }
    }
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
