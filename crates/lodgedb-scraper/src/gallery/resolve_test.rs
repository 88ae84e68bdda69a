use std::time::Duration;

use super::*;
use crate::testing::{image_url, modal_html, Call, FakeSession};

fn settings() -> ModalSettings {
    ModalSettings {
        timeout: Duration::from_millis(50),
        settle: Duration::ZERO,
        ..ModalSettings::default()
    }
}

fn locator(room_type_id: &str) -> ControlLocator {
    ControlLocator::new(Some(room_type_id.to_string()), None).unwrap()
}

#[tokio::test]
async fn resolves_gallery_and_closes_modal() {
    let mut session = FakeSession::default().with_modal("101", &modal_html(&[1, 2]));
    let gallery = resolve_room_gallery(&mut session, &locator("101"), &settings()).await;

    assert_eq!(gallery.as_slice(), &[image_url(1), image_url(2)]);
    assert_eq!(session.dismiss_count(), 1);
    assert_eq!(session.calls.last(), Some(&Call::Dismiss));
}

#[tokio::test]
async fn background_images_come_before_thumbnails() {
    let html = format!(
        r#"<div data-testid="roomPagePhotos">
             <img src="https://cf.bstatic.com/xdata/images/hotel/square60/3.jpg">
             <div style="background-image: url('{}')"></div>
             <div style="background-image: url('{}')"></div>
           </div>"#,
        image_url(2),
        image_url(3),
    );
    let mut session = FakeSession::default().with_modal("101", &html);
    let gallery = resolve_room_gallery(&mut session, &locator("101"), &settings()).await;

    assert_eq!(gallery.as_slice(), &[image_url(2), image_url(3)]);
}

#[tokio::test]
async fn missing_control_yields_empty_gallery_without_touching_modal() {
    let mut session = FakeSession::default();
    let gallery = resolve_room_gallery(&mut session, &locator("404"), &settings()).await;

    assert!(gallery.is_empty());
    assert_eq!(session.calls, vec![Call::Locate("404".to_string())]);
}

#[tokio::test]
async fn activation_failure_does_not_dismiss() {
    let mut session = FakeSession::default();
    session.broken_controls.insert("101".to_string());
    let gallery = resolve_room_gallery(&mut session, &locator("101"), &settings()).await;

    assert!(gallery.is_empty());
    assert_eq!(session.dismiss_count(), 0);
}

#[tokio::test]
async fn readiness_timeout_still_dismisses() {
    let mut session = FakeSession::default();
    session.never_ready.insert("101".to_string());
    let gallery = resolve_room_gallery(&mut session, &locator("101"), &settings()).await;

    assert!(gallery.is_empty());
    assert_eq!(session.dismiss_count(), 1);
    assert_eq!(session.count(|c| matches!(c, Call::Snapshot(_))), 0);
}

#[tokio::test]
async fn modal_without_usable_images_is_empty_and_closed() {
    let html = r#"<div data-testid="roomPagePhotos"><img src="https://www.booking.com/static/img/spacer.gif"></div>"#;
    let mut session = FakeSession::default().with_modal("101", html);
    let gallery = resolve_room_gallery(&mut session, &locator("101"), &settings()).await;

    assert!(gallery.is_empty());
    assert_eq!(session.dismiss_count(), 1);
}

#[tokio::test]
async fn close_failure_keeps_captured_gallery() {
    let mut session = FakeSession::default().with_modal("101", &modal_html(&[5]));
    session.fail_dismiss = true;
    let gallery = resolve_room_gallery(&mut session, &locator("101"), &settings()).await;

    assert_eq!(gallery.as_slice(), &[image_url(5)]);
    assert_eq!(session.dismiss_count(), 1);
}

#[tokio::test]
async fn panic_during_inspection_still_dismisses() {
    let mut session = FakeSession::default().with_modal("101", &modal_html(&[1]));
    let control = "101".to_string();
    let result: Result<(), GalleryFailure> =
        with_room_modal(&mut session, &control, &settings(), |_| {
            panic!("selector engine exploded")
        })
        .await;

    match result {
        Err(GalleryFailure::Extraction { reason }) => {
            assert!(reason.contains("selector engine exploded"));
        }
        other => panic!("expected extraction failure, got {other:?}"),
    }
    assert_eq!(session.dismiss_count(), 1);
}

#[tokio::test]
async fn sequential_rooms_each_get_their_own_gallery() {
    let mut session = FakeSession::default()
        .with_modal("101", &modal_html(&[1, 2]))
        .with_modal("102", &modal_html(&[2, 3]));
    let first = resolve_room_gallery(&mut session, &locator("101"), &settings()).await;
    let second = resolve_room_gallery(&mut session, &locator("102"), &settings()).await;

    assert_eq!(first.as_slice(), &[image_url(1), image_url(2)]);
    assert_eq!(second.as_slice(), &[image_url(2), image_url(3)]);
    assert_eq!(session.dismiss_count(), 2);
}

#[tokio::test]
async fn scroll_failure_is_empty_and_never_dismisses() {
    let mut session = FakeSession::default().with_modal("101", &modal_html(&[1]));
    session.fail_scroll = true;
    let gallery = resolve_room_gallery(&mut session, &locator("101"), &settings()).await;

    assert!(gallery.is_empty());
    assert_eq!(session.dismiss_count(), 0);
    assert_eq!(session.count(|c| matches!(c, Call::Activate(_))), 0);
    assert!(!session.deferred_dismiss);
}

#[tokio::test]
async fn abandoned_attempt_is_dismissed_before_next_room() {
    let mut session = FakeSession::default()
        .with_modal("101", &modal_html(&[1]))
        .with_modal("202", &modal_html(&[2]));
    session.hang_on_wait = true;

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        resolve_room_gallery(&mut session, &locator("101"), &settings()),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(session.dismiss_count(), 0);
    assert!(session.deferred_dismiss);

    session.hang_on_wait = false;
    session.calls.clear();
    let gallery = resolve_room_gallery(&mut session, &locator("202"), &settings()).await;

    assert_eq!(gallery.as_slice(), &[image_url(2)]);
    assert_eq!(session.calls.first(), Some(&Call::Dismiss));
    assert_eq!(session.calls[1], Call::Locate("202".to_string()));
    assert_eq!(session.dismiss_count(), 2);
    assert!(!session.deferred_dismiss);
}
