//! Image URL verification for a saved scrape run.

use std::path::Path;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use lodgedb_core::HotelRecord;
use reqwest::StatusCode;

/// One image URL to check, labelled with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageTarget {
    pub kind: &'static str,
    pub label: String,
    pub url: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct VerifyTotals {
    pub ok: usize,
    pub bad: usize,
}

/// Hotel gallery images first, then each room's images.
pub(crate) fn image_targets(hotels: &[HotelRecord]) -> Vec<ImageTarget> {
    let mut targets = Vec::new();
    for hotel in hotels {
        let hotel_label = hotel.title.clone().unwrap_or_else(|| hotel.url.clone());
        targets.extend(hotel.gallery.iter().map(|url| ImageTarget {
            kind: "hotel",
            label: hotel_label.clone(),
            url: url.clone(),
        }));
        for room in &hotel.rooms {
            targets.extend(room.gallery.iter().map(|url| ImageTarget {
                kind: "room",
                label: format!("{hotel_label} / {}", room.name),
                url: url.clone(),
            }));
        }
    }
    targets
}

/// HEAD-checks every target. Anything but `200 OK` counts as bad and is
/// logged.
pub(crate) async fn verify_urls(
    client: &reqwest::Client,
    targets: Vec<ImageTarget>,
    concurrency: usize,
) -> VerifyTotals {
    let checks = stream::iter(targets.into_iter().map(|target| {
        let client = client.clone();
        async move {
            let result = client.head(&target.url).send().await;
            (target, result)
        }
    }))
    .buffer_unordered(concurrency.max(1))
    .collect::<Vec<_>>()
    .await;

    let mut totals = VerifyTotals::default();
    for (target, result) in checks {
        match result {
            Ok(resp) if resp.status() == StatusCode::OK => totals.ok += 1,
            Ok(resp) => {
                totals.bad += 1;
                tracing::warn!(
                    image_kind = target.kind,
                    label = %target.label,
                    status = resp.status().as_u16(),
                    url = %target.url,
                    "image URL verification failed"
                );
            }
            Err(e) => {
                totals.bad += 1;
                tracing::warn!(
                    image_kind = target.kind,
                    label = %target.label,
                    error = %e,
                    url = %target.url,
                    "image URL verification failed"
                );
            }
        }
    }
    totals
}

/// Warns for each hotel whose room images also appear in its hotel gallery
/// and returns how many hotels were flagged.
pub(crate) fn report_overlap(hotels: &[HotelRecord]) -> usize {
    let mut flagged = 0;
    for hotel in hotels {
        let overlap = hotel.room_gallery_overlap();
        if !overlap.is_empty() {
            flagged += 1;
            tracing::warn!(
                url = %hotel.url,
                overlapping = overlap.len(),
                "room images also appear in the hotel gallery"
            );
        }
    }
    flagged
}

/// Verify every image URL in a JSON output file and report rooms whose
/// images also appear in the hotel gallery.
pub(crate) async fn run_verify_images(
    input: &Path,
    concurrency: usize,
    user_agent: &str,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let hotels: Vec<HotelRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", input.display()))?;

    report_overlap(&hotels);

    let targets = image_targets(&hotels);
    if targets.is_empty() {
        println!("no image URLs found to verify");
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(12))
        .user_agent(user_agent)
        .build()?;

    let totals = verify_urls(&client, targets, concurrency).await;
    println!("verified image URLs: {} OK, {} bad", totals.ok, totals.bad);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodgedb_core::RoomRecord;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hotel() -> HotelRecord {
        HotelRecord {
            url: "https://www.booking.com/hotel/ae/harbour.html".to_string(),
            title: Some("Harbour Hotel".to_string()),
            gallery: vec!["https://cf.bstatic.com/h1.jpg".to_string()],
            rooms: vec![RoomRecord {
                name: "Double Room".to_string(),
                gallery: vec![
                    "https://cf.bstatic.com/r1.jpg".to_string(),
                    "https://cf.bstatic.com/r2.jpg".to_string(),
                ],
                ..RoomRecord::default()
            }],
            ..HotelRecord::default()
        }
    }

    #[test]
    fn targets_cover_hotel_then_room_images() {
        let targets = image_targets(&[hotel()]);
        let kinds: Vec<&str> = targets.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec!["hotel", "room", "room"]);
        assert_eq!(targets[1].label, "Harbour Hotel / Double Room");
        assert_eq!(targets[2].url, "https://cf.bstatic.com/r2.jpg");
    }

    #[test]
    fn untitled_hotel_is_labelled_by_url() {
        let mut untitled = hotel();
        untitled.title = None;
        let targets = image_targets(&[untitled]);
        assert_eq!(targets[0].label, "https://www.booking.com/hotel/ae/harbour.html");
    }

    #[test]
    fn overlap_report_counts_only_hotels_sharing_images() {
        let clean = hotel();
        let mut shared = hotel();
        shared.rooms[0].gallery.push("https://cf.bstatic.com/h1.jpg".to_string());

        assert_eq!(report_overlap(&[clean.clone()]), 0);
        assert_eq!(report_overlap(&[clean, shared]), 1);
    }

    #[tokio::test]
    async fn counts_ok_and_bad_responses() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok.jpg"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let targets = ["ok.jpg", "gone.jpg", "ok.jpg"]
            .iter()
            .map(|name| ImageTarget {
                kind: "room",
                label: "Harbour Hotel / Double Room".to_string(),
                url: format!("{}/{name}", server.uri()),
            })
            .collect();

        let totals = verify_urls(&reqwest::Client::new(), targets, 2).await;
        assert_eq!(totals, VerifyTotals { ok: 2, bad: 1 });
    }
}
