//! Room rows of the hotel availability table and the assembler that turns
//! them into [`RoomRecord`]s with galleries.

use std::sync::LazyLock;

use lodgedb_core::{AvailabilityOption, RoomRecord, RoomRetention};
use scraper::{ElementRef, Html, Selector};

use crate::gallery::{resolve_room_gallery, Gallery, ModalSettings};
use crate::parse_helpers::{element_text, normalize_text, select_all_text, select_text};
use crate::price::split_price_components;
use crate::session::{ControlLocator, PageSession};

/// One bookable row of the availability table.
pub const ROOM_ROW_SELECTOR: &str = "tbody tr[data-block-id]";

static ROOM_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(ROOM_ROW_SELECTOR).expect("valid room row selector"));
static NAME_ICON_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".hprt-roomtype-link .hprt-roomtype-icon-link").expect("valid selector")
});
static NAME_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".hprt-roomtype-link").expect("valid selector"));
static OCCUPANCY_ICON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".hprt-table-cell-occupancy .bicon-occupancy").expect("valid selector")
});
static AVAILABILITY_OPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select.hprt-nos-select option").expect("valid selector"));

/// Room data read from one row, plus where to find its gallery control on
/// the live page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomRow {
    pub record: RoomRecord,
    /// Present only for rows that carry the room-name link. Rate-package
    /// variants of an already listed room type have none.
    pub control: Option<ControlLocator>,
}

impl RoomRow {
    fn name(&self) -> Option<&str> {
        Some(self.record.name.as_str()).filter(|name| !name.trim().is_empty())
    }
}

/// Parses every room row of a hotel page, in page order.
#[must_use]
pub fn parse_room_rows(doc: &Html) -> Vec<RoomRow> {
    doc.select(&ROOM_ROW).map(|row| parse_room_row(&row)).collect()
}

fn parse_room_row(row: &ElementRef<'_>) -> RoomRow {
    let attrs = row.value();
    let block_id = attrs.attr("data-block-id").map(str::to_string);
    let rounded_price = attrs
        .attr("data-hotel-rounded-price")
        .and_then(|v| v.trim().parse::<i64>().ok());

    let name_link = row.select(&NAME_LINK).next();
    let name_element = row.select(&NAME_ICON_LINK).next().or(name_link);
    let name = name_element.as_ref().and_then(element_text);
    let room_type_id = name_element
        .iter()
        .chain(name_link.iter())
        .find_map(|el| el.value().attr("id"))
        .map(str::to_string);

    let occupancy_icons = row.select(&OCCUPANCY_ICON).count();

    let mut record = RoomRecord {
        name: name.unwrap_or_default(),
        block_id: block_id.clone(),
        room_type_id: room_type_id.clone(),
        rounded_price,
        description: select_text(row, "p.short-room-desc"),
        max_occupancy_text: select_text(row, ".hprt-table-cell-occupancy .bui-u-sr-only"),
        max_occupancy: u32::try_from(occupancy_icons).ok().filter(|n| *n > 0),
        bed_configuration: select_all_text(
            row,
            ".hprt-roomtype-bed li, .appartment-bed-types-wrapper li, .room-config li",
        ),
        highlights: select_all_text(row, ".hprt-facilities-block .hprt-facilities-facility"),
        included_facilities: select_all_text(
            row,
            ".hprt-facilities-others .hprt-facilities-facility",
        ),
        policies: select_all_text(row, ".hprt-conditions-bui li"),
        partner_note: select_text(row, ".tpi-options--provided-by"),
        price_note: select_text(row, ".prd-taxes-and-fees-under-price"),
        availability: availability_options(row),
        badges: select_all_text(row, ".bui-badge"),
        ..RoomRecord::default()
    };

    if let Some(display) = select_text(row, ".bui-price-display__value") {
        let (currency, amount_text, amount) = split_price_components(&display);
        record.price_display = Some(display);
        record.price_currency = currency;
        record.price_amount_text = amount_text;
        record.price_amount = amount;
    }

    let control = name_element.and_then(|_| ControlLocator::new(room_type_id, block_id));
    RoomRow { record, control }
}

fn availability_options(row: &ElementRef<'_>) -> Vec<AvailabilityOption> {
    row.select(&AVAILABILITY_OPTION)
        .filter_map(|option| {
            let value = option.value().attr("value").map(str::to_string);
            let label = normalize_text(&option.text().collect::<String>());
            (value.is_some() || label.is_some()).then_some(AvailabilityOption { value, label })
        })
        .collect()
}

/// Attaches galleries to `rows` and applies the retention policy.
///
/// Rows are processed one at a time since only one room modal may be open
/// on the page. The resolver is only invoked for named rows that have a
/// control locator and only when a live `session` is available; cached
/// pages pass `None`.
pub async fn assemble_rooms<S: PageSession>(
    rows: Vec<RoomRow>,
    mut session: Option<&mut S>,
    settings: &ModalSettings,
    retention: RoomRetention,
) -> Vec<RoomRecord> {
    let total = rows.len();
    let mut rooms = Vec::with_capacity(total);

    for row in rows {
        let gallery = match (row.name(), &row.control, session.as_mut()) {
            (Some(_), Some(locator), Some(session)) => {
                resolve_room_gallery(&mut **session, locator, settings).await
            }
            _ => Gallery::default(),
        };

        if let Some(record) = retain(row, gallery, retention) {
            rooms.push(record);
        }
    }

    tracing::debug!(rows = total, kept = rooms.len(), %retention, "assembled room options");
    rooms
}

fn retain(row: RoomRow, gallery: Gallery, retention: RoomRetention) -> Option<RoomRecord> {
    let name = row.name()?.to_string();
    if gallery.is_empty() && retention == RoomRetention::RequireGallery {
        tracing::debug!(room = %name, block_id = ?row.record.block_id, "dropping room without gallery");
        return None;
    }
    let mut record = row.record;
    record.gallery = gallery.into_vec();
    Some(record)
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
