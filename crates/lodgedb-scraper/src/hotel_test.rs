use rust_decimal::Decimal;

use super::*;

const URL: &str = "https://www.booking.com/hotel/ae/marina-view.html";

fn page(head: &str, body: &str) -> String {
    format!("<html><head>{head}</head><body>{body}</body></html>")
}

const LD_HOTEL: &str = r#"
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@type": "Hotel",
  "name": " Marina View Hotel ",
  "description": "Waterfront rooms near the tram.",
  "image": ["https://cf.bstatic.com/xdata/images/hotel/max1024x768/1.jpg"],
  "amenityFeature": [{"name": "Free WiFi"}, {"name": " "}, {"name": "Pool"}],
  "geo": {"latitude": 25.0805, "longitude": "55.1403"},
  "address": {"addressLocality": "Dubai Marina"},
  "aggregateRating": {"ratingValue": "8.7"}
}
</script>"#;

#[test]
fn prefers_structured_data() {
    let html = page(
        LD_HOTEL,
        r#"<h2 data-testid="title">DOM Title</h2>
           <div id="photo_wrapper">
             <img src="https://cf.bstatic.com/xdata/images/hotel/max1024x768/1.jpg">
             <img data-src="https://cf.bstatic.com/xdata/images/hotel/max1024x768/2.jpg">
           </div>
           <span class="f6b6d2a959">Pool</span>
           <div data-testid="facility-badge">Parking</div>"#,
    );
    let parsed = parse_hotel_page(URL, &html);
    let hotel = parsed.record;

    assert_eq!(hotel.url, URL);
    assert_eq!(hotel.title.as_deref(), Some("Marina View Hotel"));
    assert_eq!(hotel.description.as_deref(), Some("Waterfront rooms near the tram."));
    assert_eq!(
        hotel.gallery,
        vec![
            "https://cf.bstatic.com/xdata/images/hotel/max1024x768/1.jpg",
            "https://cf.bstatic.com/xdata/images/hotel/max1024x768/2.jpg",
        ]
    );
    assert_eq!(hotel.facilities, vec!["Free WiFi", "Pool", "Parking"]);
    assert_eq!(hotel.latitude.as_deref(), Some("25.0805"));
    assert_eq!(hotel.longitude.as_deref(), Some("55.1403"));
    assert_eq!(hotel.city.as_deref(), Some("Dubai Marina"));
    assert_eq!(hotel.rating, Some(8.7));
    assert!(hotel.rooms.is_empty());
    assert!(parsed.rooms.is_empty());
}

#[test]
fn falls_back_to_dom_fields() {
    let html = page(
        "",
        r#"<input name="ss" value="Abu Dhabi">
           <h1>Corniche Suites</h1>
           <div class="hp-description"><p>Sea views.</p></div>
           <img data-testid="static-map" src="https://maps.example/static?center=24.4667%2C54.3667&zoom=15">
           <span class="f63b14ab7a">Very good · 1,204 reviews</span>
           <div class="f63b14ab7a dff2e52086">8.4</div>"#,
    );
    let hotel = parse_hotel_page(URL, &html).record;

    assert_eq!(hotel.title.as_deref(), Some("Corniche Suites"));
    assert_eq!(hotel.description.as_deref(), Some("Sea views."));
    assert_eq!(hotel.latitude.as_deref(), Some("24.4667"));
    assert_eq!(hotel.longitude.as_deref(), Some("54.3667"));
    assert_eq!(hotel.city.as_deref(), Some("Abu Dhabi"));
    assert_eq!(hotel.reviews_count, Some(1204));
    assert_eq!(hotel.rating, Some(8.4));
}

#[test]
fn map_link_center_used_when_geo_missing() {
    let ld = r#"<script type="application/ld+json">
        [{"@type": "BreadcrumbList"},
         {"@type": "Hotel", "name": "Palm Stay",
          "hasMap": "https://maps.googleapis.com/maps/api/staticmap?center=25.1124,55.1390&size=400x300"}]
        </script>"#;
    let hotel = parse_hotel_page(URL, &page(ld, "")).record;
    assert_eq!(hotel.title.as_deref(), Some("Palm Stay"));
    assert_eq!(hotel.latitude.as_deref(), Some("25.1124"));
    assert_eq!(hotel.longitude.as_deref(), Some("55.1390"));
}

#[test]
fn country_in_search_box_is_not_a_city() {
    let html = page(
        "",
        r#"<input name="ss" value="United Arab Emirates (UAE)">
           <p data-testid="address">Al Seef Street, Bur Dubai, Dubai, UAE</p>"#,
    );
    let hotel = parse_hotel_page(URL, &html).record;
    assert_eq!(hotel.city.as_deref(), Some("Dubai"));
}

#[test]
fn city_from_address_handles_parenthesised_district() {
    assert_eq!(
        city_from_address("Old Boulevard , Batumi (Old Boulevard )").as_deref(),
        Some("Batumi")
    );
    assert_eq!(city_from_address("UAE"), None);
}

#[test]
fn out_of_range_rating_is_ignored() {
    let html = page("", r#"<div class="f63b14ab7a dff2e52086">42</div>"#);
    assert_eq!(parse_hotel_page(URL, &html).record.rating, None);
}

#[test]
fn parses_pricing_and_room_rows() {
    let html = page(
        "",
        r#"<div data-testid="availability-rate-information">
             <span data-testid="price-and-discounted-price">AED 1,200</span>
           </div>
           <table><tbody>
             <tr data-block-id="7_1"><td><a class="hprt-roomtype-link" id="7">Studio</a></td></tr>
           </tbody></table>"#,
    );
    let parsed = parse_hotel_page(URL, &html);
    let pricing = parsed.record.pricing.expect("pricing");
    assert_eq!(pricing.current_price_currency.as_deref(), Some("AED"));
    assert_eq!(pricing.current_price_amount, Some(Decimal::new(1200, 0)));
    assert_eq!(parsed.rooms.len(), 1);
    assert_eq!(parsed.rooms[0].record.name, "Studio");
}

#[test]
fn garbage_ld_json_is_skipped() {
    let ld = r#"<script type="application/ld+json">{not json</script>"#;
    let hotel = parse_hotel_page(URL, &page(ld, "<h1>Fallback</h1>")).record;
    assert_eq!(hotel.title.as_deref(), Some("Fallback"));
}
