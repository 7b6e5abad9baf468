use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use shared::dates::calendar_date;
use shared::{non_blank, CalendarEvent};

/// Date and time in the board's time zone
pub fn format_datetime(dt: DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%b %d, %Y %H:%M").to_string()
}

/// Date only
pub fn format_date(dt: DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%b %d, %Y").to_string()
}

/// "Mar 04, 2024" or "Mar 04, 2024 – Mar 06, 2024" for multi-day events.
/// Falls back to the raw strings when they cannot be parsed.
pub fn format_event_dates(event: &CalendarEvent, tz: Tz) -> String {
    let start = calendar_date(&event.event_date, tz);
    let end = non_blank(&event.end_date).and_then(|raw| calendar_date(raw, tz));
    match (start, end) {
        (Some(start), Some(end)) if end != start => {
            format!("{} – {}", start.format("%b %d, %Y"), end.format("%b %d, %Y"))
        }
        (Some(start), _) => start.format("%b %d, %Y").to_string(),
        (None, _) => event.event_date.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn event(start: &str, end: Option<&str>) -> CalendarEvent {
        serde_json::from_value(serde_json::json!({
            "calendar_id": 1,
            "title": "Field trip",
            "event_date": start,
            "end_date": end,
        }))
        .unwrap()
    }

    #[wasm_bindgen_test]
    fn test_format_datetime_uses_board_zone() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 23, 30, 0).unwrap();
        assert_eq!(format_datetime(dt, chrono_tz::Asia::Manila), "Jan 03, 2024 07:30");
        assert_eq!(format_date(dt, chrono_tz::UTC), "Jan 02, 2024");
    }

    #[wasm_bindgen_test]
    fn test_format_event_dates() {
        let tz = chrono_tz::UTC;
        assert_eq!(format_event_dates(&event("2024-03-04", None), tz), "Mar 04, 2024");
        assert_eq!(
            format_event_dates(&event("2024-03-04", Some("2024-03-06 00:00:00")), tz),
            "Mar 04, 2024 – Mar 06, 2024"
        );
        assert_eq!(format_event_dates(&event("soon", None), tz), "soon");
    }

    #[wasm_bindgen_test]
    fn test_format_event_dates_in_board_zone() {
        let midnight = event("2024-01-02T16:00:00.000Z", None);
        assert_eq!(format_event_dates(&midnight, chrono_tz::Asia::Manila), "Jan 03, 2024");
        assert_eq!(format_event_dates(&midnight, chrono_tz::UTC), "Jan 02, 2024");
    }
}
