//! Display helpers for appointment rows and doctor cards.
//!
//! All functions are total: malformed input maps to a literal fallback
//! (`"N/A"`, `"Invalid Time"`, `"Invalid Date"`) instead of an error.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

use crate::models::SlotMap;

pub const NOT_AVAILABLE: &str = "N/A";
pub const INVALID_TIME: &str = "Invalid Time";
pub const INVALID_DATE: &str = "Invalid Date";

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

static TIME_24H: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::\d{2})?$").expect("valid regex"));
static TIME_12H: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(\d{1,2}):(\d{2})\s*([ap])\.?m\.?$").expect("valid regex"));

/// `HH:MM` → `h:mm AM|PM`.
pub fn format_time(input: &str) -> String {
    let time = input.trim();
    if time.is_empty() {
        return NOT_AVAILABLE.to_string();
    }

    if let Some(caps) = TIME_24H.captures(time) {
        let (Ok(hours), Ok(minutes)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            return INVALID_TIME.to_string();
        };
        if hours > 23 || minutes > 59 {
            return INVALID_TIME.to_string();
        }
        let meridiem = if hours >= 12 { "PM" } else { "AM" };
        let hour12 = match hours % 12 {
            0 => 12,
            h => h,
        };
        return format!("{hour12}:{minutes:02} {meridiem}");
    }

    // Already annotated; normalize spacing and case.
    if let Some(caps) = TIME_12H.captures(time) {
        let (Ok(hours), Ok(minutes)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            return INVALID_TIME.to_string();
        };
        if !(1..=12).contains(&hours) || minutes > 59 {
            return INVALID_TIME.to_string();
        }
        let meridiem = if caps[3].eq_ignore_ascii_case("p") { "PM" } else { "AM" };
        return format!("{hours}:{minutes:02} {meridiem}");
    }

    INVALID_TIME.to_string()
}

/// Slot date in any of the delimiter/order conventions the backend emits →
/// `DD-MMM-YYYY`.
///
/// `-` and `_` separated dates are `YYYY-MM-DD` when the first part has four
/// digits, otherwise `DD-MM-YYYY`. `/` separated dates are `YYYY/MM/DD` or
/// `MM/DD/YYYY`.
pub fn format_slot_date(input: &str) -> String {
    let date = input.trim();
    if date.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    match parse_slot_date(date) {
        Some(parsed) => format!(
            "{:02}-{}-{}",
            parsed.day(),
            MONTHS[parsed.month0() as usize],
            parsed.year()
        ),
        None => INVALID_DATE.to_string(),
    }
}

fn parse_slot_date(date: &str) -> Option<NaiveDate> {
    let delimiter = ['-', '_', '/'].into_iter().find(|d| date.contains(*d))?;
    let parts: Vec<&str> = date.split(delimiter).map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let (year, month, day) = if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else if delimiter == '/' {
        (parts[2], parts[0], parts[1])
    } else {
        (parts[2], parts[1], parts[0])
    };
    if year.len() != 4 {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Whole years between `dob` and `today`; `None` when `dob` does not parse or
/// lies in the future.
pub fn calculate_age(dob: &str, today: NaiveDate) -> Option<u32> {
    let born = parse_slot_date(dob.trim())?;
    today.years_since(born)
}

pub fn format_amount(currency: &str, amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{currency}{amount:.0}")
    } else {
        format!("{currency}{amount:.2}")
    }
}

/// Absolute URLs pass through; bare paths are served by the backend.
pub fn normalize_image_url(image: &str, backend_url: &str) -> Option<String> {
    let image = image.trim();
    if image.is_empty() {
        None
    } else if image.starts_with("http://") || image.starts_with("https://") {
        Some(image.to_string())
    } else {
        Some(format!(
            "{}/{}",
            backend_url.trim_end_matches('/'),
            image.trim_start_matches('/')
        ))
    }
}

/// `day_month_year` without zero padding, e.g. `7_3_2026`.
pub fn slot_date_key(date: NaiveDate) -> String {
    format!("{}_{}_{}", date.day(), date.month(), date.year())
}

/// Empty slot lists for `days` consecutive days starting at `start`.
pub fn empty_slot_map(start: NaiveDate, days: u32) -> SlotMap {
    (0..days)
        .map(|offset| (slot_date_key(start + Duration::days(i64::from(offset))), Vec::new()))
        .collect()
}
