use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Start instant of a cycle identifier of the form `YYYYMMDD_HHZ`.
pub fn cycle_start(cycle: &str) -> Option<DateTime<Utc>> {
    let (date, rest) = cycle.split_once('_')?;
    let hour = rest.strip_suffix('Z').unwrap_or(rest);
    if !all_digits(date, 8) || !all_digits(hour, 2) {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
    let time = NaiveTime::from_hms_opt(hour.parse().ok()?, 0, 0)?;
    Some(date.and_time(time).and_utc())
}

fn all_digits(field: &str, len: usize) -> bool {
    field.len() == len && field.bytes().all(|b| b.is_ascii_digit())
}

/// Menu label for a cycle: `20250126_00Z` → `26-01-2025 00Z`.
/// Identifiers that don't parse are shown as-is.
pub fn cycle_label(cycle: &str) -> String {
    match cycle_start(cycle) {
        Some(start) => start.format("%d-%m-%Y %HZ").to_string(),
        None => cycle.to_string(),
    }
}

/// Slider label for a forecast hour.
pub fn hour_label(hour: u32) -> String {
    format!("{} h", hour)
}
