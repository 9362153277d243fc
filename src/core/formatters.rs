// Pure, total display formatting for raw record fields.
// Unparseable input is echoed back rather than rejected.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// "N noun" with a plural `s` for anything but one.
pub fn pluralize(count: i64, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Relative age of `then` as seen from `now`.
///
/// Buckets use floored whole hours/days, and each boundary belongs to the
/// coarser bucket: exactly one hour is "1 hour ago", exactly 24 hours is
/// "1 day ago", and seven days or more falls through to the absolute date.
pub fn relative_time(then: NaiveDateTime, now: NaiveDateTime) -> String {
    let elapsed = now.signed_duration_since(then);
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{} ago", pluralize(hours, "hour"))
    } else if days < 7 {
        format!("{} ago", pluralize(days, "day"))
    } else {
        absolute_date(then.date())
    }
}

/// `M/D/YYYY`, matching the en-US short date.
pub fn absolute_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// "18:00" -> "6:00 PM".
pub fn format_clock_time(raw: &str) -> String {
    match NaiveTime::parse_from_str(raw.trim(), "%H:%M") {
        Ok(time) => time.format("%-I:%M %p").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// "2025-01-20" -> "Mon, Jan 20, 2025".
pub fn format_event_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%a, %b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn format_chat_time(at: DateTime<Utc>) -> String {
    at.format("%-I:%M %p").to_string()
}

pub fn initials(first_name: &str, last_name: &str) -> String {
    [first_name, last_name]
        .iter()
        .filter_map(|part| part.trim().chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn format_rating(rating: f32) -> String {
    format!("{:.1}", rating)
}

pub fn format_hourly_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("${:.0}/hr", rate)
    } else {
        format!("${:.2}/hr", rate)
    }
}
