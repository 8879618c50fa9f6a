//! Japanese display formatting for dates, amounts and sizes.

use chrono_tz::Tz;
use time::{Date, OffsetDateTime};

use crate::util::timezone::{localized_clock, localized_date};

/// `2025年12月1日`
pub fn format_date(date: Date) -> String {
    format!(
        "{}年{}月{}日",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Calendar date of `time` in the site timezone.
pub fn format_local_date(time: OffsetDateTime, tz: Tz) -> String {
    format_date(localized_date(time, tz))
}

/// `2025年12月1日 09:05`
pub fn format_local_datetime(time: OffsetDateTime, tz: Tz) -> String {
    let (hour, minute) = localized_clock(time, tz);
    format!(
        "{} {hour:02}:{minute:02}",
        format_date(localized_date(time, tz))
    )
}

/// ISO date for `<time datetime>` attributes.
pub fn iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// `1,000,000円`
pub fn format_yen(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{grouped}円")
    } else {
        format!("{grouped}円")
    }
}

pub fn format_amount_range(min: Option<i64>, max: Option<i64>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) if min == max => Some(format_yen(max)),
        (Some(min), Some(max)) => Some(format!("{}〜{}", format_yen(min), format_yen(max))),
        (None, Some(max)) => Some(format!("上限{}", format_yen(max))),
        (Some(min), None) => Some(format!("{}〜", format_yen(min))),
        (None, None) => None,
    }
}

pub fn format_application_period(start: Option<Date>, end: Option<Date>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{}〜{}", format_date(start), format_date(end))),
        (None, Some(end)) => Some(format!("{}まで", format_date(end))),
        (Some(start), None) => Some(format!("{}から", format_date(start))),
        (None, None) => None,
    }
}

pub fn format_bytes(size: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    if size >= MIB {
        format!("{:.1} MB", size as f64 / MIB as f64)
    } else if size >= KIB {
        format!("{:.1} KB", size as f64 / KIB as f64)
    } else {
        format!("{size} B")
    }
}

/// Input value for `<input type="date">`.
pub fn date_input_value(date: Option<Date>) -> String {
    date.map(iso_date).unwrap_or_default()
}
