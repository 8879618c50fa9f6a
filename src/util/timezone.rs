use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use time::{Date, Month, OffsetDateTime, UtcOffset};

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    let datetime_utc = DateTime::<Utc>::from_timestamp(utc.unix_timestamp(), utc.nanosecond())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    tz.from_utc_datetime(&datetime_utc.naive_utc())
}

/// Calendar date of `time` as seen in `tz`.
pub fn localized_date(time: OffsetDateTime, tz: Tz) -> Date {
    let localized = localized_datetime(time, tz);
    Month::try_from(localized.month() as u8)
        .ok()
        .and_then(|month| {
            Date::from_calendar_date(localized.year(), month, localized.day() as u8).ok()
        })
        .unwrap_or_else(|| time.date())
}

/// `(hour, minute)` of `time` in `tz`.
pub fn localized_clock(time: OffsetDateTime, tz: Tz) -> (u32, u32) {
    let localized = localized_datetime(time, tz);
    (localized.hour(), localized.minute())
}

pub fn today_in(tz: Tz) -> Date {
    localized_date(OffsetDateTime::now_utc(), tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn tokyo_date_rolls_over_before_utc() {
        let late_utc = datetime!(2025-03-31 16:30 UTC);
        assert_eq!(
            localized_date(late_utc, chrono_tz::Asia::Tokyo),
            time::macros::date!(2025 - 04 - 01)
        );
        assert_eq!(localized_clock(late_utc, chrono_tz::Asia::Tokyo), (1, 30));
    }
}
