use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Local midnight of the day containing `now`, as UTC.
pub fn start_of_local_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.with_timezone(&Local).date_naive();
    start_of_local_date(date).unwrap_or_else(|| {
        // midnight skipped by a DST jump: fall back to UTC midnight
        date.and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt))
            .unwrap_or(now)
    })
}

/// Local midnight of `date`, if it exists.
pub fn start_of_local_date(date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
