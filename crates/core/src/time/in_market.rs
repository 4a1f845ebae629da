use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::collections::HashSet;

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

// Runs before this time (IST) use the previous trading day's close.
// NSE closes at 15:30 IST.
const CLOSE_CUTOFF_HOUR_IST: u32 = 16;
const CLOSE_CUTOFF_MINUTE_IST: u32 = 0;

const HOLIDAY_YEARS: std::ops::RangeInclusive<i32> = 2024..=2030;
// Republic Day, Independence Day, Gandhi Jayanti, Christmas.
const FIXED_HOLIDAYS: [(u32, u32); 4] = [(1, 26), (8, 15), (10, 2), (12, 25)];

/// Market date a universe snapshot should describe.
///
/// An explicit `YYYY-MM-DD` wins. Otherwise the IST date of `now_utc`, moved
/// back a day before the close cutoff and then over weekends and holidays.
/// Extra holidays come from `IN_MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD"`.
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    let extra = std::env::var("IN_MARKET_HOLIDAYS").unwrap_or_default();
    resolve_with_holidays(as_of_date_arg, now_utc, &configured_holidays(&extra))
}

fn resolve_with_holidays(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
    holidays: &HashSet<NaiveDate>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid as-of date {s:?} (expected YYYY-MM-DD)"));
    }

    let ist = chrono::FixedOffset::east_opt(IST_OFFSET_SECS).context("invalid IST offset")?;
    let now_ist = now_utc.with_timezone(&ist);

    let cutoff_reached =
        (now_ist.hour(), now_ist.minute()) >= (CLOSE_CUTOFF_HOUR_IST, CLOSE_CUTOFF_MINUTE_IST);
    let mut date = now_ist.date_naive();
    if !cutoff_reached {
        date -= Duration::days(1);
    }

    while is_weekend(date) || holidays.contains(&date) {
        date -= Duration::days(1);
    }

    Ok(date)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

fn configured_holidays(extra: &str) -> HashSet<NaiveDate> {
    let mut out: HashSet<NaiveDate> = HOLIDAY_YEARS
        .flat_map(|y| {
            FIXED_HOLIDAYS
                .iter()
                .filter_map(move |&(m, d)| NaiveDate::from_ymd_opt(y, m, d))
        })
        .collect();

    for part in extra.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match NaiveDate::parse_from_str(part, "%Y-%m-%d") {
            Ok(d) => {
                out.insert(d);
            }
            Err(_) => tracing::warn!(value = part, "ignoring malformed IN_MARKET_HOLIDAYS entry"),
        }
    }

    out
}
