//! Calendar math for the reminder and rollover pipelines.
//!
//! Everything here is pure: callers pass the current instant in, so the
//! pipelines stay deterministic and testable. Dates are compared as calendar
//! days in the owner's own timezone, never as instants.

use crate::models::BillingCycle;
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Reminder offsets used when `reminder_period` is missing or unusable.
pub const DEFAULT_OFFSETS: [i64; 3] = [1, 3, 7];

/// Hard cap on configured offsets per subscription.
pub const MAX_OFFSETS: usize = 12;

/// Local hour reminders are nominally delivered at.
pub const SEND_HOUR: i64 = 8;

/// Resolve an owner's IANA timezone, defaulting to UTC when the profile has
/// none or names a zone we do not know.
pub fn resolve_timezone(name: Option<&str>) -> Tz {
    match name {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Unknown timezone {raw:?}, falling back to UTC");
            Tz::UTC
        }),
        _ => Tz::UTC,
    }
}

/// Parse a comma-separated `reminder_period` into the offset set: integers
/// in [0, 365], deduplicated in first-seen order, capped at [`MAX_OFFSETS`].
/// An empty result falls back to [`DEFAULT_OFFSETS`].
pub fn parse_offsets(reminder_period: Option<&str>) -> Vec<i64> {
    let mut offsets: Vec<i64> = Vec::new();
    if let Some(raw) = reminder_period {
        for token in raw.split(',') {
            if offsets.len() == MAX_OFFSETS {
                break;
            }
            if let Ok(n) = token.trim().parse::<i64>()
                && (0..=365).contains(&n)
                && !offsets.contains(&n)
            {
                offsets.push(n);
            }
        }
    }

    if offsets.is_empty() {
        DEFAULT_OFFSETS.to_vec()
    } else {
        offsets
    }
}

/// Owner-local calendar day for the given instant.
pub fn local_day(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Whole days from the owner-local today to the next payment date, negative
/// when already overdue. `next_payment_date` is a plain calendar date and is
/// read in the owner's zone, so two owners straddling a date line can
/// legitimately see values one day apart for the same instant.
pub fn days_until(next_payment_date: NaiveDate, now: DateTime<Utc>, tz: Tz) -> i64 {
    (next_payment_date - local_day(now, tz)).num_days()
}

fn local_midnight_utc(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        // midnight can fall into a DST gap; read the wall time as UTC then
        None => Utc.from_utc_datetime(&midnight),
    }
}

/// UTC window `[start, end)` covering one owner-local calendar day; the
/// dedup guard scans `scheduled_for` against this window.
pub fn local_day_utc_bounds(day: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight_utc(day, tz);
    let end = local_midnight_utc(day + Duration::days(1), tz);
    (start, end)
}

/// The intended send instant for a local day: 08:00 owner-local as UTC.
pub fn scheduled_send_time(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    local_midnight_utc(day, tz) + Duration::hours(SEND_HOUR)
}

/// Morning send window: 08:00-08:59 local, plus the 07:45-07:59 lead-in so
/// a trigger firing slightly early still counts.
pub fn within_send_window(now: DateTime<Utc>, tz: Tz) -> bool {
    let local = now.with_timezone(&tz);
    local.hour() as i64 == SEND_HOUR
        || (local.hour() as i64 == SEND_HOUR - 1 && local.minute() >= 45)
}

/// Advance an overdue date by whole cycle increments until it is no longer
/// before `today`. Dates already at or past `today` come back unchanged, so
/// re-running on advanced state is a no-op. Month addition clamps to the end
/// of shorter months.
pub fn advance_past(start: NaiveDate, cycle: BillingCycle, today: NaiveDate) -> NaiveDate {
    let step = Months::new(cycle.increment_months());
    let mut date = start;
    while date < today {
        date = date + step;
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instant(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_resolve_timezone() {
        assert_eq!(resolve_timezone(Some("Asia/Tokyo")), chrono_tz::Asia::Tokyo);
        assert_eq!(resolve_timezone(None), Tz::UTC);
        assert_eq!(resolve_timezone(Some("")), Tz::UTC);
        assert_eq!(resolve_timezone(Some("Not/AZone")), Tz::UTC);
    }

    #[test]
    fn test_parse_offsets_defaults() {
        assert_eq!(parse_offsets(None), vec![1, 3, 7]);
        assert_eq!(parse_offsets(Some("")), vec![1, 3, 7]);
        assert_eq!(parse_offsets(Some("abc,xyz")), vec![1, 3, 7]);
        // out-of-range values filtered, leaving nothing
        assert_eq!(parse_offsets(Some("-1,400")), vec![1, 3, 7]);
    }

    #[test]
    fn test_parse_offsets_order_dedup_and_cap() {
        assert_eq!(parse_offsets(Some("7, 1, 3")), vec![7, 1, 3]);
        assert_eq!(parse_offsets(Some("3,3,3,5")), vec![3, 5]);
        assert_eq!(parse_offsets(Some("0,365,366")), vec![0, 365]);

        let many = (0..20).map(|n| n.to_string()).collect::<Vec<_>>().join(",");
        assert_eq!(parse_offsets(Some(&many)).len(), MAX_OFFSETS);
    }

    #[test]
    fn test_days_until_depends_on_owner_zone() {
        // 2026-03-10 23:30 UTC: already March 11 in Tokyo, still March 10
        // in Los Angeles (PDT).
        let now = instant(2026, 3, 10, 23, 30);
        let due = date(2026, 3, 13);
        assert_eq!(days_until(due, now, chrono_tz::Asia::Tokyo), 2);
        assert_eq!(
            days_until(due, now, chrono_tz::America::Los_Angeles),
            3
        );
    }

    #[test]
    fn test_days_until_negative_when_overdue() {
        let now = instant(2026, 8, 7, 12, 0);
        assert_eq!(days_until(date(2026, 8, 1), now, Tz::UTC), -6);
    }

    #[test]
    fn test_local_day_utc_bounds() {
        let (start, end) = local_day_utc_bounds(date(2026, 3, 11), chrono_tz::Asia::Tokyo);
        assert_eq!(start, instant(2026, 3, 10, 15, 0));
        assert_eq!(end, instant(2026, 3, 11, 15, 0));

        let (start, end) = local_day_utc_bounds(date(2026, 3, 11), Tz::UTC);
        assert_eq!(start, instant(2026, 3, 11, 0, 0));
        assert_eq!(end, instant(2026, 3, 12, 0, 0));
    }

    #[test]
    fn test_scheduled_send_time() {
        // 08:00 Tokyo is 23:00 UTC the previous day
        assert_eq!(
            scheduled_send_time(date(2026, 3, 11), chrono_tz::Asia::Tokyo),
            instant(2026, 3, 10, 23, 0)
        );
        assert_eq!(
            scheduled_send_time(date(2026, 3, 11), Tz::UTC),
            instant(2026, 3, 11, 8, 0)
        );
    }

    #[test]
    fn test_within_send_window() {
        let tokyo = chrono_tz::Asia::Tokyo;
        // 23:15 UTC = 08:15 Tokyo
        assert!(within_send_window(instant(2026, 3, 10, 23, 15), tokyo));
        // 22:45 UTC = 07:45 Tokyo
        assert!(within_send_window(instant(2026, 3, 10, 22, 45), tokyo));
        // 22:30 UTC = 07:30 Tokyo
        assert!(!within_send_window(instant(2026, 3, 10, 22, 30), tokyo));
        // 00:00 UTC = 09:00 Tokyo
        assert!(!within_send_window(instant(2026, 3, 11, 0, 0), tokyo));
    }

    #[test]
    fn test_advance_past_monthly_overdue() {
        // due the 1st, three months back: four increments land past today
        let advanced = advance_past(date(2026, 5, 1), BillingCycle::Monthly, date(2026, 8, 7));
        assert_eq!(advanced, date(2026, 9, 1));
    }

    #[test]
    fn test_advance_past_is_idempotent() {
        let today = date(2026, 8, 7);
        let advanced = advance_past(date(2026, 5, 1), BillingCycle::Monthly, today);
        assert_eq!(advance_past(advanced, BillingCycle::Monthly, today), advanced);
        // a date landing exactly on today stays put
        assert_eq!(advance_past(today, BillingCycle::Monthly, today), today);
    }

    #[test]
    fn test_advance_past_quarterly_and_yearly() {
        assert_eq!(
            advance_past(date(2025, 11, 15), BillingCycle::Quarterly, date(2026, 8, 7)),
            date(2026, 8, 15)
        );
        assert_eq!(
            advance_past(date(2024, 6, 1), BillingCycle::Yearly, date(2026, 8, 7)),
            date(2027, 6, 1)
        );
    }

    #[test]
    fn test_advance_past_clamps_month_end() {
        assert_eq!(
            advance_past(date(2026, 1, 31), BillingCycle::Monthly, date(2026, 2, 15)),
            date(2026, 2, 28)
        );
    }
}
