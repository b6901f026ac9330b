//! Bucket generation, bucket keys, and locale-aware labels.

use chrono::{DateTime, Datelike, Duration, Locale, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use super::range::{Granularity, TimeRange};

/// Midnight (UTC) of the first day in the window, chosen so a `days`-day
/// window ending today yields exactly `days` daily buckets.
pub fn start_date_at(range: TimeRange, now: DateTime<Utc>) -> DateTime<Utc> {
    let first_day = now.date_naive() - Duration::days(range.config().days - 1);
    Utc.from_utc_datetime(&first_day.and_time(NaiveTime::MIN))
}

/// [`start_date_at`] anchored to the current instant.
pub fn start_date(range: TimeRange) -> DateTime<Utc> {
    start_date_at(range, Utc::now())
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

/// The bucket a date falls into: the date itself for daily buckets, the
/// Monday of its week for weekly buckets.
pub fn bucket_key(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Daily => date,
        Granularity::Weekly => week_start(date),
    }
}

/// Every bucket in `[start, end]`: each calendar day, or each Monday-aligned
/// week. No bucket is ever missing regardless of commit sparsity.
pub fn generate_buckets(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }

    let mut buckets = Vec::new();
    match granularity {
        Granularity::Daily => {
            let mut day = start;
            while day <= end {
                buckets.push(day);
                day += Duration::days(1);
            }
        }
        Granularity::Weekly => {
            let mut monday = week_start(start);
            let last = week_start(end);
            while monday <= last {
                buckets.push(monday);
                monday += Duration::days(7);
            }
        }
    }
    buckets
}

/// Parse a BCP-47 style locale tag, falling back to POSIX when unknown.
///
/// Web-facing callers send dashed tags ("en-US"); chrono's locale table uses
/// underscores, so normalize before lookup.
pub fn parse_locale(tag: &str) -> Locale {
    let normalized = tag.replace('-', "_");
    Locale::try_from(normalized.as_str()).unwrap_or(Locale::POSIX)
}

/// Localized display label for a bucket: abbreviated weekday + day number for
/// daily buckets, abbreviated month + 2-digit year for weekly buckets.
pub fn bucket_label(date: NaiveDate, granularity: Granularity, locale: Locale) -> String {
    match granularity {
        Granularity::Daily => date.format_localized("%a %-d", locale).to_string(),
        Granularity::Weekly => date.format_localized("%b %y", locale).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn daily_buckets_are_spaced_exactly_one_day() {
        let buckets = generate_buckets(date(2026, 7, 25), date(2026, 7, 31), Granularity::Daily);
        assert_eq!(buckets.len(), 7);
        for pair in buckets.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }

    #[test]
    fn weekly_buckets_are_monday_aligned_and_seven_days_apart() {
        // 2026-07-01 is a Wednesday; 2026-08-31 is a Monday.
        let buckets = generate_buckets(date(2026, 7, 1), date(2026, 8, 31), Granularity::Weekly);
        assert!(!buckets.is_empty());
        assert_eq!(buckets[0], date(2026, 6, 29), "first bucket is the Monday of the start week");
        for bucket in &buckets {
            assert_eq!(bucket.weekday(), Weekday::Mon);
        }
        for pair in buckets.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(7));
        }
        assert_eq!(*buckets.last().expect("non-empty"), date(2026, 8, 31));
    }

    #[test]
    fn empty_interval_yields_no_buckets() {
        let buckets = generate_buckets(date(2026, 8, 2), date(2026, 8, 1), Granularity::Daily);
        assert!(buckets.is_empty());
    }

    #[test]
    fn start_date_yields_exactly_the_window_length_in_daily_buckets() {
        let now = Utc
            .with_ymd_and_hms(2026, 8, 6, 15, 30, 0)
            .single()
            .expect("valid instant");

        for range in [TimeRange::Days7, TimeRange::Days30] {
            let cfg = range.config();
            let start = start_date_at(range, now);
            let buckets =
                generate_buckets(start.date_naive(), now.date_naive(), cfg.granularity);
            assert_eq!(buckets.len() as i64, cfg.days);
        }
    }

    #[test]
    fn weekly_ranges_meet_their_minimum_data_points() {
        let now = Utc
            .with_ymd_and_hms(2026, 8, 6, 15, 30, 0)
            .single()
            .expect("valid instant");

        for range in [TimeRange::Months6, TimeRange::Months12] {
            let cfg = range.config();
            let start = start_date_at(range, now);
            let buckets =
                generate_buckets(start.date_naive(), now.date_naive(), cfg.granularity);
            assert!(
                buckets.len() >= cfg.min_data_points,
                "{} buckets for {:?}",
                buckets.len(),
                range
            );
        }
    }

    #[test]
    fn bucket_key_maps_dates_into_their_week() {
        // 2026-08-06 is a Thursday; its week starts Monday 2026-08-03.
        assert_eq!(
            bucket_key(date(2026, 8, 6), Granularity::Weekly),
            date(2026, 8, 3)
        );
        assert_eq!(
            bucket_key(date(2026, 8, 6), Granularity::Daily),
            date(2026, 8, 6)
        );
        // A Monday is its own week start.
        assert_eq!(week_start(date(2026, 8, 3)), date(2026, 8, 3));
    }

    #[test]
    fn labels_follow_granularity() {
        let locale = parse_locale("en-US");
        let daily = bucket_label(date(2026, 8, 3), Granularity::Daily, locale);
        assert_eq!(daily, "Mon 3");

        let weekly = bucket_label(date(2026, 8, 3), Granularity::Weekly, locale);
        assert_eq!(weekly, "Aug 26");
    }

    #[test]
    fn unknown_locales_fall_back_to_posix() {
        let locale = parse_locale("zz-ZZ");
        let label = bucket_label(date(2026, 8, 3), Granularity::Daily, locale);
        // POSIX still renders an English-like weekday abbreviation.
        assert!(label.starts_with("Mon"));
    }
}
