//! Timestamp → bucket key mapping and human-readable labels.
//!
//! Keys use the timestamp's own calendar fields (the offset it was recorded
//! in), so they are a pure function of `(timestamp, granularity)`.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};

use super::types::{BucketKey, Granularity};
use crate::error::{JournalError, Result};

/// Bucket key for a timestamp: `YYYY-MM` for months, `YYYY` for years.
///
/// Keys sort chronologically only for years `0..=9999`, the range
/// [`NewEntry::new`](super::types::NewEntry::new) accepts.
pub fn bucket_key<Tz: TimeZone>(timestamp: &DateTime<Tz>, granularity: Granularity) -> BucketKey {
    let key = match granularity {
        Granularity::Month => format!("{:04}-{:02}", timestamp.year(), timestamp.month()),
        Granularity::Year => format!("{:04}", timestamp.year()),
    };
    BucketKey::new_unchecked(key)
}

/// Human-readable label, e.g. `"February 2026"` or `"2026"`.
///
/// Total: a key that does not parse for `granularity` is returned as-is.
pub fn bucket_label(key: &BucketKey, granularity: Granularity) -> String {
    match granularity {
        Granularity::Year => key.to_string(),
        Granularity::Month => match split_month_key(key.as_str()) {
            Some((year, month)) => NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%B %Y").to_string())
                .unwrap_or_else(|| key.to_string()),
            None => key.to_string(),
        },
    }
}

/// Validate untrusted key input (CLI args, HTTP paths) for a granularity.
pub fn parse_bucket_key(raw: &str, granularity: Granularity) -> Result<BucketKey> {
    let raw = raw.trim();
    let valid = match granularity {
        Granularity::Month => split_month_key(raw).is_some(),
        Granularity::Year => parse_year(raw).is_some(),
    };
    if valid {
        Ok(BucketKey::new_unchecked(raw))
    } else {
        let expected = match granularity {
            Granularity::Month => "YYYY-MM",
            Granularity::Year => "YYYY",
        };
        Err(JournalError::Validation(format!(
            "invalid {granularity} key {raw:?}, expected {expected}"
        )))
    }
}

fn split_month_key(key: &str) -> Option<(i32, u32)> {
    let (year, month) = key.split_once('-')?;
    let year = parse_year(year)?;
    if month.len() != 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

fn parse_year(raw: &str) -> Option<i32> {
    if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn at(offset_secs: i32, y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_secs)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
    }

    #[test]
    fn month_keys_are_zero_padded() {
        let ts = at(0, 2026, 2, 14, 12);
        assert_eq!(bucket_key(&ts, Granularity::Month).as_str(), "2026-02");
        assert_eq!(bucket_key(&ts, Granularity::Year).as_str(), "2026");
    }

    #[test]
    fn keys_use_local_calendar_fields() {
        // 23:00 on Jan 31 at UTC-5 is already Feb 1 in UTC.
        let ts = at(-5 * 3600, 2026, 1, 31, 23);
        assert_eq!(bucket_key(&ts, Granularity::Month).as_str(), "2026-01");
        assert_eq!(
            bucket_key(&ts.with_timezone(&Utc), Granularity::Month).as_str(),
            "2026-02"
        );
    }

    #[test]
    fn labels_render_month_and_year() {
        let key = BucketKey::new_unchecked("2026-02");
        assert_eq!(bucket_label(&key, Granularity::Month), "February 2026");
        let key = BucketKey::new_unchecked("2026");
        assert_eq!(bucket_label(&key, Granularity::Year), "2026");
    }

    #[test]
    fn every_generated_key_has_a_label() {
        for month in 1..=12 {
            let ts = at(0, 1999, month, 1, 0);
            let key = bucket_key(&ts, Granularity::Month);
            let label = bucket_label(&key, Granularity::Month);
            assert!(label.ends_with("1999"), "{label}");
            assert_ne!(label, key.as_str());
            assert!(parse_bucket_key(key.as_str(), Granularity::Month).is_ok());

            let key = bucket_key(&ts, Granularity::Year);
            assert_eq!(bucket_label(&key, Granularity::Year), "1999");
        }
    }

    #[test]
    fn label_falls_back_to_raw_key() {
        let key = BucketKey::new_unchecked("garbage");
        assert_eq!(bucket_label(&key, Granularity::Month), "garbage");
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert!(parse_bucket_key("2026-13", Granularity::Month).is_err());
        assert!(parse_bucket_key("2026-2", Granularity::Month).is_err());
        assert!(parse_bucket_key("2026", Granularity::Month).is_err());
        assert!(parse_bucket_key("2026-02", Granularity::Year).is_err());
        assert!(parse_bucket_key("26", Granularity::Year).is_err());
        assert_eq!(
            parse_bucket_key(" 2026-12 ", Granularity::Month).unwrap().as_str(),
            "2026-12"
        );
    }
}
