use crate::models::Version;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const NAIVE_DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
];

#[derive(Debug, Clone, PartialEq)]
enum Segment<'a> {
    Number(f64),
    Text(&'a str),
}

fn segments(version: &str) -> Vec<Segment<'_>> {
    version
        .split(['.', '+', '-'])
        .map(|part| match part.parse::<f64>() {
            Ok(n) if n.is_finite() => Segment::Number(n),
            _ => Segment::Text(part),
        })
        .collect()
}

/// Compares two version-like strings segment by segment.
///
/// Numeric segments compare numerically, so `1.10` is newer than `1.2`. A
/// missing trailing segment sorts lowest and a numeric segment always beats a
/// textual one.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let ord = match (left.get(i), right.get(i)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(Segment::Number(x)), Some(Segment::Number(y))) => {
                x.partial_cmp(y).unwrap_or(Ordering::Equal)
            }
            (Some(Segment::Text(x)), Some(Segment::Text(y))) => x.cmp(y),
            (Some(Segment::Number(_)), Some(Segment::Text(_))) => Ordering::Greater,
            (Some(Segment::Text(_)), Some(Segment::Number(_))) => Ordering::Less,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Orders releases newest first. Sorting ascending with this comparator puts
/// the most recent release at index 0.
///
/// Dates win when both parse; a dated release always precedes an undated one;
/// otherwise the version strings decide (descending).
pub fn compare_version_records(a: &Version, b: &Version) -> Ordering {
    match (parse_release_date(&a.date), parse_release_date(&b.date)) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_versions(&b.version, &a.version),
    }
}

fn parse_compact(s: &str) -> Option<DateTime<Utc>> {
    let field = |range: std::ops::Range<usize>| s.get(range)?.parse::<u32>().ok();
    let year = s.get(0..4)?.parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)?
        .and_hms_opt(field(8..10)?, field(10..12)?, field(12..14)?)
        .map(|naive| naive.and_utc())
}

/// Parses a release date as found in source feeds.
///
/// The compact `YYYYMMDDHHmmss` form is tried first and read as UTC. Other
/// inputs go through RFC 3339, RFC 2822 and a handful of calendar layouts;
/// layouts without an offset are read as UTC.
pub fn parse_release_date(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if s.len() == 14 && s.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact(s);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }
    None
}
