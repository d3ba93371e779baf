//! Free-form date normalization
//!
//! Legacy exports write dates in a dozen different conventions. A date is
//! cleaned up, then tried against a fixed, ordered table of patterns; the
//! first pattern that parses wins. When nothing matches, the first run of
//! four digits is taken as a year. Every successful result is rendered in
//! the single canonical form `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! Embargo release dates are held to a stricter standard: see
//! [`is_expected_embargo_format`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::error;

/// Canonical timestamp format
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format embargo release dates must have (ISO date-time with numeric offset)
pub const EMBARGO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Length of `YYYY-MM-DDTHH:MM:SS`
const ISO_DATETIME_LEN: usize = 19;

type Builder = fn(&Captures) -> Option<NaiveDateTime>;

/// One entry of the ordered pattern table
struct DatePattern {
    label: &'static str,
    shape: Regex,
    /// Only the first `n` characters are matched (longer inputs only)
    prefix_len: Option<usize>,
    build: Builder,
}

impl DatePattern {
    fn new(label: &'static str, shape: &str, build: Builder) -> Self {
        Self {
            label,
            shape: Regex::new(shape).expect("date pattern shapes are valid regexes"),
            prefix_len: None,
            build,
        }
    }

    fn truncated(mut self, len: usize) -> Self {
        self.prefix_len = Some(len);
        self
    }

    fn parse(&self, clean: &str) -> Option<NaiveDateTime> {
        let candidate = match self.prefix_len {
            Some(len) => clean.get(..len)?,
            None => clean,
        };
        let caps = self.shape.captures(candidate)?;
        (self.build)(&caps)
    }
}

/// Candidate patterns in priority order. Order is the only tie-break.
static DATE_PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    vec![
        DatePattern::new("YYYY", r"^([0-9]{4})$", |c| ymd(year(c, 1)?, 1, 1)),
        DatePattern::new("YYYY-MM-DD", r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$", |c| {
            ymd(year(c, 1)?, num(c, 2)?, num(c, 3)?)
        }),
        DatePattern::new(
            "YYYY-MM-DDTHH:MM:SS",
            r"^([0-9]{4})-([0-9]{2})-([0-9]{2})T([0-9]{2}):([0-9]{2}):([0-9]{2})$",
            |c| {
                NaiveDate::from_ymd_opt(year(c, 1)?, num(c, 2)?, num(c, 3)?)?
                    .and_hms_opt(num(c, 4)?, num(c, 5)?, num(c, 6)?)
            },
        )
        .truncated(ISO_DATETIME_LEN),
        DatePattern::new("Mon D YYYY", r"^([A-Za-z]{3}) ([0-9]{1,2}) ([0-9]{4})$", |c| {
            ymd(year(c, 3)?, short_month(&c[1])?, num(c, 2)?)
        }),
        DatePattern::new("Month D YYYY", r"^([A-Za-z]+) ([0-9]{1,2}) ([0-9]{4})$", |c| {
            ymd(year(c, 3)?, long_month(&c[1])?, num(c, 2)?)
        }),
        DatePattern::new("Mon YYYY", r"^([A-Za-z]{3}) ([0-9]{4})$", |c| {
            ymd(year(c, 2)?, short_month(&c[1])?, 1)
        }),
        DatePattern::new("Month YYYY", r"^([A-Za-z]+) ([0-9]{4})$", |c| {
            ymd(year(c, 2)?, long_month(&c[1])?, 1)
        }),
        DatePattern::new("MM/DD/YYYY", r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$", |c| {
            ymd(year(c, 3)?, num(c, 1)?, num(c, 2)?)
        }),
        DatePattern::new("YYYY/MM/DD", r"^([0-9]{4})/([0-9]{2})/([0-9]{2})$", |c| {
            ymd(year(c, 1)?, num(c, 2)?, num(c, 3)?)
        }),
        DatePattern::new("D Mon YYYY", r"^([0-9]{1,2}) ([A-Za-z]{3}) ([0-9]{4})$", |c| {
            ymd(year(c, 3)?, short_month(&c[2])?, num(c, 1)?)
        }),
        DatePattern::new("D Month YYYY", r"^([0-9]{1,2}) ([A-Za-z]+) ([0-9]{4})$", |c| {
            ymd(year(c, 3)?, long_month(&c[2])?, num(c, 1)?)
        }),
        DatePattern::new("YYYY-MM", r"^([0-9]{4})-([0-9]{2})$", |c| {
            ymd(year(c, 1)?, num(c, 2)?, 1)
        }),
        DatePattern::new("M/D/YYYY", r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})$", |c| {
            ymd(year(c, 3)?, num(c, 1)?, num(c, 2)?)
        }),
        DatePattern::new("M/D/YY", r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{2})$", |c| {
            ymd(two_digit_year(num(c, 3)?), num(c, 1)?, num(c, 2)?)
        }),
        DatePattern::new("M-D-YYYY", r"^([0-9]{1,2})-([0-9]{1,2})-([0-9]{4})$", |c| {
            ymd(year(c, 3)?, num(c, 1)?, num(c, 2)?)
        }),
    ]
});

static FOUR_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{4}").expect("year fallback regex is valid"));

static EMBARGO_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}[+-][0-9]{2}:[0-9]{2}$")
        .expect("embargo shape regex is valid")
});

/// Normalize a free-form date to `YYYY-MM-DDTHH:MM:SSZ`
///
/// Never fails: returns "" (and logs an error naming the original input)
/// when no interpretation is possible.
pub fn normalize_date(date: &str) -> String {
    let clean = cleanup_date(date);
    if clean.is_empty() {
        return String::new();
    }

    if let Some((_, parsed)) = match_date_pattern(&clean) {
        return format_canonical(parsed);
    }

    if let Some(year) = extract_year(&clean) {
        return format!("{}-01-01T00:00:00Z", year);
    }

    error!("unable to interpret date [{}], setting empty", date);
    String::new()
}

/// Strip periods, the ordinal `th,` artifact and commas, then trim
pub fn cleanup_date(date: &str) -> String {
    date.replace('.', "")
        .replace("th,", "")
        .replace(',', "")
        .trim()
        .to_string()
}

/// First pattern (in priority order) that parses the cleaned string
pub fn match_date_pattern(clean: &str) -> Option<(&'static str, NaiveDateTime)> {
    DATE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.parse(clean).map(|parsed| (pattern.label, parsed)))
}

/// Render a timestamp in the canonical format
pub fn format_canonical(datetime: NaiveDateTime) -> String {
    datetime.format(CANONICAL_FORMAT).to_string()
}

/// Whether `date` is exactly `YYYY-MM-DDTHH:MM:SS±HH:MM`
///
/// No cleanup and no fallback: a dirty embargo date must not quietly turn
/// into "no embargo".
pub fn is_expected_embargo_format(date: &str) -> bool {
    EMBARGO_SHAPE.is_match(date) && DateTime::parse_from_str(date, EMBARGO_FORMAT).is_ok()
}

/// Whether a canonical (or strict embargo) date lies after the current time
pub fn in_the_future(date: &str) -> bool {
    in_the_future_at(date, lwi_common::time::now())
}

/// Whether a canonical (or strict embargo) date lies after `now`
///
/// Unparseable dates are treated as not in the future.
pub fn in_the_future_at(date: &str, now: DateTime<Utc>) -> bool {
    if date.is_empty() {
        return false;
    }

    match parse_canonical(date).or_else(|| parse_embargo(date)) {
        Some(when) => when > now,
        None => {
            error!("bad date format [{}], assuming not in the future", date);
            false
        }
    }
}

fn parse_canonical(date: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(date, CANONICAL_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_embargo(date: &str) -> Option<DateTime<Utc>> {
    if !is_expected_embargo_format(date) {
        return None;
    }
    DateTime::parse_from_str(date, EMBARGO_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn extract_year(clean: &str) -> Option<&str> {
    FOUR_DIGITS.find(clean).map(|m| m.as_str())
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

fn num(caps: &Captures, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

fn year(caps: &Captures, index: usize) -> Option<i32> {
    caps.get(index)?.as_str().parse().ok()
}

/// `69..=99` → 19xx, `00..=68` → 20xx
fn two_digit_year(yy: u32) -> i32 {
    let yy = yy as i32;
    if yy >= 69 {
        1900 + yy
    } else {
        2000 + yy
    }
}

const SHORT_MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const LONG_MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn short_month(token: &str) -> Option<u32> {
    month_index(&SHORT_MONTHS, token)
}

fn long_month(token: &str) -> Option<u32> {
    month_index(&LONG_MONTHS, token)
}

fn month_index(names: &[&str; 12], token: &str) -> Option<u32> {
    let lower = token.to_ascii_lowercase();
    names
        .iter()
        .position(|name| *name == lower)
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_every_pattern_produces_canonical_form() {
        let cases = [
            ("1998", "1998-01-01T00:00:00Z"),
            ("1998-07-04", "1998-07-04T00:00:00Z"),
            ("1998-07-04T13:45:10+00:00", "1998-07-04T13:45:10Z"),
            ("Jul 4, 1998", "1998-07-04T00:00:00Z"),
            ("July 4, 1998", "1998-07-04T00:00:00Z"),
            ("Jul 1998", "1998-07-01T00:00:00Z"),
            ("July 1998", "1998-07-01T00:00:00Z"),
            ("07/04/1998", "1998-07-04T00:00:00Z"),
            ("1998/07/04", "1998-07-04T00:00:00Z"),
            ("4 Jul 1998", "1998-07-04T00:00:00Z"),
            ("4 July 1998", "1998-07-04T00:00:00Z"),
            ("1998-07", "1998-07-01T00:00:00Z"),
            ("7/4/1998", "1998-07-04T00:00:00Z"),
            ("7/4/98", "1998-07-04T00:00:00Z"),
            ("7-4-1998", "1998-07-04T00:00:00Z"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_date(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_pattern_labels() {
        assert_eq!(match_date_pattern("2001").unwrap().0, "YYYY");
        assert_eq!(match_date_pattern("Mar 3 2001").unwrap().0, "Mon D YYYY");
        assert_eq!(match_date_pattern("March 3 2001").unwrap().0, "Month D YYYY");
        assert_eq!(match_date_pattern("3 March 2001").unwrap().0, "D Month YYYY");
        assert_eq!(match_date_pattern("3/7/01").unwrap().0, "M/D/YY");
    }

    #[test]
    fn test_earlier_pattern_wins_on_ambiguous_input() {
        // Both MM/DD/YYYY and M/D/YYYY accept a zero-padded slash date
        let (label, _) = match_date_pattern("01/02/2006").unwrap();
        assert_eq!(label, "MM/DD/YYYY");

        // Both short and long month tables contain "May"
        let (label, parsed) = match_date_pattern("May 2006").unwrap();
        assert_eq!(label, "Mon YYYY");
        assert_eq!(format_canonical(parsed), "2006-05-01T00:00:00Z");
    }

    #[test]
    fn test_empty_and_garbage() {
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("   "), "");
        assert_eq!(normalize_date("not a date"), "");
    }

    #[test]
    fn test_year_fallback_after_cleanup() {
        assert_eq!(normalize_date("Spring, 1998"), "1998-01-01T00:00:00Z");
        assert_eq!(normalize_date("circa 1850s"), "1850-01-01T00:00:00Z");
    }

    #[test]
    fn test_cleanup_removes_artifacts() {
        assert_eq!(cleanup_date(" Jan. 5th, 2001 "), "Jan 5 2001");
        assert_eq!(normalize_date("January 5th, 2001"), "2001-01-05T00:00:00Z");
        // "Sept" is neither a short nor a long month name
        assert_eq!(normalize_date("Sept. 2010"), "2010-01-01T00:00:00Z");
    }

    #[test]
    fn test_month_names_are_case_insensitive() {
        assert_eq!(normalize_date("DECEMBER 25, 2010"), "2010-12-25T00:00:00Z");
        assert_eq!(normalize_date("dec 2010"), "2010-12-01T00:00:00Z");
    }

    #[test]
    fn test_invalid_calendar_date_falls_back_to_year() {
        // February 30th fails every pattern; only the year survives
        assert_eq!(normalize_date("2001-02-30"), "2001-01-01T00:00:00Z");
        assert_eq!(normalize_date("13/01/2001"), "2001-01-01T00:00:00Z");
    }

    #[test]
    fn test_iso_datetime_is_truncated() {
        assert_eq!(
            normalize_date("2015-03-02T08:09:10.123Z"),
            "2015-03-02T08:09:10Z"
        );
        assert_eq!(normalize_date("2015-03-02T08:09:10"), "2015-03-02T08:09:10Z");
    }

    #[test]
    fn test_two_digit_year_pivot() {
        assert_eq!(normalize_date("1/2/69"), "1969-01-02T00:00:00Z");
        assert_eq!(normalize_date("1/2/68"), "2068-01-02T00:00:00Z");
        assert_eq!(normalize_date("12/31/05"), "2005-12-31T00:00:00Z");
    }

    #[test]
    fn test_canonical_output_round_trips() {
        let once = normalize_date("March 3, 2001");
        assert_eq!(normalize_date(&once), once);
    }

    #[test]
    fn test_expected_embargo_format() {
        assert!(is_expected_embargo_format("2030-01-01T00:00:00+00:00"));
        assert!(is_expected_embargo_format("2030-01-01T00:00:00-05:00"));
        assert!(!is_expected_embargo_format("2030-01-01T00:00:00Z"));
        assert!(!is_expected_embargo_format("2030-01-01"));
        assert!(!is_expected_embargo_format(" 2030-01-01T00:00:00+00:00"));
        assert!(!is_expected_embargo_format("2030-13-01T00:00:00+00:00"));
        assert!(!is_expected_embargo_format(""));
    }

    #[test]
    fn test_in_the_future() {
        let now = reference_now();
        assert!(in_the_future_at("2030-01-01T00:00:00Z", now));
        assert!(in_the_future_at("2030-01-01T00:00:00+00:00", now));
        assert!(!in_the_future_at("2020-01-01T00:00:00Z", now));
        assert!(!in_the_future_at("2020-01-01T00:00:00-05:00", now));
    }

    #[test]
    fn test_in_the_future_respects_offset() {
        let now = reference_now();
        // 2024-06-15T08:30:00-05:00 is 13:30 UTC, after noon UTC
        assert!(in_the_future_at("2024-06-15T08:30:00-05:00", now));
        // 2024-06-15T13:30:00+02:00 is 11:30 UTC, before noon UTC
        assert!(!in_the_future_at("2024-06-15T13:30:00+02:00", now));
    }

    #[test]
    fn test_unparseable_is_not_in_the_future() {
        let now = reference_now();
        assert!(!in_the_future_at("", now));
        assert!(!in_the_future_at("next year", now));
        assert!(!in_the_future_at("2030-01-01", now));
    }

    #[test]
    fn test_in_the_future_uses_wall_clock() {
        assert!(in_the_future("2999-01-01T00:00:00Z"));
        assert!(!in_the_future("1999-01-01T00:00:00Z"));
    }
}
