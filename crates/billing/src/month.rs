//! Calendar month keys.
//!
//! A [`MonthKey`] names one UTC calendar month. Its canonical label is the
//! three-letter English abbreviation and the four-digit year (`Sep-2025`).
//! Parsing is lenient about the spelling it accepts so that labels typed by
//! staff (`Sept-2025`, `september 2025`, `2025-09`) land on the same key.

use core::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use pantry_core::{DomainError, DomainResult};

const MONTHS: [(&str, &str); 12] = [
    ("Jan", "january"),
    ("Feb", "february"),
    ("Mar", "march"),
    ("Apr", "april"),
    ("May", "may"),
    ("Jun", "june"),
    ("Jul", "july"),
    ("Aug", "august"),
    ("Sep", "september"),
    ("Oct", "october"),
    ("Nov", "november"),
    ("Dec", "december"),
];

/// One calendar month. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> DomainResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::InvalidMonthLabel(format!("{year}-{month}")));
        }
        if !(1..=9999).contains(&year) {
            return Err(DomainError::InvalidMonthLabel(format!("{year}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// Month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month containing the UTC instant `at`.
    pub fn containing(at: DateTime<Utc>) -> Self {
        Self::of(at.date_naive())
    }

    /// Strict parse of a month label.
    ///
    /// Accepts `<month name>[-/ ]<yyyy>` where the month name is the full
    /// English name, its three-letter abbreviation or `Sept` (any case), and
    /// the numeric forms `yyyy-mm`, `yyyy/mm` and `mm-yyyy`.
    pub fn parse(label: &str) -> DomainResult<Self> {
        let invalid = || DomainError::InvalidMonthLabel(label.to_string());

        let tokens: Vec<&str> = label
            .split(|c: char| c == '-' || c == '/' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        let [first, second] = tokens.as_slice() else {
            return Err(invalid());
        };

        let (year, month) = if first.chars().all(|c| c.is_ascii_alphabetic()) {
            (parse_year(second), month_from_name(first))
        } else if first.len() == 4 {
            (parse_year(first), parse_month_number(second))
        } else {
            (parse_year(second), parse_month_number(first))
        };

        match (year, month) {
            (Some(year), Some(month)) => Self::new(year, month).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    /// Lenient parse: unparseable labels resolve to the month of `today`.
    ///
    /// Idempotent: normalizing the canonical label of a key yields the key.
    pub fn normalize(label: &str, today: NaiveDate) -> Self {
        Self::parse(label).unwrap_or_else(|_| Self::of(today))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Three-letter English abbreviation (`Sep`).
    pub fn abbreviation(&self) -> &'static str {
        MONTHS[(self.month - 1) as usize].0
    }

    pub fn first_day(&self) -> NaiveDate {
        // Valid by construction: month in 1..=12.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Half-open UTC window `[first day 00:00, first day of next month 00:00)`.
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.first_day().and_time(chrono::NaiveTime::MIN).and_utc();
        let end = self.next().first_day().and_time(chrono::NaiveTime::MIN).and_utc();
        (start, end)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let (start, end) = self.window();
        start <= at && at < end
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    if name == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|(abbr, full)| name == abbr.to_ascii_lowercase() || name == *full)
        .map(|idx| idx as u32 + 1)
}

fn parse_year(token: &str) -> Option<i32> {
    if token.len() != 4 || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn parse_month_number(token: &str) -> Option<u32> {
    if token.is_empty() || token.len() > 2 || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

impl core::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{:04}", self.abbreviation(), self.year)
    }
}

impl FromStr for MonthKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::parse(&label).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 16).unwrap()
    }

    fn sep_2025() -> MonthKey {
        MonthKey::new(2025, 9).unwrap()
    }

    #[test]
    fn sept_spellings_share_one_key() {
        let a = MonthKey::normalize("Sept-2025", today());
        let b = MonthKey::normalize("September-2025", today());
        let c = MonthKey::normalize("Sep-2025", today());

        assert_eq!(a, sep_2025());
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.to_string(), "Sep-2025");
    }

    #[test]
    fn accepts_case_separators_and_numeric_forms() {
        for label in [
            "sep-2025",
            "SEPTEMBER 2025",
            " september/2025 ",
            "2025-09",
            "2025/9",
            "09-2025",
        ] {
            assert_eq!(MonthKey::parse(label).unwrap(), sep_2025(), "label {label:?}");
        }
    }

    #[test]
    fn strict_parse_rejects_garbage() {
        for label in ["", "Sep", "Foo-2025", "13-2025", "2025-00", "Sep-25", "Sep-2025-01"] {
            match MonthKey::parse(label) {
                Err(DomainError::InvalidMonthLabel(raw)) => assert_eq!(raw, label),
                other => panic!("expected InvalidMonthLabel for {label:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn normalize_falls_back_to_current_month() {
        assert_eq!(
            MonthKey::normalize("not a month", today()),
            MonthKey::new(2025, 10).unwrap()
        );
    }

    #[test]
    fn window_is_half_open_utc_calendar_month() {
        let (start, end) = sep_2025().window();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap());

        let last_second = Utc.with_ymd_and_hms(2025, 9, 30, 23, 59, 59).unwrap();
        assert!(sep_2025().contains(last_second));
        assert!(!sep_2025().contains(end));
        assert_eq!(MonthKey::containing(last_second), sep_2025());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let dec = MonthKey::new(2025, 12).unwrap();
        assert_eq!(dec.next(), MonthKey::new(2026, 1).unwrap());
        let (_, end) = dec.window();
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn serializes_as_canonical_label() {
        let json = serde_json::to_string(&sep_2025()).unwrap();
        assert_eq!(json, "\"Sep-2025\"");
        let back: MonthKey = serde_json::from_str("\"september-2025\"").unwrap();
        assert_eq!(back, sep_2025());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: normalization is idempotent for every spelling of a key.
        #[test]
        fn normalize_is_idempotent(year in 1i32..=9999, month in 1u32..=12, style in 0usize..4) {
            let key = MonthKey::new(year, month).unwrap();
            let label = match style {
                0 => key.to_string(),
                1 => format!("{}-{year:04}", MONTHS[(month - 1) as usize].1),
                2 => format!("{year:04}-{month:02}"),
                _ => format!("{month:02}/{year:04}"),
            };

            let once = MonthKey::normalize(&label, today());
            let twice = MonthKey::normalize(&once.to_string(), today());
            prop_assert_eq!(once, key);
            prop_assert_eq!(twice, once);
        }
    }
}
