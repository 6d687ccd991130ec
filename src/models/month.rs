//! Calendar month key (`YYYY-MM`).

use core::str::FromStr;

use chrono::{Datelike as _, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BudgetPilotError, Result};

/// A calendar month used to bucket transactions.
///
/// Internally the first day of the month, so the derived ordering is
/// chronological and matches the lexicographic order of the `YYYY-MM`
/// string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    /// Creates a month key from a year and a 1-based month.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetPilotError::InvalidMonth`] if the month is outside
    /// `1..=12` or the year is outside the supported calendar range.
    #[inline]
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| BudgetPilotError::InvalidMonth(format!("{year:04}-{month:02}")))
    }

    /// Returns the month containing `date`.
    #[inline]
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists in every month.
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Calendar year.
    #[inline]
    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// Month number, 1-based.
    #[inline]
    #[must_use]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// First day of the month.
    #[inline]
    #[must_use]
    pub const fn first_day(self) -> NaiveDate {
        self.0
    }

    /// The month before this one, or `None` at the start of the calendar.
    #[inline]
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.0.checked_sub_months(Months::new(1)).map(Self)
    }

    /// The month after this one, or `None` at the end of the calendar.
    #[inline]
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }

    /// Returns `true` if `date` falls within this month.
    #[inline]
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        Self::from_date(date) == self
    }
}

impl core::fmt::Display for MonthKey {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthKey {
    type Err = BudgetPilotError;

    #[inline]
    fn from_str(value: &str) -> Result<Self> {
        let invalid = || BudgetPilotError::InvalidMonth(value.to_owned());
        let (year_part, month_part) = value.trim().split_once('-').ok_or_else(invalid)?;
        let is_digits = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|byte| byte.is_ascii_digit())
        };
        if !is_digits(year_part, 4) || !is_digits(month_part, 2) {
            return Err(invalid());
        }
        let year: i32 = year_part.parse().map_err(|_err| invalid())?;
        let month: u32 = month_part.parse().map_err(|_err| invalid())?;
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Serialize for MonthKey {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_and_display() {
        let key: MonthKey = "2024-03".parse().unwrap();
        assert_eq!(key.year(), 2024);
        assert_eq!(key.month(), 3);
        assert_eq!(key.to_string(), "2024-03");
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["2024-13", "2024-00", "2024-1", "24-01", "2024/01", "", "abcd-ef"] {
            assert!(bad.parse::<MonthKey>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn ordering_is_chronological() {
        let mut keys: Vec<MonthKey> = ["2024-02", "2023-12", "2024-10", "2024-01"]
            .iter()
            .map(|raw| raw.parse().unwrap())
            .collect();
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["2023-12", "2024-01", "2024-02", "2024-10"]);
    }

    #[test]
    fn previous_and_next_cross_year_boundaries() {
        let jan = MonthKey::new(2024, 1).unwrap();
        assert_eq!(jan.previous().unwrap().to_string(), "2023-12");
        let dec = MonthKey::new(2023, 12).unwrap();
        assert_eq!(dec.next().unwrap(), jan);
    }

    #[test]
    fn from_date_and_contains() {
        let key = MonthKey::from_date(date(2024, 2, 29));
        assert_eq!(key.to_string(), "2024-02");
        assert_eq!(key.first_day(), date(2024, 2, 1));
        assert!(key.contains(date(2024, 2, 1)));
        assert!(!key.contains(date(2024, 3, 1)));
    }

    #[test]
    fn serde_as_string() {
        let key = MonthKey::new(2024, 7).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#""2024-07""#);
        let back: MonthKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<MonthKey>(r#""July""#).is_err());
    }
}
