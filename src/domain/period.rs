//! Quarter periods and period-label parsing.
//!
//! Borrower and stock records arrive with monthly periods, grant records with
//! quarterly ones. Everything is normalised to [`Quarter`] at load time so the
//! engine only ever compares chronological keys, never label text.

use crate::domain::error::SabiaError;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// A calendar quarter. Ordering is chronological: `year * 4 + (index - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quarter {
    year: i32,
    index: u8,
}

impl Quarter {
    pub fn new(year: i32, index: u8) -> Option<Self> {
        (1..=4).contains(&index).then_some(Self { year, index })
    }

    pub fn from_month(year: i32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        Self::new(year, ((month - 1) / 3 + 1) as u8)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            index: ((date.month0() / 3) + 1) as u8,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based quarter within the year.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Chronological sort key.
    pub fn key(&self) -> i64 {
        self.year as i64 * 4 + (self.index as i64 - 1)
    }

    fn from_key(key: i64) -> Self {
        Self {
            year: key.div_euclid(4) as i32,
            index: (key.rem_euclid(4) + 1) as u8,
        }
    }

    /// The quarter `n` steps away (negative steps go back in time).
    pub fn offset(&self, n: i64) -> Self {
        Self::from_key(self.key() + n)
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }
}

impl Ord for Quarter {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Quarter {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.index)
    }
}

impl FromStr for Quarter {
    type Err = SabiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_quarter(s)
    }
}

fn invalid(value: &str) -> SabiaError {
    SabiaError::InvalidPeriod {
        value: value.to_string(),
    }
}

fn parse_year(s: &str) -> Option<i32> {
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Parses a monthly period and maps it onto its quarter.
///
/// Accepts `YYYY-MM`, `YYYY-MM-DD`, `YYYYMM` and `MM/YYYY`.
pub fn parse_month(value: &str) -> Result<Quarter, SabiaError> {
    let s = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Quarter::from_date(date));
    }

    let (year, month) = if let Some((y, m)) = s.split_once('-') {
        (parse_year(y), m.parse::<u32>().ok())
    } else if let Some((m, y)) = s.split_once('/') {
        (parse_year(y), m.parse::<u32>().ok())
    } else if s.len() == 6 && s.chars().all(|c| c.is_ascii_digit()) {
        (parse_year(&s[..4]), s[4..].parse::<u32>().ok())
    } else {
        (None, None)
    };

    match (year, month) {
        (Some(y), Some(m)) => Quarter::from_month(y, m).ok_or_else(|| invalid(value)),
        _ => Err(invalid(value)),
    }
}

/// Parses a quarterly period label.
///
/// Accepts `YYYY-Qn`, `YYYYQn`, `YYYY-n`, `nT YYYY` and `nTYYYY`.
pub fn parse_quarter(value: &str) -> Result<Quarter, SabiaError> {
    let s = value.trim().to_ascii_uppercase();

    let parts = if let Some(pos) = s.find('Q') {
        let year = s[..pos].trim_end_matches(['-', ' ']);
        Some((year.to_string(), s[pos + 1..].to_string()))
    } else if let Some(pos) = s.find('T') {
        Some((s[pos + 1..].trim().to_string(), s[..pos].trim().to_string()))
    } else {
        s.split_once('-')
            .map(|(y, q)| (y.to_string(), q.to_string()))
    };

    let (year, index) = parts.ok_or_else(|| invalid(value))?;
    let year = parse_year(&year).ok_or_else(|| invalid(value))?;
    let index: u8 = index.trim().parse().map_err(|_| invalid(value))?;
    Quarter::new(year, index).ok_or_else(|| invalid(value))
}
