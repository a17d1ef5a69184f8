use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Window used when no selector is given on the command line.
pub const DEFAULT_DAYS: i64 = 7;
/// Relative day counts must lie strictly within `-MAX_DAYS..MAX_DAYS`.
pub const MAX_DAYS: i64 = 100;

/// The single query a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Positive: the past N days, today included. Negative: only the day N days ago.
    RelativeDays(i64),
    Date(NaiveDate),
    Month { year: i32, month: u32 },
    Year(i32),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::RelativeDays(DEFAULT_DAYS)
    }
}

/// Raw selector values as they come off the command line. A flag given
/// twice keeps both values so the repeat counts against the one-selector rule.
#[derive(Debug, Default, Clone)]
pub struct SelectorArgs {
    pub days: Option<i64>,
    pub date: Vec<String>,
    pub month: Vec<String>,
    pub year: Vec<String>,
}

impl SelectorArgs {
    fn count(&self) -> usize {
        usize::from(self.days.is_some()) + self.date.len() + self.month.len() + self.year.len()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UsageError {
    #[error("Too many arguments passed")]
    TooManyArguments,
    #[error("Number out of bounds")]
    NumberOutOfBounds(i64),
    #[error("Invalid date '{0}', expected YYYY-M-D")]
    InvalidDate(String),
    #[error("Invalid month '{0}', expected YYYY-M")]
    InvalidMonth(String),
    #[error("Invalid year '{0}', expected YYYY")]
    InvalidYear(String),
}

impl Selection {
    /// Builds the selection from the command line selectors.
    ///
    /// At most one selector may be present. With none, the default window of
    /// [`DEFAULT_DAYS`] is used. When several selectors reach the resolution
    /// step the precedence is days, then date, then month, then year.
    pub fn from_selectors(args: &SelectorArgs) -> Result<Self, UsageError> {
        if args.count() > 1 {
            return Err(UsageError::TooManyArguments);
        }
        Self::by_precedence(args)
    }

    fn by_precedence(args: &SelectorArgs) -> Result<Self, UsageError> {
        if let Some(days) = args.days {
            return relative_days(days);
        }
        if let Some(date) = args.date.first() {
            return parse_date(date).map(Selection::Date);
        }
        if let Some(month) = args.month.first() {
            let (year, month) = parse_month(month)?;
            return Ok(Selection::Month { year, month });
        }
        if let Some(year) = args.year.first() {
            return parse_year(year).map(Selection::Year);
        }
        Ok(Selection::default())
    }
}

fn relative_days(days: i64) -> Result<Selection, UsageError> {
    if days != 0 && -MAX_DAYS < days && days < MAX_DAYS {
        Ok(Selection::RelativeDays(days))
    } else {
        Err(UsageError::NumberOutOfBounds(days))
    }
}

/// Parses `YYYY-M-D`; zero padding on month and day is optional.
pub fn parse_date(value: &str) -> Result<NaiveDate, UsageError> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| UsageError::InvalidDate(value.to_string()))?;
    if !valid_year(date.year()) {
        return Err(UsageError::InvalidDate(value.to_string()));
    }
    Ok(date)
}

/// Parses `YYYY-M` into a year and a month number.
pub fn parse_month(value: &str) -> Result<(i32, u32), UsageError> {
    let invalid = || UsageError::InvalidMonth(value.to_string());

    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;

    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(_) if valid_year(year) => Ok((year, month)),
        _ => Err(invalid()),
    }
}

pub fn parse_year(value: &str) -> Result<i32, UsageError> {
    match value.trim().parse::<i32>() {
        Ok(year) if valid_year(year) => Ok(year),
        _ => Err(UsageError::InvalidYear(value.to_string())),
    }
}

fn valid_year(year: i32) -> bool {
    (1..=9999).contains(&year)
}
