//! Ticks
//!
//! A tick is one step on a time axis: a calendar day, an ISO week or a month.
//! Sheets use ticks as column keys, so every tick type is ordered, hashable
//! and can be moved by a whole number of steps.
//!
//! | Type      | Text form    | Step      |
//! |-----------|--------------|-----------|
//! | [`Date`]  | `2022-01-31` | one day   |
//! | [`Week`]  | `2022-W05`   | one week  |
//! | [`Month`] | `2022-01`    | one month |
//!
//! [`Month`] also parses `2022-M01`.

use std::fmt;
use std::hash::Hash;
use std::ops::{Add, Sub};
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{Error, Result};

/// A point on a discrete time axis.
pub trait Tick:
    Copy + Ord + Hash + fmt::Debug + fmt::Display + FromStr<Err = Error> + Send + Sync + 'static
{
    /// The tick `n` steps after this one (before it if `n` is negative).
    fn offset(self, n: i64) -> Self;

    /// Number of steps from `origin` to this tick.
    fn since(self, origin: Self) -> i64;
}

macro_rules! tick_ops {
    ($($tick:ty),*) => {
        $(
            impl Add<i64> for $tick {
                type Output = $tick;

                fn add(self, n: i64) -> $tick {
                    self.offset(n)
                }
            }

            impl Sub<i64> for $tick {
                type Output = $tick;

                fn sub(self, n: i64) -> $tick {
                    self.offset(-n)
                }
            }

            impl Sub for $tick {
                type Output = i64;

                fn sub(self, origin: $tick) -> i64 {
                    self.since(origin)
                }
            }
        )*
    };
}

tick_ops!(Date, Week, Month);

fn invalid(kind: &'static str, input: &str) -> Error {
    Error::InvalidFormat {
        kind,
        input: input.to_string(),
    }
}

// ----------------------------------------------------------------------------
// Date
// ----------------------------------------------------------------------------

/// A calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(NaiveDate);

impl Date {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or_else(|| invalid("Date", &format!("{year:04}-{month:02}-{day:02}")))
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl Tick for Date {
    fn offset(self, n: i64) -> Self {
        Date(self.0 + Duration::days(n))
    }

    fn since(self, origin: Self) -> i64 {
        (self.0 - origin.0).num_days()
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), self.0.month(), self.0.day())
    }
}

impl FromStr for Date {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Date)
            .map_err(|_| invalid("Date", s))
    }
}

// ----------------------------------------------------------------------------
// Week
// ----------------------------------------------------------------------------

/// An ISO 8601 week, stored as its Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Week(NaiveDate);

impl Week {
    /// ISO week `week` of ISO year `year`.
    pub fn new(year: i32, week: u32) -> Result<Self> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(Week)
            .ok_or_else(|| invalid("Week", &format!("{year:04}-W{week:02}")))
    }

    /// The ISO week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        Week(monday)
    }

    pub fn year(&self) -> i32 {
        self.0.iso_week().year()
    }

    pub fn week(&self) -> u32 {
        self.0.iso_week().week()
    }
}

impl Tick for Week {
    fn offset(self, n: i64) -> Self {
        Week(self.0 + Duration::weeks(n))
    }

    fn since(self, origin: Self) -> i64 {
        (self.0 - origin.0).num_days() / 7
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year(), self.week())
    }
}

impl FromStr for Week {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (year, week) = s.split_once("-W").ok_or_else(|| invalid("Week", s))?;
        if year.len() != 4 || week.len() != 2 {
            return Err(invalid("Week", s));
        }
        let year = year.parse().map_err(|_| invalid("Week", s))?;
        let week = week.parse().map_err(|_| invalid("Week", s))?;
        Week::new(year, week).map_err(|_| invalid("Week", s))
    }
}

// ----------------------------------------------------------------------------
// Month
// ----------------------------------------------------------------------------

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if (1..=12).contains(&month) {
            Ok(Month { year, month })
        } else {
            Err(invalid("Month", &format!("{year:04}-{month:02}")))
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    // Months since year 0, January.
    fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Month {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }
}

impl Tick for Month {
    fn offset(self, n: i64) -> Self {
        Month::from_ordinal(self.ordinal() + n)
    }

    fn since(self, origin: Self) -> i64 {
        self.ordinal() - origin.ordinal()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s.split_once('-').ok_or_else(|| invalid("Month", s))?;
        let month = month.strip_prefix('M').unwrap_or(month);
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid("Month", s));
        }
        let year = year.parse().map_err(|_| invalid("Month", s))?;
        let month = month.parse().map_err(|_| invalid("Month", s))?;
        Month::new(year, month).map_err(|_| invalid("Month", s))
    }
}

// ----------------------------------------------------------------------------
// Ranges
// ----------------------------------------------------------------------------

/// Ticks at offsets `start, start + step, ..` from `origin`, stopping before
/// `stop`.
///
/// `start` defaults to 0. A missing or zero `step` becomes 1 or -1, whichever
/// moves towards `stop`. Fails with [`Error::UnterminatingSlice`] when `stop`
/// is missing or `step` points away from it.
pub fn slice<T: Tick>(
    origin: T,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<T>> {
    let unterminating = || Error::UnterminatingSlice {
        start: start.unwrap_or(0),
        stop,
        step,
    };

    let from = start.unwrap_or(0);
    let to = stop.ok_or_else(unterminating)?;
    let step = step
        .filter(|&s| s != 0)
        .unwrap_or(if from < to { 1 } else { -1 });

    if (from < to && step <= 0) || (from > to && step >= 0) {
        return Err(unterminating());
    }

    let stride = step.unsigned_abs() as usize;
    let ticks = if step > 0 {
        (from..to).step_by(stride).map(|i| origin.offset(i)).collect()
    } else {
        (to + 1..=from)
            .rev()
            .step_by(stride)
            .map(|i| origin.offset(i))
            .collect()
    };
    Ok(ticks)
}

/// Every tick from `first` through `last`, inclusive. Empty if `last < first`.
pub fn span<T: Tick>(first: T, last: T) -> Vec<T> {
    (0..=last.since(first)).map(|i| first.offset(i)).collect()
}
