//! Polish public holidays.
//!
//! Nine holidays fall on the same month and day every year. The remaining three
//! (Easter Sunday, Easter Monday and Corpus Christi) move with the Gregorian
//! Easter date.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};

/// Holidays that land on the same `(month, day)` in every year.
const FIXED_HOLIDAYS: [(u32, u32); 9] = [
    (1, 1),   // New Year's Day
    (1, 6),   // Epiphany
    (5, 1),   // Labour Day
    (5, 3),   // Constitution Day
    (8, 15),  // Assumption of Mary
    (11, 1),  // All Saints' Day
    (11, 11), // Independence Day
    (12, 25), // Christmas Day
    (12, 26), // Second day of Christmas
];

/// Corpus Christi is the sixtieth day after Easter Sunday.
const CORPUS_CHRISTI_OFFSET: u64 = 60;

/// Easter Sunday for the given year (anonymous Gregorian computus).
///
/// Returns `None` only for years chrono cannot represent.
#[must_use]
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b.div_euclid(4);
    let e = b.rem_euclid(4);
    let f = (b + 8).div_euclid(25);
    let g = (b - f + 1).div_euclid(3);
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c.div_euclid(4);
    let k = c.rem_euclid(4);
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l).div_euclid(451);
    let n = h + l - 7 * m + 114;
    let month = u32::try_from(n.div_euclid(31)).ok()?;
    let day = u32::try_from(n.rem_euclid(31) + 1).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The Easter-derived holidays of a single year.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveableFeasts {
    pub easter_sunday: NaiveDate,
    pub easter_monday: NaiveDate,
    pub corpus_christi: NaiveDate,
}

impl MoveableFeasts {
    #[must_use]
    pub fn for_year(year: i32) -> Option<Self> {
        let easter_sunday = easter_sunday(year)?;
        Some(Self {
            easter_sunday,
            easter_monday: easter_sunday.checked_add_days(Days::new(1))?,
            corpus_christi: easter_sunday.checked_add_days(Days::new(CORPUS_CHRISTI_OFFSET))?,
        })
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date == self.easter_sunday || date == self.easter_monday || date == self.corpus_christi
    }
}

fn is_fixed_holiday(date: NaiveDate) -> bool {
    FIXED_HOLIDAYS.contains(&(date.month(), date.day()))
}

/// Whether the date is a public holiday in Poland.
#[must_use]
pub fn is_holiday(date: NaiveDate) -> bool {
    is_fixed_holiday(date)
        || MoveableFeasts::for_year(date.year()).is_some_and(|feasts| feasts.contains(date))
}

/// Holiday lookup that computes the moveable feasts once per year.
///
/// Meant to live for the duration of a single aggregation.
#[derive(Default)]
pub struct HolidayCalendar {
    feasts: HashMap<i32, Option<MoveableFeasts>>,
}

impl HolidayCalendar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_holiday(&mut self, date: NaiveDate) -> bool {
        if is_fixed_holiday(date) {
            return true;
        }
        self.feasts
            .entry(date.year())
            .or_insert_with(|| MoveableFeasts::for_year(date.year()))
            .is_some_and(|feasts| feasts.contains(date))
    }
}
