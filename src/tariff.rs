//! Zone classification of a single hour under each tariff.

use std::{
    fmt::{Display, Formatter},
    ops::Range,
};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;

use crate::{
    holiday::HolidayCalendar,
    pricing::{ScheduleConfig, TariffPricing},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tariff {
    G11,
    G12,
    G12w,
    G13,
}

impl Tariff {
    pub const ALL: [Self; 4] = [Self::G11, Self::G12, Self::G12w, Self::G13];

    /// Position of the tariff in [`Tariff::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::G11 => 0,
            Self::G12 => 1,
            Self::G12w => 2,
            Self::G13 => 3,
        }
    }

    /// Zones the tariff bills, most expensive first.
    #[must_use]
    pub const fn zones(self) -> &'static [Zone] {
        match self {
            Self::G11 => &[Zone::Flat],
            Self::G12 | Self::G12w => &[Zone::Peak, Zone::OffPeak],
            Self::G13 => &[Zone::Peak, Zone::Mid, Zone::OffPeak],
        }
    }

    #[must_use]
    pub fn classify(
        self,
        timestamp: NaiveDateTime,
        day: DayKind,
        schedule: &ScheduleConfig,
    ) -> Zone {
        match self {
            Self::G11 => g11(),
            Self::G12 => g12(timestamp.hour(), schedule),
            Self::G12w => g12w(timestamp.hour(), day, schedule),
            Self::G13 => g13(timestamp, day),
        }
    }

    /// Zone together with its effective rate.
    #[must_use]
    pub fn classify_with_rate(
        self,
        timestamp: NaiveDateTime,
        day: DayKind,
        pricing: &TariffPricing,
        schedule: &ScheduleConfig,
    ) -> (Zone, f64) {
        let zone = self.classify(timestamp, day, schedule);
        (zone, pricing.rate(self, zone))
    }
}

impl Display for Tariff {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::G11 => "G11",
            Self::G12 => "G12",
            Self::G12w => "G12w",
            Self::G13 => "G13",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Flat,
    Peak,
    Mid,
    OffPeak,
}

impl Display for Zone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Flat => "flat",
            Self::Peak => "peak",
            Self::Mid => "mid",
            Self::OffPeak => "off-peak",
        })
    }
}

/// Working day or free day (weekend or public holiday).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayKind {
    Working,
    Free,
}

impl DayKind {
    pub fn of(date: NaiveDate, calendar: &mut HolidayCalendar) -> Self {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || calendar.is_holiday(date) {
            Self::Free
        } else {
            Self::Working
        }
    }

    #[must_use]
    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }
}

const fn g11() -> Zone {
    Zone::Flat
}

const fn g12(hour: u32, schedule: &ScheduleConfig) -> Zone {
    if schedule.g12_off_peak_hours.contains(hour) { Zone::OffPeak } else { Zone::Peak }
}

const fn g12w(hour: u32, day: DayKind, schedule: &ScheduleConfig) -> Zone {
    if day.is_free() || schedule.g12w_off_peak_hours.contains(hour) {
        Zone::OffPeak
    } else {
        Zone::Peak
    }
}

/// Working-day G13 hours. Off-peak ranges crossing midnight are split in two.
struct G13Season {
    off_peak: [Range<u32>; 3],
    mid: Range<u32>,
}

const G13_SUMMER: G13Season = G13Season { off_peak: [13..19, 22..24, 0..7], mid: 7..13 };
const G13_WINTER: G13Season = G13Season { off_peak: [13..16, 21..24, 0..7], mid: 7..13 };

/// April through September.
const fn is_summer(month: u32) -> bool {
    matches!(month, 4..=9)
}

fn g13(timestamp: NaiveDateTime, day: DayKind) -> Zone {
    if day.is_free() {
        return Zone::OffPeak;
    }
    let season = if is_summer(timestamp.month()) { &G13_SUMMER } else { &G13_WINTER };
    let hour = timestamp.hour();
    if season.off_peak.iter().any(|range| range.contains(&hour)) {
        Zone::OffPeak
    } else if season.mid.contains(&hour) {
        Zone::Mid
    } else {
        Zone::Peak
    }
}
