//! Monthly cost and zone energy under every tariff.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::{Display, Formatter},
};

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

use crate::{
    holiday::HolidayCalendar,
    prelude::*,
    pricing::{ScheduleConfig, TariffPricing},
    reading::Reading,
    tariff::{DayKind, Tariff, Zone},
};

/// Calendar month, displayed as `YYYY-MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    #[must_use]
    pub fn of(timestamp: NaiveDateTime) -> Self {
        Self { year: timestamp.year(), month: timestamp.month() }
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Energy subtotal per zone, kWh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ZoneEnergy {
    pub flat: f64,
    pub peak: f64,
    pub mid: f64,
    pub off_peak: f64,
}

impl ZoneEnergy {
    #[must_use]
    pub const fn get(&self, zone: Zone) -> f64 {
        match zone {
            Zone::Flat => self.flat,
            Zone::Peak => self.peak,
            Zone::Mid => self.mid,
            Zone::OffPeak => self.off_peak,
        }
    }

    fn get_mut(&mut self, zone: Zone) -> &mut f64 {
        match zone {
            Zone::Flat => &mut self.flat,
            Zone::Peak => &mut self.peak,
            Zone::Mid => &mut self.mid,
            Zone::OffPeak => &mut self.off_peak,
        }
    }

    pub fn add(&mut self, zone: Zone, kwh: f64) {
        *self.get_mut(zone) += kwh;
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.flat + self.peak + self.mid + self.off_peak
    }

    fn merge(&mut self, other: &Self) {
        self.flat += other.flat;
        self.peak += other.peak;
        self.mid += other.mid;
        self.off_peak += other.off_peak;
    }
}

/// What one tariff would bill.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TariffUsage {
    pub tariff: Tariff,
    pub cost: f64,
    pub zones: ZoneEnergy,
}

impl TariffUsage {
    const fn empty(tariff: Tariff) -> Self {
        Self {
            tariff,
            cost: 0.0,
            zones: ZoneEnergy { flat: 0.0, peak: 0.0, mid: 0.0, off_peak: 0.0 },
        }
    }

    fn all_empty() -> [Self; 4] {
        Tariff::ALL.map(Self::empty)
    }

    /// Price the accumulated zone energy.
    fn price(&mut self, pricing: &TariffPricing) {
        self.cost = self
            .tariff
            .zones()
            .iter()
            .map(|zone| self.zones.get(*zone) * pricing.rate(self.tariff, *zone))
            .sum();
    }

    fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.tariff, other.tariff);
        self.cost += other.cost;
        self.zones.merge(&other.zones);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyResult {
    pub month: MonthKey,
    pub total_kwh: f64,

    /// Indexed by [`Tariff::index`].
    pub tariffs: [TariffUsage; 4],
}

impl MonthlyResult {
    #[must_use]
    pub fn new(month: MonthKey) -> Self {
        Self { month, total_kwh: 0.0, tariffs: TariffUsage::all_empty() }
    }

    #[must_use]
    pub const fn usage(&self, tariff: Tariff) -> &TariffUsage {
        &self.tariffs[tariff.index()]
    }

    #[must_use]
    pub const fn cost(&self, tariff: Tariff) -> f64 {
        self.usage(tariff).cost
    }

    fn add(&mut self, reading: &Reading, day: DayKind, schedule: &ScheduleConfig) {
        self.total_kwh += reading.kwh;
        for usage in &mut self.tariffs {
            let zone = usage.tariff.classify(reading.timestamp, day, schedule);
            usage.zones.add(zone, reading.kwh);
        }
    }

    fn price(&mut self, pricing: &TariffPricing) {
        for usage in &mut self.tariffs {
            usage.price(pricing);
        }
    }

    /// Add another partial result for the same month.
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.month, other.month);
        self.total_kwh += other.total_kwh;
        for (usage, other) in self.tariffs.iter_mut().zip(&other.tariffs) {
            usage.merge(other);
        }
    }
}

/// Fold the readings into one result per month, in chronological order.
///
/// Readings are folded in a canonical order, so any permutation of the same
/// readings produces bit-identical sums.
#[must_use]
#[instrument(skip_all, fields(n_readings = readings.len()))]
pub fn aggregate(
    readings: &[Reading],
    pricing: &TariffPricing,
    schedule: &ScheduleConfig,
) -> Vec<MonthlyResult> {
    let mut ordered = readings.to_vec();
    ordered.sort_by(|lhs, rhs| {
        lhs.timestamp.cmp(&rhs.timestamp).then_with(|| lhs.kwh.total_cmp(&rhs.kwh))
    });

    let mut calendar = HolidayCalendar::new();
    let mut monthly: HashMap<MonthKey, MonthlyResult> = HashMap::new();
    for reading in &ordered {
        let day = DayKind::of(reading.timestamp.date(), &mut calendar);
        monthly
            .entry(MonthKey::of(reading.timestamp))
            .or_insert_with_key(|month| MonthlyResult::new(*month))
            .add(reading, day, schedule);
    }

    let mut results: Vec<_> = monthly.into_values().collect();
    for result in &mut results {
        result.price(pricing);
    }
    results.sort_by_key(|result| result.month);
    debug!(n_months = results.len(), "aggregated");
    results
}

/// Combine two chunked aggregations, adding up months present in both.
#[must_use]
pub fn merge_months(lhs: Vec<MonthlyResult>, rhs: Vec<MonthlyResult>) -> Vec<MonthlyResult> {
    let mut merged: BTreeMap<MonthKey, MonthlyResult> = BTreeMap::new();
    for result in lhs.into_iter().chain(rhs) {
        match merged.get_mut(&result.month) {
            Some(existing) => existing.merge(&result),
            None => {
                merged.insert(result.month, result);
            }
        }
    }
    merged.into_values().collect()
}

/// Totals over the whole analysed period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub n_months: usize,
    pub total_kwh: f64,
    pub tariffs: [TariffUsage; 4],
}

impl Summary {
    #[must_use]
    pub fn from_months(months: &[MonthlyResult]) -> Self {
        let mut tariffs = TariffUsage::all_empty();
        let mut total_kwh = 0.0;
        for month in months {
            total_kwh += month.total_kwh;
            for (usage, monthly) in tariffs.iter_mut().zip(&month.tariffs) {
                usage.merge(monthly);
            }
        }
        Self { n_months: months.len(), total_kwh, tariffs }
    }

    #[must_use]
    pub const fn usage(&self, tariff: Tariff) -> &TariffUsage {
        &self.tariffs[tariff.index()]
    }

    /// Tariffs from the cheapest to the most expensive. Ties keep [`Tariff::ALL`] order.
    #[must_use]
    pub fn ranking(&self) -> [TariffUsage; 4] {
        let mut ranking = self.tariffs;
        ranking.sort_by(|lhs, rhs| lhs.cost.total_cmp(&rhs.cost));
        ranking
    }

    /// The cheapest tariff, or `None` when nothing was aggregated.
    #[must_use]
    pub fn best(&self) -> Option<Tariff> {
        (self.n_months != 0).then(|| self.ranking()[0].tariff)
    }

    /// Difference between the most and the least expensive tariff.
    #[must_use]
    pub fn savings(&self) -> f64 {
        let ranking = self.ranking();
        ranking[3].cost - ranking[0].cost
    }

    /// Fraction of the total energy billed in the zone, `0.0..=1.0`.
    #[must_use]
    pub fn zone_share(&self, tariff: Tariff, zone: Zone) -> f64 {
        if self.total_kwh > 0.0 { self.usage(tariff).zones.get(zone) / self.total_kwh } else { 0.0 }
    }
}

/// Energy per hour of day, summed by calendar month (`1..=12`) across all years.
#[must_use]
pub fn hourly_profile(readings: &[Reading]) -> BTreeMap<u32, [f64; 24]> {
    let mut profile: BTreeMap<u32, [f64; 24]> = BTreeMap::new();
    for reading in readings {
        let hours = profile.entry(reading.timestamp.month()).or_insert([0.0; 24]);
        hours[reading.timestamp.hour() as usize] += reading.kwh;
    }
    profile
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::{NaiveDate, NaiveTime, TimeDelta};

    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
    }

    /// Hourly readings with slightly varying energy, starting at `start`.
    fn hourly(start: NaiveDateTime, n_hours: i64) -> Vec<Reading> {
        (0..n_hours)
            .map(|i| Reading::new(start + TimeDelta::hours(i), 0.1 + (i % 7) as f64 * 0.37))
            .collect()
    }

    fn run(readings: &[Reading]) -> Vec<MonthlyResult> {
        aggregate(readings, &TariffPricing::default(), &ScheduleConfig::default())
    }

    #[test]
    fn test_month_key() {
        let key = MonthKey::of(at(2024, 3, 9, 5));
        assert_eq!(key.to_string(), "2024-03");
        assert!(MonthKey { year: 2023, month: 12 } < MonthKey { year: 2024, month: 1 });
    }

    #[test]
    fn test_empty() {
        assert!(run(&[]).is_empty());
        let summary = Summary::from_months(&[]);
        assert_eq!(summary.best(), None);
        assert_abs_diff_eq!(summary.zone_share(Tariff::G12, Zone::Peak), 0.0);
    }

    #[test]
    fn test_months_are_sorted_across_years() {
        let results = run(&[
            Reading::new(at(2025, 1, 2, 10), 1.0),
            Reading::new(at(2024, 12, 2, 10), 2.0),
            Reading::new(at(2024, 1, 2, 10), 3.0),
        ]);
        let months: Vec<_> = results.iter().map(|result| result.month.to_string()).collect();
        assert_eq!(months, ["2024-01", "2024-12", "2025-01"]);
    }

    #[test]
    fn test_zone_energy_adds_up() {
        // March through June:
        let results = run(&hourly(at(2024, 3, 25, 0), 24 * 70));
        assert_eq!(results.len(), 4);
        for result in &results {
            for tariff in Tariff::ALL {
                let zones = result.usage(tariff).zones.total();
                assert_relative_eq!(zones, result.total_kwh, max_relative = 1e-9);
            }
        }
    }

    #[test]
    #[expect(clippy::float_cmp)]
    fn test_g11_cost_is_exact() {
        let pricing = TariffPricing::default();
        for result in run(&hourly(at(2024, 1, 1, 0), 24 * 40)) {
            assert_eq!(result.cost(Tariff::G11), result.total_kwh * pricing.g11.flat.effective());
        }
    }

    #[test]
    fn test_order_independent() {
        let readings = hourly(at(2024, 4, 28, 0), 24 * 10);
        let mut shuffled = readings.clone();
        shuffled.reverse();
        shuffled.swap(3, 100);
        shuffled.rotate_left(17);
        assert_eq!(run(&readings), run(&shuffled));
    }

    #[test]
    fn test_idempotent() {
        let readings = hourly(at(2024, 10, 1, 0), 24 * 45);
        assert_eq!(run(&readings), run(&readings));
    }

    #[test]
    fn test_easter_monday_is_off_peak() {
        // 2024-04-01 is Easter Monday, 2024-04-02 an ordinary Tuesday:
        let results =
            run(&[Reading::new(at(2024, 4, 1, 20), 1.0), Reading::new(at(2024, 4, 2, 20), 2.0)]);
        let g13 = results[0].usage(Tariff::G13).zones;
        assert_abs_diff_eq!(g13.off_peak, 1.0);
        assert_abs_diff_eq!(g13.peak, 2.0);
        let g12w = results[0].usage(Tariff::G12w).zones;
        assert_abs_diff_eq!(g12w.off_peak, 1.0);
        assert_abs_diff_eq!(g12w.peak, 2.0);
    }

    #[test]
    fn test_merge_chunks() {
        let readings = hourly(at(2024, 5, 20, 0), 24 * 20);
        let whole = run(&readings);
        let (head, tail) = readings.split_at(24 * 9 + 5);
        let merged = merge_months(run(head), run(tail));
        assert_eq!(merged.len(), whole.len());
        for (merged, whole) in merged.iter().zip(&whole) {
            assert_eq!(merged.month, whole.month);
            assert_relative_eq!(merged.total_kwh, whole.total_kwh, max_relative = 1e-9);
            for tariff in Tariff::ALL {
                assert_relative_eq!(merged.cost(tariff), whole.cost(tariff), max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_summary() {
        let results = run(&hourly(at(2024, 6, 1, 0), 24 * 61));
        let summary = Summary::from_months(&results);
        assert_eq!(summary.n_months, 2);

        let ranking = summary.ranking();
        assert!(ranking.windows(2).all(|pair| pair[0].cost <= pair[1].cost));
        assert_eq!(summary.best(), Some(ranking[0].tariff));
        assert_abs_diff_eq!(summary.savings(), ranking[3].cost - ranking[0].cost);

        let expected_g11: f64 = results.iter().map(|result| result.cost(Tariff::G11)).sum();
        assert_relative_eq!(summary.usage(Tariff::G11).cost, expected_g11, max_relative = 1e-12);

        let shares: f64 =
            Tariff::G13.zones().iter().map(|zone| summary.zone_share(Tariff::G13, *zone)).sum();
        assert_relative_eq!(shares, 1.0, max_relative = 1e-9);
        assert_relative_eq!(summary.zone_share(Tariff::G11, Zone::Flat), 1.0, max_relative = 1e-9);
    }

    #[test]
    fn test_hourly_profile() {
        let readings = [
            Reading::new(at(2023, 7, 3, 5), 1.0),
            Reading::new(at(2024, 7, 9, 5), 2.0),
            Reading::new(at(2024, 8, 9, 23), 0.5),
        ];
        let profile = hourly_profile(&readings);
        assert_eq!(profile.keys().copied().collect::<Vec<_>>(), [7, 8]);
        assert_abs_diff_eq!(profile[&7][5], 3.0);
        assert_abs_diff_eq!(profile[&8][23], 0.5);
        assert_abs_diff_eq!(profile[&8][0], 0.0);
    }
}
