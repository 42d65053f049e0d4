//! Tariff rates and user-selected off-peak hours.

use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

use crate::tariff::{Tariff, Zone};

/// One priced zone: sales and distribution components, both per kWh.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateComponent {
    pub sales: f64,
    pub distribution: f64,
}

impl RateComponent {
    #[must_use]
    pub const fn new(sales: f64, distribution: f64) -> Self {
        Self { sales, distribution }
    }

    /// Price actually paid per kWh.
    #[must_use]
    pub fn effective(&self) -> f64 {
        self.sales + self.distribution
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlatPricing {
    pub flat: RateComponent,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TwoZonePricing {
    pub peak: RateComponent,
    pub off_peak: RateComponent,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThreeZonePricing {
    pub peak: RateComponent,
    pub mid: RateComponent,
    pub off_peak: RateComponent,
}

/// Rates of all four tariffs.
///
/// Defaults follow the 2024 price list for households (PLN per kWh).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffPricing {
    pub g11: FlatPricing,
    pub g12: TwoZonePricing,
    pub g12w: TwoZonePricing,
    pub g13: ThreeZonePricing,
}

impl Default for TariffPricing {
    fn default() -> Self {
        Self {
            g11: FlatPricing { flat: RateComponent::new(0.6149, 0.3565) },
            g12: TwoZonePricing {
                peak: RateComponent::new(0.6712, 0.4028),
                off_peak: RateComponent::new(0.5120, 0.1220),
            },
            g12w: TwoZonePricing {
                peak: RateComponent::new(0.7680, 0.4590),
                off_peak: RateComponent::new(0.5120, 0.1164),
            },
            g13: ThreeZonePricing {
                peak: RateComponent::new(0.9590, 0.5328),
                mid: RateComponent::new(0.5779, 0.3244),
                off_peak: RateComponent::new(0.5218, 0.1016),
            },
        }
    }
}

impl TariffPricing {
    /// Rate component of the tariff's zone.
    ///
    /// A zone the tariff does not define falls back to the tariff's most expensive
    /// zone: G11 has only `Flat`, G12 and G12w have no `Mid`. Classifiers never
    /// produce such a pair.
    #[must_use]
    pub const fn component(&self, tariff: Tariff, zone: Zone) -> RateComponent {
        match (tariff, zone) {
            (Tariff::G11, _) => self.g11.flat,
            (Tariff::G12, Zone::OffPeak) => self.g12.off_peak,
            (Tariff::G12, _) => self.g12.peak,
            (Tariff::G12w, Zone::OffPeak) => self.g12w.off_peak,
            (Tariff::G12w, _) => self.g12w.peak,
            (Tariff::G13, Zone::OffPeak) => self.g13.off_peak,
            (Tariff::G13, Zone::Mid) => self.g13.mid,
            (Tariff::G13, _) => self.g13.peak,
        }
    }

    /// Effective price per kWh of the tariff's zone.
    #[must_use]
    pub fn rate(&self, tariff: Tariff, zone: Zone) -> f64 {
        self.component(tariff, zone).effective()
    }
}

/// Set of hours of the day, `0..=23`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct HourSet(u32);

impl HourSet {
    pub const EMPTY: Self = Self(0);

    /// Build a set from known-valid hours. Hours outside `0..=23` are ignored.
    #[must_use]
    pub const fn of(hours: &[u32]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < hours.len() {
            if hours[i] < 24 {
                bits |= 1 << hours[i];
            }
            i += 1;
        }
        Self(bits)
    }

    #[must_use]
    pub const fn contains(self, hour: u32) -> bool {
        hour < 24 && self.0 & (1 << hour) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(self) -> impl Iterator<Item = u32> {
        (0..24).filter(move |hour| self.contains(*hour))
    }
}

impl TryFrom<Vec<u32>> for HourSet {
    type Error = String;

    fn try_from(hours: Vec<u32>) -> Result<Self, Self::Error> {
        hours.into_iter().try_fold(Self::EMPTY, |set, hour| {
            if hour < 24 {
                Ok(Self(set.0 | (1 << hour)))
            } else {
                Err(format!("hour {hour} is out of range 0..=23"))
            }
        })
    }
}

impl<const N: usize> TryFrom<[u32; N]> for HourSet {
    type Error = String;

    fn try_from(hours: [u32; N]) -> Result<Self, Self::Error> {
        Self::try_from(hours.to_vec())
    }
}

impl From<HourSet> for Vec<u32> {
    fn from(set: HourSet) -> Self {
        set.iter().collect()
    }
}

impl Debug for HourSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Off-peak hours chosen by the consumer.
///
/// `g13_peak_hours` and `g13_mid_hours` are accepted for compatibility with older
/// configuration files but G13 zones follow the fixed seasonal table. Use
/// [`ScheduleConfig::has_g13_overrides`] to detect and report such configurations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    pub g12_off_peak_hours: HourSet,
    pub g12w_off_peak_hours: HourSet,
    pub g13_peak_hours: HourSet,
    pub g13_mid_hours: HourSet,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            g12_off_peak_hours: HourSet::of(&[22, 23, 0, 1, 2, 3, 4, 5, 6, 13, 14]),
            g12w_off_peak_hours: HourSet::of(&[22, 23, 0, 1, 2, 3, 4, 5, 13, 14]),
            g13_peak_hours: HourSet::EMPTY,
            g13_mid_hours: HourSet::EMPTY,
        }
    }
}

impl ScheduleConfig {
    /// Whether any of the unused G13 hour sets is populated.
    #[must_use]
    pub const fn has_g13_overrides(&self) -> bool {
        !self.g13_peak_hours.is_empty() || !self.g13_mid_hours.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_effective_rate() {
        let rate = RateComponent::new(0.6149, 0.3565);
        assert_abs_diff_eq!(rate.effective(), 0.9714, epsilon = 1e-12);
    }

    #[test]
    fn test_default_schedule() {
        let schedule = ScheduleConfig::default();
        assert_eq!(
            schedule.g12_off_peak_hours.iter().collect::<Vec<_>>(),
            [0, 1, 2, 3, 4, 5, 6, 13, 14, 22, 23],
        );
        assert_eq!(
            schedule.g12w_off_peak_hours.iter().collect::<Vec<_>>(),
            [0, 1, 2, 3, 4, 5, 13, 14, 22, 23],
        );
        assert!(!schedule.has_g13_overrides());
    }

    #[test]
    fn test_hour_set_rejects_out_of_range() {
        assert!(HourSet::try_from([1, 24]).is_err());
        let set = HourSet::try_from([23, 0, 0]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(0));
        assert!(set.contains(23));
        assert!(!set.contains(24));
    }

    #[test]
    fn test_component_lookup() {
        let pricing = TariffPricing::default();
        assert_eq!(pricing.component(Tariff::G11, Zone::Flat), pricing.g11.flat);
        assert_eq!(pricing.component(Tariff::G12, Zone::OffPeak), pricing.g12.off_peak);
        assert_eq!(pricing.component(Tariff::G12w, Zone::Peak), pricing.g12w.peak);
        assert_eq!(pricing.component(Tariff::G13, Zone::Mid), pricing.g13.mid);
    }
}
