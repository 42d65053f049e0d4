use std::fmt::{Display, Formatter};

pub struct FormattedCost(pub f64);

impl Display for FormattedCost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} zł", self.0)
    }
}

pub struct FormattedEnergy(pub f64);

impl Display for FormattedEnergy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} kWh", self.0)
    }
}

pub struct FormattedPercentage(pub f64);

impl Display for FormattedPercentage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}
