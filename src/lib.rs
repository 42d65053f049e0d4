//! Compare Polish household electricity tariffs over hourly meter readings.
//!
//! The pipeline is [`reading::parse`] → [`aggregate::aggregate`] → [`aggregate::Summary`].
//! Every function here is pure: pricing and schedule are passed in explicitly and
//! nothing is retained between calls.

pub mod aggregate;
pub mod holiday;
pub mod pricing;
pub mod reading;
pub mod tariff;

mod prelude;
