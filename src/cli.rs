use std::path::PathBuf;

use anyhow::{Result, bail, ensure};
use chrono::NaiveDate;
use clap::Parser;
use pl_power_rateplan::reading::{DateRange, Reading};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// CSV file with `timestamp` and `kwh` columns, one row per hour.
    pub input: PathBuf,

    /// TOML file with tariff rates and off-peak hours. Built-in defaults when omitted.
    #[clap(long, env = "RATEPLAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// First day to include. Defaults to the day of the earliest reading.
    #[clap(long, value_name = "YYYY-MM-DD")]
    pub from: Option<NaiveDate>,

    /// Last day to include. Defaults to the day of the latest reading.
    #[clap(long, value_name = "YYYY-MM-DD")]
    pub until: Option<NaiveDate>,

    /// Print a JSON report instead of tables.
    #[clap(long)]
    pub json: bool,

    /// Fail if any row of the input could not be parsed.
    #[clap(long)]
    pub strict: bool,
}

impl Args {
    /// Requested range, with missing bounds taken from the readings themselves.
    pub fn date_range(&self, readings: &[Reading]) -> Result<DateRange> {
        let Some(span) = DateRange::spanning(readings) else {
            bail!("no readings");
        };
        let range = DateRange {
            start: self.from.unwrap_or(span.start),
            end: self.until.unwrap_or(span.end),
        };
        ensure!(
            range.start <= range.end,
            "the selected range from {} to {} is empty, the readings span {} to {}",
            range.start,
            range.end,
            span.start,
            span.end
        );
        Ok(range)
    }
}
