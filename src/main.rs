mod cli;
mod config;
mod fmt;
mod tables;

use std::{collections::BTreeMap, fs};

use anyhow::{Context, Result};
use clap::Parser;
use pl_power_rateplan::{
    aggregate::{MonthlyResult, Summary, aggregate, hourly_profile},
    reading::{self, DateRange},
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    cli::Args,
    config::Config,
    fmt::{FormattedCost, FormattedEnergy},
    tables::{build_monthly_table, build_profile_table, build_ranking_table, build_zone_table},
};

#[derive(Serialize)]
struct Report {
    range: DateRange,
    months: Vec<MonthlyResult>,
    summary: Summary,
    hourly_profile: BTreeMap<u32, [f64; 24]>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if config.schedule.has_g13_overrides() {
        warn!(
            peak = ?config.schedule.g13_peak_hours,
            mid = ?config.schedule.g13_mid_hours,
            "G13 hour sets are configured but G13 zones follow the fixed seasonal table, ignoring"
        );
    }

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read `{}`", args.input.display()))?;
    let parsed = reading::parse(&text)
        .with_context(|| format!("`{}` is not a usable meter export", args.input.display()))?;
    let readings = if args.strict {
        parsed.into_strict()?
    } else {
        if let Some(first) = parsed.skipped.first() {
            warn!(
                n_skipped = parsed.skipped.len(),
                first.line,
                %first.reason,
                "some rows were skipped"
            );
        }
        parsed.readings
    };

    let range = args
        .date_range(&readings)
        .with_context(|| format!("nothing to analyse in `{}`", args.input.display()))?;
    let readings = range.filter(&readings);
    info!(
        start = %range.start,
        end = %range.end,
        n_readings = readings.len(),
        "selected date range"
    );

    let months = aggregate(&readings, &config.pricing, &config.schedule);
    let summary = Summary::from_months(&months);
    let hourly_profile = hourly_profile(&readings);

    if args.json {
        let report = Report { range, months, summary, hourly_profile };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", build_monthly_table(&months));
    println!("{}", build_ranking_table(&summary));
    println!("{}", build_zone_table(&summary));
    println!("{}", build_profile_table(&hourly_profile));
    println!("Total consumption: {}", FormattedEnergy(summary.total_kwh));
    if let Some(best) = summary.best() {
        println!(
            "Cheapest tariff: {best} ({}), saving up to {} against the most expensive one",
            FormattedCost(summary.usage(best).cost),
            FormattedCost(summary.savings()),
        );
    }
    Ok(())
}
