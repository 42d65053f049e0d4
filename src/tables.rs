use std::collections::BTreeMap;

use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use pl_power_rateplan::{
    aggregate::{MonthlyResult, Summary},
    tariff::Tariff,
};

use crate::fmt::{FormattedCost, FormattedEnergy, FormattedPercentage};

const MONTH_NAMES: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table
}

fn tariff_color(tariff: Tariff) -> Color {
    match tariff {
        Tariff::G11 => Color::Blue,
        Tariff::G12 => Color::Green,
        Tariff::G12w => Color::DarkYellow,
        Tariff::G13 => Color::Magenta,
    }
}

/// Cost of every tariff per month; the cheapest one in each row is highlighted.
pub fn build_monthly_table(months: &[MonthlyResult]) -> Table {
    let mut table = new_table();
    let mut header = vec![Cell::new("Month"), Cell::new("Energy")];
    header.extend(Tariff::ALL.map(|tariff| Cell::new(tariff).fg(tariff_color(tariff))));
    table.set_header(header);

    for month in months {
        let cheapest = month.tariffs.iter().map(|usage| usage.cost).fold(f64::INFINITY, f64::min);
        let mut row = vec![
            Cell::new(month.month),
            Cell::new(FormattedEnergy(month.total_kwh)).set_alignment(CellAlignment::Right),
        ];
        row.extend(month.tariffs.iter().map(|usage| {
            let cell = Cell::new(FormattedCost(usage.cost)).set_alignment(CellAlignment::Right);
            if usage.cost <= cheapest {
                cell.fg(Color::Green).add_attribute(Attribute::Bold)
            } else {
                cell
            }
        }));
        table.add_row(row);
    }
    table
}

/// Tariffs from the cheapest, with the overpayment against the cheapest one.
pub fn build_ranking_table(summary: &Summary) -> Table {
    let mut table = new_table();
    table.set_header(vec!["#", "Tariff", "Total cost", "Overpayment", "Overpayment %"]);

    let ranking = summary.ranking();
    let best_cost = ranking[0].cost;
    for (position, usage) in ranking.iter().enumerate() {
        let overpayment = usage.cost - best_cost;
        let relative = if best_cost > 0.0 { overpayment / best_cost } else { 0.0 };
        table.add_row(vec![
            Cell::new(position + 1).add_attribute(Attribute::Dim),
            Cell::new(usage.tariff).fg(tariff_color(usage.tariff)),
            Cell::new(FormattedCost(usage.cost)).set_alignment(CellAlignment::Right),
            Cell::new(FormattedCost(overpayment))
                .set_alignment(CellAlignment::Right)
                .fg(if overpayment > 0.0 { Color::Red } else { Color::Green }),
            Cell::new(FormattedPercentage(relative)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Energy per billing zone for every tariff.
pub fn build_zone_table(summary: &Summary) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Tariff", "Zone", "Energy", "Share", "Cost"]);
    for tariff in Tariff::ALL {
        let usage = summary.usage(tariff);
        for (i, zone) in tariff.zones().iter().enumerate() {
            table.add_row(vec![
                if i == 0 { Cell::new(tariff).fg(tariff_color(tariff)) } else { Cell::new("") },
                Cell::new(zone),
                Cell::new(FormattedEnergy(usage.zones.get(*zone)))
                    .set_alignment(CellAlignment::Right),
                Cell::new(FormattedPercentage(summary.zone_share(tariff, *zone)))
                    .set_alignment(CellAlignment::Right),
                if i == 0 {
                    Cell::new(FormattedCost(usage.cost)).set_alignment(CellAlignment::Right)
                } else {
                    Cell::new("")
                },
            ]);
        }
    }
    table
}

/// Energy per hour of day, one column per calendar month.
pub fn build_profile_table(profile: &BTreeMap<u32, [f64; 24]>) -> Table {
    let mut table = new_table();
    let mut header = vec![Cell::new("Hour")];
    header.extend(profile.keys().map(|month| {
        Cell::new(MONTH_NAMES.get(*month as usize - 1).copied().unwrap_or("?"))
    }));
    table.set_header(header);

    for hour in 0..24 {
        let mut row = vec![Cell::new(format!("{hour:02}:00")).add_attribute(Attribute::Dim)];
        row.extend(profile.values().map(|hours| {
            Cell::new(format!("{:.2}", hours[hour])).set_alignment(CellAlignment::Right)
        }));
        table.add_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use pl_power_rateplan::{
        aggregate::{aggregate, hourly_profile},
        pricing::{ScheduleConfig, TariffPricing},
        reading::Reading,
    };

    use super::*;

    fn readings() -> Vec<Reading> {
        ["2024-01-15 10:00", "2024-01-15 18:00", "2024-02-03 02:00"]
            .into_iter()
            .map(|text| {
                Reading::new(NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M").unwrap(), 1.5)
            })
            .collect()
    }

    #[test]
    fn test_monthly_table_has_row_per_month() {
        let months = aggregate(&readings(), &TariffPricing::default(), &ScheduleConfig::default());
        let table = build_monthly_table(&months);
        assert_eq!(table.row_count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("2024-01"));
        assert!(rendered.contains("2024-02"));
        assert!(rendered.contains("G12w"));
    }

    #[test]
    fn test_zone_table_lists_every_zone() {
        let months = aggregate(&readings(), &TariffPricing::default(), &ScheduleConfig::default());
        let table = build_zone_table(&Summary::from_months(&months));
        assert_eq!(table.row_count(), 1 + 2 + 2 + 3);
    }

    #[test]
    fn test_profile_table() {
        let table = build_profile_table(&hourly_profile(&readings()));
        assert_eq!(table.row_count(), 24);
        let rendered = table.to_string();
        assert!(rendered.contains("Jan"));
        assert!(rendered.contains("Feb"));
    }
}
