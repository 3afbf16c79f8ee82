use super::ui;
use crate::core::error::Result as EngineResult;
use crate::core::history::{
    HistoricalRatePoint, RateSeriesGenerator, SeededBandGenerator, SyntheticHistory,
    get_historical_rates,
};
use crate::core::series;
use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use comfy_table::Cell;
use std::collections::HashMap;

/// Trailing window for the moving-average column.
const MOVING_AVERAGE_WINDOW: usize = 7;

/// Prints a synthetic daily series ending today. With a seed the series is repeatable.
pub fn run(
    base: &str,
    target: &str,
    days: u32,
    seed: Option<u64>,
) -> Result<Vec<HistoricalRatePoint>> {
    if days == 0 {
        anyhow::bail!("At least one day of history is required");
    }
    let end = Local::now().date_naive();
    let start = end
        .checked_sub_days(Days::new(u64::from(days) - 1))
        .with_context(|| {
            format!("{days} days of history reach before the earliest supported date")
        })?;

    let points = match seed {
        Some(seed) => {
            let generator = SeededBandGenerator::new(seed, 1.0, 0.2)?;
            collect(SyntheticHistory::new(base, target, start, end, generator))?
        }
        None => collect(get_historical_rates(base, target, start, end))?,
    };

    print_series(base, target, &points)?;
    Ok(points)
}

fn collect<G: RateSeriesGenerator>(
    history: EngineResult<SyntheticHistory<G>>,
) -> Result<Vec<HistoricalRatePoint>> {
    let history = history.context("Failed to build rate history")?;
    Ok(history.iter().collect())
}

fn print_series(base: &str, target: &str, points: &[HistoricalRatePoint]) -> Result<()> {
    let averages: HashMap<NaiveDate, f64> =
        series::moving_average(points, MOVING_AVERAGE_WINDOW)?
            .into_iter()
            .collect();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Rate"),
        ui::header_cell(&format!("{MOVING_AVERAGE_WINDOW}d avg")),
    ]);
    for point in points {
        table.add_row(vec![
            Cell::new(point.date.format("%Y-%m-%d")),
            ui::number_cell(point.rate, 4),
            ui::format_optional_cell(averages.get(&point.date), |avg| format!("{avg:.4}")),
        ]);
    }

    println!(
        "\nDaily history for {}",
        ui::style_text(
            &format!("{}/{}", base.to_uppercase(), target.to_uppercase()),
            ui::StyleType::Title
        )
    );
    if points.iter().any(|p| p.synthetic) {
        println!(
            "{}",
            ui::style_text(
                "Simulated series for illustration, not market data.",
                ui::StyleType::Warning
            )
        );
    }
    println!("{table}");

    if let Some(summary) = series::summarize(points) {
        println!(
            "{} {:.4}  {} {:.4}  {} {:.4}",
            ui::style_text("Min:", ui::StyleType::TotalLabel),
            summary.min,
            ui::style_text("Max:", ui::StyleType::TotalLabel),
            summary.max,
            ui::style_text("Mean:", ui::StyleType::TotalLabel),
            summary.mean
        );
        if let Some(change) = summary.change_pct {
            println!(
                "{} {}",
                ui::style_text("Change:", ui::StyleType::TotalLabel),
                ui::style_text(
                    &format!("{change:+.2}%"),
                    if change >= 0.0 {
                        ui::StyleType::TotalValue
                    } else {
                        ui::StyleType::Error
                    }
                )
            );
        }
    }
    Ok(())
}
