use super::project::{ProviderFactory, resolve_rate};
use super::ui;
use crate::core::currency::{is_usable_rate, pair_label};
use crate::core::scenario::{self, PERTURBATION_RANGE, ScenarioOutcome};
use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell, Color};
use tracing::warn;

/// Shift between rows of the sweep table.
const SWEEP_STEP_PCT: f64 = 5.0;

pub async fn run(
    amount: f64,
    base: &str,
    target: &str,
    shift_pct: f64,
    rate: Option<f64>,
    provider: ProviderFactory<'_>,
) -> Result<ScenarioOutcome> {
    if !amount.is_finite() || amount < 0.0 {
        anyhow::bail!("Amount must be a non-negative number, got {amount}");
    }
    if !shift_pct.is_finite() {
        anyhow::bail!("Shift must be a finite percentage, got {shift_pct}");
    }
    if !PERTURBATION_RANGE.contains(&shift_pct) {
        warn!(
            "Shift {}% is outside the usual {:?} range",
            shift_pct, PERTURBATION_RANGE
        );
    }

    let rate = resolve_rate(base, target, rate, provider).await?;
    if !is_usable_rate(rate) {
        anyhow::bail!("Exchange rate must be positive and finite, got {rate}");
    }
    let outcome = scenario::scenario(amount, rate, shift_pct);
    let sweep = scenario::scenario_sweep(amount, rate, PERTURBATION_RANGE, SWEEP_STEP_PCT)
        .context("Failed to build scenario sweep")?;

    let target_code = target.to_uppercase();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Shift"),
        ui::header_cell("Rate"),
        ui::header_cell(&format!("Amount ({target_code})")),
        ui::header_cell("Impact"),
    ]);
    for row in &sweep {
        let highlighted = (row.perturbation_pct - shift_pct).abs() < f64::EPSILON;
        let mut shift = Cell::new(format!("{:+.0}%", row.perturbation_pct));
        if highlighted {
            shift = shift.add_attribute(Attribute::Bold);
        }
        table.add_row(vec![
            shift,
            ui::number_cell(row.adjusted_rate, 4),
            ui::number_cell(row.adjusted_amount, 2),
            impact_cell(row.impact),
        ]);
    }

    println!(
        "\nWhat-if for {} {}",
        amount,
        ui::style_text(&pair_label(base, target), ui::StyleType::Title)
    );
    println!("{table}");
    println!(
        "{} {:+}% -> rate {:.6}, {} {target_code} ({:+.2})",
        ui::style_text("Selected shift:", ui::StyleType::TotalLabel),
        shift_pct,
        outcome.adjusted_rate,
        ui::style_text(
            &format!("{:.2}", outcome.adjusted_amount),
            ui::StyleType::TotalValue
        ),
        outcome.impact
    );
    Ok(outcome)
}

fn impact_cell(impact: f64) -> Cell {
    let cell = ui::number_cell(impact, 2);
    if impact < 0.0 {
        cell.fg(Color::Red)
    } else {
        cell.fg(Color::Green)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyRateProvider;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn no_provider<'a>() -> ProviderFactory<'a> {
        Box::new(|| -> Result<Arc<dyn CurrencyRateProvider + Send + Sync>> {
            anyhow::bail!("offline")
        })
    }

    #[tokio::test]
    async fn test_explicit_rate() {
        let outcome = run(1000.0, "USD", "EUR", 10.0, Some(0.9), no_provider())
            .await
            .unwrap();
        assert_relative_eq!(outcome.adjusted_amount, 990.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.impact, 90.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_same_currency_is_offline() {
        let outcome = run(50.0, "EUR", "EUR", -100.0, None, no_provider())
            .await
            .unwrap();
        assert_relative_eq!(outcome.adjusted_amount, 0.0);
    }

    #[tokio::test]
    async fn test_rejects_unusable_inputs() {
        assert!(run(-1.0, "USD", "EUR", 0.0, Some(0.9), no_provider()).await.is_err());
        assert!(run(1.0, "USD", "EUR", f64::NAN, Some(0.9), no_provider()).await.is_err());
        assert!(run(1.0, "USD", "EUR", 0.0, Some(0.0), no_provider()).await.is_err());
        assert!(run(1.0, "USD", "EUR", 0.0, None, no_provider()).await.is_err());
    }
}
