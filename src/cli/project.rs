use super::ui;
use crate::core::currency::{CurrencyRateProvider, normalize_pair, pair_label};
use crate::core::growth::{self, InvestmentPlan, Projection, ProjectionBands};
use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell};
use std::sync::Arc;
use tracing::debug;

/// Trajectory rows shown before the table starts skipping months.
const MAX_TRAJECTORY_ROWS: u32 = 24;

pub type ProviderFactory<'a> =
    Box<dyn FnOnce() -> Result<Arc<dyn CurrencyRateProvider + Send + Sync>> + Send + 'a>;

/// Rate known without I/O: an explicit override, or 1.0 for a single-currency pair.
/// The codes are checked either way.
fn fixed_rate(base: &str, target: &str, rate: Option<f64>) -> Result<Option<f64>> {
    let (base, target) = normalize_pair(base, target)?;
    if let Some(rate) = rate {
        debug!("Using explicit rate {} for {}", rate, pair_label(&base, &target));
        return Ok(Some(rate));
    }
    Ok((base == target).then_some(1.0))
}

/// Resolves the exchange rate for a pair, building the provider only when the rate
/// is not known up front.
pub async fn resolve_rate(
    base: &str,
    target: &str,
    rate: Option<f64>,
    provider: ProviderFactory<'_>,
) -> Result<f64> {
    if let Some(rate) = fixed_rate(base, target, rate)? {
        return Ok(rate);
    }

    let provider = provider()?;
    let pb = ui::new_spinner(&format!("Fetching {}", pair_label(base, target)));
    let rate = provider.get_rate(base, target).await;
    pb.finish_and_clear();
    rate.with_context(|| format!("Failed to fetch exchange rate {}", pair_label(base, target)))
}

pub async fn run(
    plan: &InvestmentPlan,
    spread_pct: f64,
    rate: Option<f64>,
    provider: ProviderFactory<'_>,
) -> Result<ProjectionBands> {
    // Reject a bad plan or spread before any lookup.
    plan.validate().context("Invalid investment plan")?;
    growth::validate_spread(plan, spread_pct).context("Invalid projection spread")?;

    let expected = match fixed_rate(&plan.base_currency, &plan.target_currency, rate)? {
        Some(rate) => growth::project(plan, rate)?,
        None => {
            let provider = provider()?;
            let pb = ui::new_spinner(&format!(
                "Fetching {}",
                pair_label(&plan.base_currency, &plan.target_currency)
            ));
            let projection = growth::project_future_value(plan, provider.as_ref()).await;
            pb.finish_and_clear();
            projection.context("Failed to project investment")?
        }
    };
    let bands = growth::project_bands(plan, expected.exchange_rate, spread_pct)?;

    print_trajectory(plan, &bands, spread_pct);
    print_summary(plan, &bands.expected);
    Ok(bands)
}

fn print_trajectory(plan: &InvestmentPlan, bands: &ProjectionBands, spread_pct: f64) {
    let step = plan.duration_months.div_ceil(MAX_TRAJECTORY_ROWS).max(1);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Month"),
        ui::header_cell(&format!("Pessimistic (-{spread_pct}%)")),
        ui::header_cell("Expected"),
        ui::header_cell(&format!("Optimistic (+{spread_pct}%)")),
    ]);

    let rows = bands
        .expected
        .trajectory
        .iter()
        .zip(&bands.pessimistic.trajectory)
        .zip(&bands.optimistic.trajectory);
    for ((expected, pessimistic), optimistic) in rows {
        if expected.month % step != 0 && expected.month != plan.duration_months {
            continue;
        }
        table.add_row(vec![
            Cell::new(expected.month),
            ui::number_cell(pessimistic.value, 2),
            ui::number_cell(expected.value, 2).add_attribute(Attribute::Bold),
            ui::number_cell(optimistic.value, 2),
        ]);
    }

    println!(
        "\nProjection for {}",
        ui::style_text(
            &pair_label(&plan.base_currency, &plan.target_currency),
            ui::StyleType::Title
        )
    );
    println!("{table}");
}

fn print_summary(plan: &InvestmentPlan, projection: &Projection) {
    let contributed = plan.total_contributed() * projection.exchange_rate;
    let target = plan.target_currency.to_uppercase();
    println!(
        "{} {:.6} | {} {:.4}%",
        ui::style_text("Exchange rate:", ui::StyleType::TotalLabel),
        projection.exchange_rate,
        ui::style_text("Monthly rate:", ui::StyleType::TotalLabel),
        projection.monthly_rate * 100.0
    );
    println!(
        "{} {:.2} {target}",
        ui::style_text("Total contributed:", ui::StyleType::TotalLabel),
        contributed
    );
    println!(
        "{} {} {target}",
        ui::style_text("Future value:", ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.2}", projection.future_value),
            ui::StyleType::TotalValue
        )
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::RateTable;
    use crate::core::error::{EngineError, Result as EngineResult};
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn no_provider<'a>() -> ProviderFactory<'a> {
        Box::new(|| -> Result<Arc<dyn CurrencyRateProvider + Send + Sync>> {
            anyhow::bail!("provider should not be needed")
        })
    }

    fn plan(base: &str, target: &str) -> InvestmentPlan {
        InvestmentPlan::new(1000.0, 100.0, 6.0, 12, base, target)
    }

    #[tokio::test]
    async fn test_same_currency_needs_no_provider() {
        let bands = run(&plan("USD", "usd"), 2.0, None, no_provider()).await.unwrap();
        assert_relative_eq!(bands.expected.exchange_rate, 1.0);
        assert!(bands.optimistic.future_value > bands.expected.future_value);
        assert!(bands.pessimistic.future_value < bands.expected.future_value);
    }

    #[tokio::test]
    async fn test_explicit_rate_needs_no_provider() {
        let bands = run(&plan("USD", "EUR"), 0.0, Some(0.9), no_provider())
            .await
            .unwrap();
        assert_relative_eq!(bands.expected.exchange_rate, 0.9);
        assert_relative_eq!(
            bands.optimistic.future_value,
            bands.pessimistic.future_value,
            epsilon = 1e-9
        );
    }

    #[tokio::test]
    async fn test_invalid_plan_fails_before_provider() {
        let mut bad = plan("USD", "EUR");
        bad.duration_months = 0;
        let err = run(&bad, 2.0, None, no_provider()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid investment plan"));
    }

    struct CountingProvider(AtomicUsize);

    #[async_trait]
    impl CurrencyRateProvider for CountingProvider {
        async fn get_rate(&self, _from: &str, _to: &str) -> EngineResult<f64> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(1.25)
        }

        async fn get_all_rates(&self, _base: &str) -> EngineResult<RateTable> {
            Ok(RateTable::new())
        }
    }

    #[tokio::test]
    async fn test_rate_is_fetched_once_for_all_bands() {
        let provider = Arc::new(CountingProvider(AtomicUsize::new(0)));
        let shared = Arc::clone(&provider);
        let factory: ProviderFactory<'_> = Box::new(move || {
            Ok(shared as Arc<dyn CurrencyRateProvider + Send + Sync>)
        });

        let bands = run(&plan("USD", "EUR"), 1.0, None, factory).await.unwrap();
        assert_eq!(provider.0.load(Ordering::SeqCst), 1);
        assert_relative_eq!(bands.optimistic.exchange_rate, 1.25);
        assert_relative_eq!(bands.pessimistic.exchange_rate, 1.25);
    }

    #[tokio::test]
    async fn test_explicit_rate_still_checks_codes() {
        let err = run(&plan("US", "EURO"), 2.0, Some(0.9), no_provider())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::InvalidCurrencyPair { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_spread_fails_before_provider() {
        let err = run(&plan("USD", "EUR"), -1.0, None, no_provider())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid projection spread"));

        let err = run(&plan("USD", "EUR"), f64::NAN, None, no_provider())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid projection spread"));
    }

    #[tokio::test]
    async fn test_missing_provider_is_reported() {
        let err = run(&plan("USD", "EUR"), 2.0, None, no_provider())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("provider should not be needed"));
    }
}
