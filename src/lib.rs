pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::project::ProviderFactory;
use crate::core::config::AppConfig;
use crate::core::growth::InvestmentPlan;
use crate::core::planning::SavingsPlan;
use crate::core::{CurrencyRateProvider, RiskToleranceTier, VolatilityTier};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Rate {
        base: String,
        targets: Vec<String>,
        amount: f64,
    },
    Rates {
        base: Option<String>,
        limit: usize,
    },
    Watch {
        base: String,
        target: String,
        interval_secs: Option<u64>,
        count: Option<usize>,
    },
    Risk {
        amount: f64,
        volatility: VolatilityTier,
        tolerance: RiskToleranceTier,
    },
    Project {
        plan: InvestmentPlan,
        spread_pct: f64,
        rate: Option<f64>,
    },
    Scenario {
        amount: f64,
        base: String,
        target: String,
        shift_pct: f64,
        rate: Option<f64>,
    },
    History {
        base: String,
        target: String,
        days: u32,
        seed: Option<u64>,
    },
    Plan(SavingsPlan),
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(currency = %config.currency, cache_ttl = ?config.cache_ttl(), "Loaded config");
    Ok(config)
}

fn load_provider(
    config_path: Option<&str>,
) -> Result<Arc<dyn CurrencyRateProvider + Send + Sync>> {
    providers::rate_provider_from_config(&load_config(config_path)?)
}

/// Builds the provider from config only if a command actually needs a live rate.
fn lazy_provider(config_path: Option<&str>) -> ProviderFactory<'_> {
    Box::new(move || load_provider(config_path))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("risklens starting...");

    match command {
        AppCommand::Rate {
            base,
            targets,
            amount,
        } => {
            let provider = load_provider(config_path)?;
            cli::rates::run_rate(provider.as_ref(), &base, &targets, amount).await
        }
        AppCommand::Rates { base, limit } => {
            let config = load_config(config_path)?;
            let provider = providers::rate_provider_from_config(&config)?;
            let base = base.unwrap_or_else(|| config.currency.clone());
            cli::rates::run_dashboard(provider.as_ref(), &base, limit).await
        }
        AppCommand::Watch {
            base,
            target,
            interval_secs,
            count,
        } => {
            let config = load_config(config_path)?;
            let provider = providers::rate_provider_from_config(&config)?;
            let interval =
                interval_secs.map_or_else(|| config.refresh_interval(), Duration::from_secs);
            cli::rates::run_watch(provider, &base, &target, interval, count).await
        }
        AppCommand::Risk {
            amount,
            volatility,
            tolerance,
        } => cli::risk::run(amount, volatility, tolerance).map(|_| ()),
        AppCommand::Project {
            plan,
            spread_pct,
            rate,
        } => cli::project::run(&plan, spread_pct, rate, lazy_provider(config_path))
            .await
            .map(|_| ()),
        AppCommand::Scenario {
            amount,
            base,
            target,
            shift_pct,
            rate,
        } => cli::scenario::run(
            amount,
            &base,
            &target,
            shift_pct,
            rate,
            lazy_provider(config_path),
        )
        .await
        .map(|_| ()),
        AppCommand::History {
            base,
            target,
            days,
            seed,
        } => cli::history::run(&base, &target, days, seed).map(|_| ()),
        AppCommand::Plan(plan) => cli::plan::run(&plan).map(|_| ()),
    }
}
