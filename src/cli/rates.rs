use super::ui;
use crate::core::currency::{CurrencyRateProvider, pair_label};
use crate::core::history::{SyntheticHistory, UniformBandGenerator};
use crate::core::scenario::{convert, reciprocal};
use crate::core::series::{self, PairChange};
use crate::providers::refresh::{RateRefresher, RateSnapshot, RateUpdate, RefreshTarget};
use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Local};
use comfy_table::{Cell, Color};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Band used for the synthetic one-week movement shown on the dashboard.
const SYNTHETIC_WEEK_BAND_PCT: f64 = 2.0;

/// Looks up `base` against every target concurrently and prints the converted amount.
pub async fn run_rate(
    provider: &(dyn CurrencyRateProvider + Send + Sync),
    base: &str,
    targets: &[String],
    amount: f64,
) -> Result<()> {
    if targets.is_empty() {
        anyhow::bail!("At least one target currency is required");
    }

    let pb = ui::new_progress_bar(targets.len() as u64);
    let futures = targets.iter().map(|target| {
        let pb = pb.clone();
        async move {
            let res = provider.get_rate(base, target).await;
            pb.inc(1);
            (target, res)
        }
    });
    let results = join_all(futures).await;
    pb.finish_and_clear();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Inverse"),
        ui::header_cell(&format!("{amount} {}", base.to_uppercase())),
    ]);

    let mut errors = Vec::new();
    for (target, res) in results {
        let pair = pair_label(base, target);
        match res {
            Ok(rate) => {
                table.add_row(vec![
                    Cell::new(&pair),
                    ui::number_cell(rate, 4),
                    ui::format_optional_cell(reciprocal(rate).ok(), |r| format!("{r:.4}")),
                    ui::number_cell(convert(amount, rate), 2),
                ]);
            }
            Err(e) => {
                warn!("Rate lookup for {} failed: {}", pair, e);
                table.add_row(vec![
                    Cell::new(&pair).fg(Color::Red),
                    ui::na_cell(),
                    ui::na_cell(),
                    ui::na_cell(),
                ]);
                errors.push(e);
            }
        }
    }

    println!("{table}");
    for e in &errors {
        println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
    }
    if errors.len() == targets.len() {
        anyhow::bail!("No exchange rates could be fetched for {}", base);
    }
    Ok(())
}

/// Prints the first `limit` entries of the latest rate table for `base`, with a
/// synthetic one-week movement per pair and the resulting movers.
pub async fn run_dashboard(
    provider: &(dyn CurrencyRateProvider + Send + Sync),
    base: &str,
    limit: usize,
) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching rates for {}", base.to_uppercase()));
    let rates = provider.get_all_rates(base).await;
    pb.finish_and_clear();
    let rates = rates.with_context(|| format!("Failed to fetch rate table for {base}"))?;
    let base = base.to_uppercase();

    let end = Local::now().date_naive();
    let start = end - ChronoDuration::days(6);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Rate"),
        ui::header_cell("Inverse"),
        ui::header_cell("1W (synthetic)"),
    ]);

    let mut changes = Vec::new();
    for (code, rate) in rates.iter().filter(|(code, _)| **code != base).take(limit) {
        let change = UniformBandGenerator::anchored(*rate, SYNTHETIC_WEEK_BAND_PCT)
            .and_then(|generator| SyntheticHistory::new(&base, code, start, end, generator))
            .map(|history| history.iter().collect::<Vec<_>>())
            .ok()
            .and_then(|points| series::summarize(&points))
            .and_then(|summary| summary.change_pct);

        table.add_row(vec![
            Cell::new(code),
            ui::number_cell(*rate, 4),
            ui::format_optional_cell(reciprocal(*rate).ok(), |r| format!("{r:.4}")),
            change.map_or_else(ui::na_cell, ui::change_cell),
        ]);
        if let Some(change_pct) = change {
            changes.push(PairChange {
                pair: pair_label(&base, code),
                change_pct,
            });
        }
    }

    println!(
        "\nLatest rates for {}",
        ui::style_text(&base, ui::StyleType::Title)
    );
    println!("{table}");

    if let Some(movers) = series::rank_movers(&changes) {
        println!(
            "{}",
            ui::style_text(
                "Movement below is simulated, not market data.",
                ui::StyleType::Subtle
            )
        );
        for (label, mover) in [
            ("Top mover", &movers.top_mover),
            ("Biggest drop", &movers.biggest_drop),
            ("Most stable", &movers.most_stable),
        ] {
            println!(
                "  {:<14} {} ({:+.2}%)",
                ui::style_text(label, ui::StyleType::TotalLabel),
                mover.pair,
                mover.change_pct
            );
        }
    }
    Ok(())
}

/// Refreshes one pair every `interval` until `count` updates arrived or Ctrl-C.
pub async fn run_watch(
    provider: Arc<dyn CurrencyRateProvider + Send + Sync>,
    base: &str,
    target: &str,
    interval: Duration,
    count: Option<usize>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(16);
    let handle = RateRefresher::new(provider, interval)?
        .watch(RefreshTarget::pair(base, target))
        .spawn(tx);

    println!(
        "Watching {} every {}s (Ctrl-C to stop)",
        ui::style_text(&pair_label(base, target), ui::StyleType::Title),
        interval.as_secs()
    );

    let mut received = 0;
    let mut previous = None;
    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Some(update) => {
                    previous = print_update(&update, previous);
                    received += 1;
                    if count.is_some_and(|c| received >= c) {
                        debug!("Received {} updates, stopping", received);
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping rate watch");
                break;
            }
        }
    }

    handle.stop().await;
    Ok(())
}

/// Prints one refresh and returns the rate to compare the next one against.
fn print_update(update: &RateUpdate, previous: Option<f64>) -> Option<f64> {
    let time = update.fetched_at.with_timezone(&Local).format("%H:%M:%S");
    match &update.result {
        Ok(RateSnapshot::Pair(rate)) => {
            let change = previous
                .and_then(|prev| series::percent_change(prev, *rate))
                .map(|c| format!(" ({c:+.4}%)"))
                .unwrap_or_default();
            println!("[{time}] {} {rate:.6}{change}", update.target);
            Some(*rate)
        }
        Ok(RateSnapshot::Table(table)) => {
            println!("[{time}] {} {} rates", update.target, table.len());
            previous
        }
        Err(e) => {
            println!(
                "[{time}] {}",
                ui::style_text(&e.to_string(), ui::StyleType::Error)
            );
            previous
        }
    }
}
