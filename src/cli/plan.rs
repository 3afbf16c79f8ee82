use super::ui;
use crate::core::planning::{self, SavingsPlan, SavingsSummary};
use anyhow::{Context, Result};
use comfy_table::Cell;

pub fn run(plan: &SavingsPlan) -> Result<SavingsSummary> {
    let summary = planning::summarize(plan).context("Invalid savings plan")?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
    table.add_row(vec![
        Cell::new("Monthly savings"),
        ui::number_cell(summary.monthly_savings, 2),
    ]);
    table.add_row(vec![
        Cell::new("Months to goal"),
        ui::format_optional_cell(summary.months_to_goal, |m| m.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Estimated annual return"),
        Cell::new(format!("{:.1}%", summary.estimated_return_pct)),
    ]);
    table.add_row(vec![
        Cell::new("Yearly return on investment"),
        ui::number_cell(summary.yearly_return, 2),
    ]);
    table.add_row(vec![
        Cell::new("Goal progress"),
        Cell::new(format!(
            "{:.1}% {}",
            summary.goal_progress_pct,
            ui::gauge(summary.goal_progress_pct, 100.0, 20)
        )),
    ]);

    println!(
        "\nSavings plan ({} strategy)",
        ui::style_text(&summary.strategy.to_string(), ui::StyleType::Title)
    );
    println!("{table}");
    if summary.months_to_goal.is_none() {
        println!(
            "{}",
            ui::style_text(
                "Expenses meet or exceed income, so the goal is not reachable from savings.",
                ui::StyleType::Warning
            )
        );
    }
    println!("{}", summary.strategy.advice());
    Ok(summary)
}
