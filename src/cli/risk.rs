use super::ui;
use crate::core::risk::{self, MAX_SCORE, RiskAssessment, RiskCategory};
use crate::core::{RiskToleranceTier, VolatilityTier};
use anyhow::{Context, Result};
use comfy_table::{Cell, Color};

pub fn run(
    amount: f64,
    volatility: VolatilityTier,
    tolerance: RiskToleranceTier,
) -> Result<RiskAssessment> {
    let assessment = risk::assess(amount, volatility, tolerance)
        .with_context(|| format!("Failed to score an investment of {amount}"))?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Input"), ui::header_cell("Value")]);
    table.add_row(vec![Cell::new("Amount"), ui::number_cell(amount, 2)]);
    table.add_row(vec![
        Cell::new("Volatility"),
        Cell::new(format!("{volatility} (factor {})", volatility.factor())),
    ]);
    table.add_row(vec![
        Cell::new("Risk tolerance"),
        Cell::new(format!("{tolerance} (weight {})", tolerance.weight())),
    ]);
    println!("{table}");

    println!(
        "{} {:>6.2} {}",
        ui::style_text("Risk score:", ui::StyleType::TotalLabel),
        assessment.score,
        ui::gauge(assessment.score, MAX_SCORE, 30)
    );
    let category =
        Cell::new(assessment.category.to_string()).fg(category_color(assessment.category));
    let mut summary = ui::new_styled_table();
    summary.add_row(vec![Cell::new("Category"), category]);
    println!("{summary}");

    Ok(assessment)
}

fn category_color(category: RiskCategory) -> Color {
    match category {
        RiskCategory::Low => Color::Green,
        RiskCategory::Medium => Color::Yellow,
        RiskCategory::High => Color::Red,
    }
}
