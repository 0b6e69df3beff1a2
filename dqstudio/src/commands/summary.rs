// dqstudio/src/commands/summary.rs
//
// Terminal rendering of an assessment report.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dqstudio_core::application::AssessmentReport;
use dqstudio_core::domain::scoring::{ColumnTier, QualityBand, ScoreMap};

pub fn print_report(report: &AssessmentReport) {
    println!("\n📊 {}", report.name);
    println!(
        "   Records: {} · Rules: {} · Columns scored: {}",
        report.records_analysed, report.rules_executed, report.columns_scored
    );
    println!(
        "   Overall score: {:.1}% ({}) · Clean records: {:.1}%",
        report.overall_score, report.band, report.clean_record_rate
    );

    if !report.dimension_scores.is_empty() {
        println!("{}", score_table("Dimension", &report.dimension_scores));
    }
    if !report.column_scores.is_empty() {
        println!("{}", score_table("Column", &report.column_scores));
        println!(
            "   Tiers: {} high · {} medium · {} low",
            report.tiers.high, report.tiers.medium, report.tiers.low
        );
    }

    for duplicates in &report.duplicates {
        if !duplicates.groups.is_empty() {
            println!(
                "   🔁 {}: {} duplicate row(s) in {} group(s)",
                duplicates.key,
                duplicates.duplicate_rows(),
                duplicates.groups.len()
            );
        }
    }

    for warning in &report.warnings {
        println!("   ⚠️  {}", warning);
    }
}

fn score_table(label: &str, scores: &ScoreMap) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header_cell(label),
            header_cell("Passed"),
            header_cell("Total"),
            header_cell("Score"),
        ]);
    for (name, entry) in scores.iter() {
        let score = entry.percentage();
        table.add_row(vec![
            Cell::new(name),
            Cell::new(entry.passed).set_alignment(CellAlignment::Right),
            Cell::new(entry.total).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", entry.display()))
                .set_alignment(CellAlignment::Right)
                .fg(score_color(score)),
        ]);
    }
    table
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn score_color(score: f64) -> Color {
    match (QualityBand::from_score(score), ColumnTier::from_score(score)) {
        (_, ColumnTier::High) => Color::Green,
        (QualityBand::Excellent | QualityBand::Good, _) => Color::Yellow,
        _ => Color::Red,
    }
}
