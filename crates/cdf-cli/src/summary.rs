//! Terminal summary tables.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cdf_core::Stage;

use crate::commands::{BatchResult, MungerSummary};

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn stage_cell(stage: Stage) -> Cell {
    match stage {
        Stage::Loaded => Cell::new("loaded").fg(Color::Green),
        Stage::Errored => Cell::new("errored").fg(Color::Red),
        other => Cell::new(format!("{other:?}").to_lowercase()).fg(Color::Yellow),
    }
}

pub fn print_batch(result: &BatchResult) {
    let mut table = base_table();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Stage"),
        header_cell("Rows"),
        header_cell("Inserted"),
        header_cell("Skipped"),
        header_cell("Updated"),
        header_cell("Warnings"),
    ]);
    for index in 2..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for report in &result.reports {
        let outcome = report.outcome.unwrap_or_default();
        table.add_row(vec![
            Cell::new(&report.short_name),
            stage_cell(report.stage_reached),
            Cell::new(report.rows_resolved),
            Cell::new(outcome.inserted),
            Cell::new(outcome.skipped),
            Cell::new(outcome.updated),
            Cell::new(report.diagnostics.warning_count()),
        ]);
    }
    println!("{table}");

    for report in &result.reports {
        for fatal in report.diagnostics.fatals() {
            println!("error [{}/{}]: {}", fatal.category, fatal.key, fatal.message);
        }
        for warning in report.diagnostics.warnings() {
            println!(
                "warn  [{}/{}]: {}",
                warning.category, warning.key, warning.message
            );
        }
    }

    if !result.mismatches.is_empty() {
        let mut table = base_table();
        table.set_header(vec![
            header_cell("Contest"),
            header_cell("Reporting unit"),
            header_cell("Total"),
            header_cell("Sum of vote types"),
        ]);
        align_column(&mut table, 2, CellAlignment::Right);
        align_column(&mut table, 3, CellAlignment::Right);
        for mismatch in &result.mismatches {
            table.add_row(vec![
                Cell::new(mismatch.contest_id.get()),
                Cell::new(&mismatch.reporting_unit),
                Cell::new(mismatch.total).fg(Color::Red),
                Cell::new(mismatch.summed).fg(Color::Red),
            ]);
        }
        println!("Totals that disagree with their vote types:");
        println!("{table}");
    }

    for (election, rows) in &result.rollups {
        let mut table = base_table();
        table.set_header(vec![
            header_cell("Contest"),
            header_cell("Reporting unit"),
            header_cell("Vote type"),
            header_cell("Count"),
        ]);
        align_column(&mut table, 3, CellAlignment::Right);
        for row in rows {
            table.add_row(vec![
                Cell::new(row.contest_id.get()),
                Cell::new(&row.reporting_unit),
                Cell::new(&row.count_item_type),
                Cell::new(row.count),
            ]);
        }
        println!("Rollup for {election}:");
        println!("{table}");
    }
}

pub fn print_mungers(summaries: &[MungerSummary]) {
    let mut table = base_table();
    table.set_header(vec![
        header_cell("Munger"),
        header_cell("File type"),
        header_cell("Counts"),
        header_cell("Elements"),
    ]);
    for summary in summaries {
        match &summary.detail {
            Ok(config) => {
                let elements: Vec<&str> = cdf_model::CdfElement::ALL
                    .into_iter()
                    .filter(|element| config.covers(*element))
                    .map(cdf_model::CdfElement::as_str)
                    .collect();
                table.add_row(vec![
                    Cell::new(&summary.name),
                    Cell::new(config.file_type),
                    Cell::new(match config.count_location {
                        cdf_model::CountLocation::ByName => "by_name",
                        cdf_model::CountLocation::ByNumber => "by_number",
                    }),
                    Cell::new(elements.join(", ")),
                ]);
            }
            Err(message) => {
                table.add_row(vec![
                    Cell::new(&summary.name),
                    Cell::new("invalid").fg(Color::Red),
                    Cell::new(""),
                    Cell::new(message).fg(Color::Red),
                ]);
            }
        }
    }
    println!("{table}");
}
