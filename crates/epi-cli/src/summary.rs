use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use epi_core::{NoticeKind, SourceOutcome};
use epi_model::format_number;
use epi_validate::{DataCheckReport, Severity};

use epi_cli::types::{CheckResult, LegendResult};

pub fn print_check(result: &CheckResult) {
    println!("Configuration: {}", result.config.display());
    for file in &result.files {
        println!("Medical file: {}", file.display());
    }
    println!("Records: {}", result.records);
    println!("Fingerprint: {}", result.fingerprint);

    let mut table = Table::new();
    table.set_header(vec![header_cell("#"), header_cell("Source"), header_cell("Status")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for step in &result.steps {
        table.add_row(vec![
            Cell::new(step.index + 1),
            Cell::new(&step.name),
            outcome_cell(step.outcome),
        ]);
    }
    println!("{table}");

    print_field_table(&result.report);
    print_issue_table(&result.report);
    if !result.notices.is_empty() {
        eprintln!("Notices:");
        for notice in &result.notices {
            let label = match notice.kind {
                NoticeKind::Failed => "failed",
                NoticeKind::Unsupported => "unsupported",
            };
            eprintln!("- [{label}] {notice}");
        }
    }
}

fn print_field_table(report: &DataCheckReport) {
    if report.summaries.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Checked"),
        header_cell("Errors"),
        header_cell("Empty"),
    ]);
    apply_summary_table_style(&mut table);
    for column in 1..4 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for (field, summary) in &report.summaries {
        table.add_row(vec![
            Cell::new(field).fg(Color::Blue).add_attribute(Attribute::Bold),
            Cell::new(summary.checked),
            count_cell(summary.errors, Color::Red),
            count_cell(summary.empty, Color::Yellow),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL").fg(Color::Cyan).add_attribute(Attribute::Bold),
        dim_cell("-"),
        count_cell(report.error_count(), Color::Red).add_attribute(Attribute::Bold),
        count_cell(report.empty_count(), Color::Yellow).add_attribute(Attribute::Bold),
    ]);
    println!();
    println!("Data check:");
    println!("{table}");
    for warning in &report.systematic {
        println!("warning: {}", warning.message());
    }
}

fn print_issue_table(report: &DataCheckReport) {
    let errors: Vec<_> = report.issues_of(Severity::Error).collect();
    if errors.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Record"),
        header_cell("Field"),
        header_cell("Key"),
        header_cell("Message"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for issue in errors {
        table.add_row(vec![
            Cell::new(issue.record + 1),
            Cell::new(&issue.field),
            Cell::new(issue.record_key.join(" / ")),
            Cell::new(issue.issue.message()),
        ]);
    }
    println!();
    println!("Errors:");
    println!("{table}");
}

pub fn print_legend(result: &LegendResult) {
    let Some(chart) = &result.chart else {
        println!("No choropleth map is configured.");
        return;
    };
    println!("Map: {chart}");
    println!("Records: {} of {}", result.filtered, result.total);
    if let Some(legend) = &result.legend {
        println!("{legend}");
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Division"), header_cell("Value")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (name, value) in &result.values {
        table.add_row(vec![Cell::new(name), Cell::new(format_number(*value))]);
    }
    println!("{table}");
}

fn outcome_cell(outcome: SourceOutcome) -> Cell {
    match outcome {
        SourceOutcome::Loaded => Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold),
        SourceOutcome::Filtered => dim_cell("skipped"),
        SourceOutcome::Unsupported => Cell::new("unsupported").fg(Color::Yellow),
        SourceOutcome::Failed => Cell::new("failed").fg(Color::Red).add_attribute(Attribute::Bold),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::Cyan).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
