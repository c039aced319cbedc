use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use focus_cli::pipeline::ConvertOutcome;

pub fn print_summary(outcome: &ConvertOutcome) {
    println!("Provider: {}", outcome.summary.provider);
    println!("Output: {}", outcome.export_dir.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Segment"),
        header_cell("Format"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for path in &outcome.segments {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let format = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![Cell::new(name), dim_cell(format)]);
    }
    if outcome.segments.is_empty() {
        table.add_row(vec![dim_cell("no rows converted"), dim_cell("-")]);
    }
    println!("{table}");

    let mut totals = Table::new();
    totals.set_header(vec![
        header_cell("Batches"),
        header_cell("Rows"),
        header_cell("Elapsed"),
    ]);
    apply_summary_table_style(&mut totals);
    for index in 0..3 {
        align_column(&mut totals, index, CellAlignment::Right);
    }
    totals.add_row(vec![
        Cell::new(outcome.summary.batches).add_attribute(Attribute::Bold),
        Cell::new(outcome.summary.rows)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{:.2}s", outcome.elapsed.as_secs_f64())),
    ]);
    println!("{totals}");
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}
