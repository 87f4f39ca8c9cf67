use aggregation::{MetricWarning, Snapshot, WindowRole};
use catalog::{MetricCatalog, ReportField};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell as TableCell, Color, ContentArrangement, Table};
use core_types::Direction;
use report::{Cell, ReportTable};
use rust_decimal::Decimal;

const UP_ARROW: &str = "▲";
const DOWN_ARROW: &str = "▼";

/// Two decimals; nulls are handled by the caller and render blank.
pub fn format_value(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// The text of one report cell. Empty cells are blank, never "0" or "NaN".
pub fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Number { value } => format_value(*value),
        Cell::Trend { value, direction } => {
            let arrow = match direction {
                Direction::Up => UP_ARROW,
                Direction::Down => DOWN_ARROW,
            };
            format!("{} {arrow}", format_value(*value))
        }
    }
}

fn table_cell(cell: &Cell) -> TableCell {
    let text = TableCell::new(cell_text(cell));
    match cell {
        Cell::Trend { direction: Direction::Up, .. } => text.fg(Color::Green),
        Cell::Trend { direction: Direction::Down, .. } => text.fg(Color::Red),
        _ => text,
    }
}

/// Renders the report with one row per metric. The category is printed once, on
/// the first row of its group.
pub fn render_table(report: &ReportTable) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![TableCell::new("Category"), TableCell::new("Metric")];
    header.extend(report.entities.iter().map(TableCell::new));
    table.set_header(header);

    for (category, rows) in report.groups() {
        for (i, row) in rows.iter().enumerate() {
            let label = if i == 0 { category.as_str() } else { "" };
            let mut cells = vec![TableCell::new(label), TableCell::new(&row.label)];
            cells.extend(row.values.iter().map(|(_, cell)| table_cell(cell)));
            table.add_row(cells);
        }
    }
    table
}

/// Lists the catalog: one line per metric, then the composites.
pub fn render_catalog(catalog: &MetricCatalog) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Category", "Key", "Label", "Tickers", "Frequency", "Trend", "Shown"]);

    for metric in catalog.list_metrics() {
        let shown = catalog.layout().iter().any(|c| match &c.field {
            ReportField::Metric(key) | ReportField::Trend(key) => key == &metric.key,
            ReportField::Composite(_) => false,
        });
        table.add_row(vec![
            metric.category.as_str().to_string(),
            metric.key.clone(),
            metric.label.clone(),
            metric.ticker_variant.to_string(),
            metric.frequency.to_string(),
            yes_no(metric.has_trend_reference).to_string(),
            yes_no(shown).to_string(),
        ]);
    }
    for composite in catalog.composites() {
        table.add_row(vec![
            composite.category.as_str().to_string(),
            composite.key.clone(),
            composite.label.clone(),
            format!("mean of {}", composite.inputs.join(", ")),
            String::new(),
            String::new(),
            yes_no(true).to_string(),
        ]);
    }
    table
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "" }
}

pub fn warning_line(warning: &MetricWarning) -> String {
    let window = match warning.window {
        WindowRole::Current => "current",
        WindowRole::Reference => "reference",
    };
    format!("{} ({window} window): {}", warning.metric, warning.reason)
}

/// The JSON document printed by `--format json`.
pub fn render_json(snapshot: &Snapshot, report: &ReportTable) -> serde_json::Result<String> {
    let document = serde_json::json!({
        "snapshot_id": snapshot.id,
        "as_of": snapshot.as_of,
        "report": report,
        "warnings": snapshot.warnings,
    });
    serde_json::to_string_pretty(&document)
}
