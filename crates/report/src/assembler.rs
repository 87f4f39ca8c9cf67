use crate::error::ReportError;
use catalog::{ReportColumn, ReportField};
use core_types::{Category, Direction, EntityRecord};
use rust_decimal::Decimal;
use serde::Serialize;

/// One value of the report. Formatting is left to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Number { value: Decimal },
    Trend { value: Decimal, direction: Direction },
}

impl Cell {
    fn from_value(value: Option<Decimal>) -> Self {
        match value {
            Some(value) => Cell::Number { value },
            None => Cell::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The numeric value, whatever the cell kind.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Cell::Empty => None,
            Cell::Number { value } | Cell::Trend { value, .. } => Some(*value),
        }
    }
}

/// One metric across all entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub category: Category,
    pub label: String,
    /// Entity name to cell, in entity order.
    pub values: Vec<(String, Cell)>,
}

impl ReportRow {
    pub fn cell(&self, entity: &str) -> Option<&Cell> {
        self.values.iter().find(|(name, _)| name == entity).map(|(_, cell)| cell)
    }
}

/// The metric-major view of a snapshot: rows follow the layout, columns follow
/// the entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub entities: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn row(&self, label: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Rows grouped by category, in layout order.
    pub fn groups(&self) -> Vec<(Category, Vec<&ReportRow>)> {
        let mut groups: Vec<(Category, Vec<&ReportRow>)> = Vec::new();
        for row in &self.rows {
            match groups.last_mut() {
                Some((category, rows)) if *category == row.category => rows.push(row),
                _ => groups.push((row.category, vec![row])),
            }
        }
        groups
    }
}

/// Projects `records` through `layout` and transposes the result, so each row
/// is one layout column and each entity becomes a column.
pub fn assemble(records: &[EntityRecord], layout: &[ReportColumn]) -> Result<ReportTable, ReportError> {
    let entities: Vec<String> = records.iter().map(|r| r.name().to_string()).collect();

    let rows = layout
        .iter()
        .map(|column| {
            let values = records
                .iter()
                .map(|record| Ok((record.name().to_string(), project(record, &column.field)?)))
                .collect::<Result<Vec<_>, ReportError>>()?;
            Ok(ReportRow {
                category: column.category,
                label: column.label.clone(),
                values,
            })
        })
        .collect::<Result<Vec<_>, ReportError>>()?;

    tracing::debug!(rows = rows.len(), entities = entities.len(), "Report assembled.");
    Ok(ReportTable { entities, rows })
}

fn project(record: &EntityRecord, field: &ReportField) -> Result<Cell, ReportError> {
    let missing = |kind: &'static str, key: &str| ReportError::MissingField {
        entity: record.name().to_string(),
        kind,
        key: key.to_string(),
    };

    match field {
        ReportField::Metric(key) => {
            if !record.has_metric(key) {
                return Err(missing("metric", key));
            }
            Ok(Cell::from_value(record.metric(key)))
        }
        ReportField::Trend(key) => {
            if !record.trend_keys().any(|k| k == key.as_str()) {
                return Err(missing("trend", key));
            }
            // Without a reference value there is no direction; show the bare value.
            Ok(match record.trend(key) {
                Some(trend) => Cell::Trend {
                    value: trend.value,
                    direction: trend.direction,
                },
                None => Cell::from_value(record.metric(key)),
            })
        }
        ReportField::Composite(key) => {
            if !record.has_composite(key) {
                return Err(missing("composite", key));
            }
            Ok(Cell::from_value(record.composite(key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Entity, TrendIndicator};
    use rust_decimal_macros::dec;

    fn layout() -> Vec<ReportColumn> {
        vec![
            ReportColumn {
                category: Category::Performance,
                label: "MTD %".to_string(),
                field: ReportField::Metric("mtd".to_string()),
            },
            ReportColumn {
                category: Category::Technicals,
                label: "RSI 14D".to_string(),
                field: ReportField::Trend("rsi".to_string()),
            },
            ReportColumn {
                category: Category::Valuation,
                label: "Valuation Z-Score".to_string(),
                field: ReportField::Composite("val_z".to_string()),
            },
        ]
    }

    fn record(name: &str, ticker: &str, mtd: Option<Decimal>, rsi: (Option<Decimal>, Option<Decimal>)) -> EntityRecord {
        let mut record = EntityRecord::new(Entity::new(name, ticker, None));
        record.push_metric("mtd", mtd).unwrap();
        record.push_metric("rsi", rsi.0).unwrap();
        record.push_reference("rsi", rsi.1).unwrap();
        record.push_trend("rsi", TrendIndicator::compare(rsi.0, rsi.1)).unwrap();
        record.push_composite("val_z", mtd.map(|v| v / dec!(2))).unwrap();
        record
    }

    #[test]
    fn rows_follow_the_layout_and_columns_the_records() {
        let records = vec![
            record("Technology", "TECNOWD", Some(dec!(1.2)), (Some(dec!(60)), Some(dec!(50)))),
            record("Financials", "FINANWD", None, (Some(dec!(40)), Some(dec!(45)))),
        ];
        let table = assemble(&records, &layout()).unwrap();

        assert_eq!(table.entities, vec!["Technology", "Financials"]);
        let labels: Vec<_> = table.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["MTD %", "RSI 14D", "Valuation Z-Score"]);

        let mtd = table.row("MTD %").unwrap();
        assert_eq!(mtd.cell("Technology"), Some(&Cell::Number { value: dec!(1.2) }));
        assert_eq!(mtd.cell("Financials"), Some(&Cell::Empty));

        let rsi = table.row("RSI 14D").unwrap();
        assert_eq!(
            rsi.cell("Technology"),
            Some(&Cell::Trend { value: dec!(60), direction: Direction::Up })
        );
        assert_eq!(
            rsi.cell("Financials"),
            Some(&Cell::Trend { value: dec!(40), direction: Direction::Down })
        );
        assert_eq!(table.row("Valuation Z-Score").unwrap().cell("Technology").unwrap().value(), Some(dec!(0.6)));
    }

    #[test]
    fn trend_without_reference_shows_the_bare_value() {
        let records = vec![
            record("Energy", "ENEGYWD", None, (Some(dec!(55)), None)),
            record("Utilities", "UTILSWD", None, (None, None)),
        ];
        let table = assemble(&records, &layout()).unwrap();
        let rsi = table.row("RSI 14D").unwrap();
        assert_eq!(rsi.cell("Energy"), Some(&Cell::Number { value: dec!(55) }));
        assert!(rsi.cell("Utilities").unwrap().is_empty());
    }

    #[test]
    fn records_from_another_catalog_are_rejected() {
        let records = vec![EntityRecord::new(Entity::new("Energy", "ENEGYWD", None))];
        let err = assemble(&records, &layout()).unwrap_err();
        assert_eq!(
            err,
            ReportError::MissingField {
                entity: "Energy".to_string(),
                kind: "metric",
                key: "mtd".to_string(),
            }
        );
    }

    #[test]
    fn rows_are_grouped_by_category() {
        let records = vec![record("Energy", "ENEGYWD", None, (None, None))];
        let table = assemble(&records, &layout()).unwrap();
        let groups: Vec<_> = table.groups().into_iter().map(|(c, rows)| (c, rows.len())).collect();
        assert_eq!(
            groups,
            vec![(Category::Performance, 1), (Category::Technicals, 1), (Category::Valuation, 1)]
        );
    }

    #[test]
    fn cells_serialize_with_their_kind() {
        let json = serde_json::to_value(Cell::Trend { value: dec!(1.5), direction: Direction::Up }).unwrap();
        assert_eq!(json["kind"], "trend");
        assert_eq!(json["direction"], "UP");
        assert_eq!(serde_json::to_value(Cell::Empty).unwrap()["kind"], "empty");
    }
}
