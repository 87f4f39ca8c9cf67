use core_types::{Category, CompositeDefinition, MetricDefinition};
use serde::Serialize;
use std::collections::HashSet;

/// Which record field a report row projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum ReportField {
    Metric(String),
    Trend(String),
    Composite(String),
}

impl ReportField {
    pub fn key(&self) -> &str {
        match self {
            ReportField::Metric(k) | ReportField::Trend(k) | ReportField::Composite(k) => k,
        }
    }
}

/// One row of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportColumn {
    pub category: Category,
    pub label: String,
    pub field: ReportField,
}

/// The standard layout: per category, every metric that is not itself a composite
/// input (shown as a trend when it has a reference window), followed by the
/// category's composites.
pub fn default_layout(
    metrics: &[MetricDefinition],
    composites: &[CompositeDefinition],
) -> Vec<ReportColumn> {
    let composite_inputs: HashSet<&str> = composites
        .iter()
        .flat_map(|c| c.inputs.iter().map(String::as_str))
        .collect();

    let mut layout = Vec::new();
    for category in Category::ALL {
        for metric in metrics.iter().filter(|m| m.category == category) {
            if composite_inputs.contains(metric.key.as_str()) {
                continue;
            }
            let field = if metric.has_trend_reference {
                ReportField::Trend(metric.key.clone())
            } else {
                ReportField::Metric(metric.key.clone())
            };
            layout.push(ReportColumn {
                category,
                label: metric.label.clone(),
                field,
            });
        }
        for composite in composites.iter().filter(|c| c.category == category) {
            layout.push(ReportColumn {
                category,
                label: composite.label.clone(),
                field: ReportField::Composite(composite.key.clone()),
            });
        }
    }
    layout
}
