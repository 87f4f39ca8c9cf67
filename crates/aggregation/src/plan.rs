use api_client::QueryRequest;
use core_types::{Entity, Frequency, MetricDefinition, TickerVariant, Window};
use serde::Serialize;
use std::collections::HashMap;

/// Which window a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowRole {
    Current,
    Reference,
}

/// One query the engine will issue, with what it needs to merge the result.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedQuery {
    pub key: String,
    pub role: WindowRole,
    pub variant: TickerVariant,
    pub request: QueryRequest,
}

/// Comma-joined ticker lists, built once per `(variant, frequency)` group.
pub fn ticker_batches(
    entities: &[Entity],
    metrics: &[MetricDefinition],
) -> HashMap<(TickerVariant, Frequency), String> {
    let mut batches = HashMap::new();
    for metric in metrics {
        batches
            .entry((metric.ticker_variant, metric.frequency))
            .or_insert_with(|| {
                entities
                    .iter()
                    .filter_map(|e| e.ticker(metric.ticker_variant))
                    .collect::<Vec<_>>()
                    .join(",")
            });
    }
    batches
}

/// Expands the catalog into queries in catalog order: the current window for
/// every metric, directly followed by the reference window for trend metrics.
pub fn plan_queries(
    entities: &[Entity],
    metrics: &[MetricDefinition],
    reference: Window,
) -> Vec<PlannedQuery> {
    let batches = ticker_batches(entities, metrics);
    let mut planned = Vec::with_capacity(metrics.len());

    for metric in metrics {
        let tickers = batches
            .get(&(metric.ticker_variant, metric.frequency))
            .cloned()
            .unwrap_or_default();

        let mut windows = vec![(WindowRole::Current, Window::current())];
        if metric.has_trend_reference {
            windows.push((WindowRole::Reference, reference));
        }

        for (role, window) in windows {
            planned.push(PlannedQuery {
                key: metric.key.clone(),
                role,
                variant: metric.ticker_variant,
                request: QueryRequest {
                    tickers: tickers.clone(),
                    start: window.start_param(),
                    end: window.end_param(),
                    frequency: metric.frequency,
                    expression: metric.query_expression.clone(),
                },
            });
        }
    }
    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Category;

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new("Technology", "TECNOWD", Some("@TECNOWD")),
            Entity::new("Real Estate", "RLESTWD", None),
        ]
    }

    #[test]
    fn batches_are_built_per_variant_and_frequency() {
        let metrics = vec![
            MetricDefinition::new("a", "A", Category::Performance, "X"),
            MetricDefinition::new("b", "B", Category::Cyclicality, "Y").monthly(),
            MetricDefinition::new("c", "C", Category::Earnings, "Z").on(TickerVariant::Estimate),
            MetricDefinition::new("d", "D", Category::Valuation, "W").on(TickerVariant::Level),
        ];
        let batches = ticker_batches(&entities(), &metrics);
        assert_eq!(batches.len(), 4);
        assert_eq!(batches[&(TickerVariant::Primary, Frequency::Daily)], "TECNOWD,RLESTWD");
        assert_eq!(batches[&(TickerVariant::Primary, Frequency::Monthly)], "TECNOWD,RLESTWD");
        assert_eq!(batches[&(TickerVariant::Estimate, Frequency::Daily)], "@TECNOWD");
        assert_eq!(batches[&(TickerVariant::Level, Frequency::Daily)], "G#LTECNOWD,G#LRLESTWD");
    }

    #[test]
    fn trend_metrics_get_a_reference_query() {
        let metrics = vec![
            MetricDefinition::new("rsi", "RSI", Category::Technicals, "RSI#(X,14D)").with_trend(),
            MetricDefinition::new("vol", "Vol", Category::Technicals, "SDN#(X,90D)"),
        ];
        let planned = plan_queries(&entities(), &metrics, Window::days_ago(90));

        let summary: Vec<_> = planned
            .iter()
            .map(|q| (q.key.as_str(), q.role, q.request.start.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("rsi", WindowRole::Current, "0D"),
                ("rsi", WindowRole::Reference, "-90D"),
                ("vol", WindowRole::Current, "0D"),
            ]
        );
        assert!(planned.iter().all(|q| q.request.start == q.request.end));
    }
}
