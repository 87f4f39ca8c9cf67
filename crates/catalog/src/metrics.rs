use crate::error::CatalogError;
use crate::layout::{default_layout, ReportColumn, ReportField};
use core_types::{Category, CompositeDefinition, MetricDefinition, TickerVariant};
use std::collections::HashSet;

pub const VALUATION_COMPOSITE: &str = "valuation_z";
pub const OPERATIONS_COMPOSITE: &str = "operations_z";

/// The ordered set of metric queries, the composites derived from them and the
/// report layout.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    metrics: Vec<MetricDefinition>,
    composites: Vec<CompositeDefinition>,
    layout: Vec<ReportColumn>,
}

impl MetricCatalog {
    /// Builds and validates a catalog.
    pub fn new(
        metrics: Vec<MetricDefinition>,
        composites: Vec<CompositeDefinition>,
        layout: Vec<ReportColumn>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            metrics,
            composites,
            layout,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Builds a catalog whose layout is derived with [`default_layout`].
    pub fn with_default_layout(
        metrics: Vec<MetricDefinition>,
        composites: Vec<CompositeDefinition>,
    ) -> Result<Self, CatalogError> {
        let layout = default_layout(&metrics, &composites);
        Self::new(metrics, composites, layout)
    }

    /// The sector dashboard's catalog.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::with_default_layout(standard_metrics(), standard_composites())
    }

    pub fn list_metrics(&self) -> &[MetricDefinition] {
        &self.metrics
    }

    pub fn composites(&self) -> &[CompositeDefinition] {
        &self.composites
    }

    pub fn layout(&self) -> &[ReportColumn] {
        &self.layout
    }

    pub fn metric(&self, key: &str) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|m| m.key == key)
    }

    pub fn trend_metrics(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.metrics.iter().filter(|m| m.has_trend_reference)
    }

    /// Number of provider queries one snapshot issues.
    pub fn query_count(&self) -> usize {
        self.metrics.len() + self.trend_metrics().count()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut keys = HashSet::new();
        let mut last_category = None;

        for metric in &self.metrics {
            if metric.key.trim().is_empty() {
                return Err(CatalogError::Malformed {
                    key: metric.label.clone(),
                    reason: "key is empty".to_string(),
                });
            }
            if metric.query_expression.trim().is_empty() {
                return Err(CatalogError::Malformed {
                    key: metric.key.clone(),
                    reason: "query expression is empty".to_string(),
                });
            }
            if !keys.insert(metric.key.as_str()) {
                return Err(CatalogError::DuplicateMetric(metric.key.clone()));
            }
            if last_category.is_some_and(|last| metric.category < last) {
                return Err(CatalogError::CategoryOutOfOrder(metric.key.clone()));
            }
            last_category = Some(metric.category);
        }

        for composite in &self.composites {
            if !keys.insert(composite.key.as_str()) {
                return Err(CatalogError::DuplicateMetric(composite.key.clone()));
            }
            if composite.inputs.is_empty() {
                return Err(CatalogError::Malformed {
                    key: composite.key.clone(),
                    reason: "composite has no inputs".to_string(),
                });
            }
            for input in &composite.inputs {
                if self.metric(input).is_none() {
                    return Err(CatalogError::UnknownCompositeInput {
                        composite: composite.key.clone(),
                        input: input.clone(),
                    });
                }
            }
        }

        let mut last_category = None;
        for column in &self.layout {
            let resolves = match &column.field {
                ReportField::Metric(key) => self.metric(key).is_some(),
                ReportField::Trend(key) => self.metric(key).is_some_and(|m| m.has_trend_reference),
                ReportField::Composite(key) => self.composites.iter().any(|c| &c.key == key),
            };
            if !resolves {
                return Err(CatalogError::UnknownLayoutField(column.field.key().to_string()));
            }
            if last_category.is_some_and(|last| column.category < last) {
                return Err(CatalogError::CategoryOutOfOrder(column.field.key().to_string()));
            }
            last_category = Some(column.category);
        }

        Ok(())
    }
}

fn standard_metrics() -> Vec<MetricDefinition> {
    use Category::*;
    use TickerVariant::{Estimate, Level};

    vec![
        // Performance
        MetricDefinition::new("perf_1d", "1D %", Performance, "PCH#(X(RI),-1D)"),
        MetricDefinition::new("perf_1w", "1W %", Performance, "PCH#(X(RI),-1W)"),
        MetricDefinition::new("mtd_performance", "MTD %", Performance, "PCH#(X(RI),MTD)"),
        MetricDefinition::new("ytd_performance", "YTD %", Performance, "PCH#(X(RI),YTD)"),
        MetricDefinition::new("perf_1y", "1Y %", Performance, "PCH#(X(RI),-1Y)"),
        // Technicals
        MetricDefinition::new("rsi_14", "RSI 14D", Technicals, "RSI#(X,14D)").with_trend(),
        MetricDefinition::new("px_vs_50d", "Px vs 50D MA %", Technicals, "(X/MAV#(X,50D)-1)*100"),
        MetricDefinition::new("px_vs_200d", "Px vs 200D MA %", Technicals, "(X/MAV#(X,200D)-1)*100")
            .with_trend(),
        MetricDefinition::new(
            "volatility_90d",
            "Volatility 90D %",
            Technicals,
            "SDN#(PCH#(X(RI),-1D),90D)*SQRT(252)",
        ),
        MetricDefinition::new("drawdown_52w", "Off 52W High %", Technicals, "(X/MAX#(X,-52W)-1)*100"),
        // Cyclicality
        MetricDefinition::new("beta_5y", "Beta vs World 5Y", Cyclicality, "BETA#(X(RI),TOTMKWD(RI),60)")
            .monthly(),
        MetricDefinition::new(
            "correlation_5y",
            "Correl. vs World 5Y",
            Cyclicality,
            "CORR#(X(RI),TOTMKWD(RI),60)",
        )
        .monthly(),
        // Earnings
        MetricDefinition::new("eps_fy1", "EPS FY1", Earnings, "X(EPS1MN)")
            .on(Estimate)
            .with_trend(),
        MetricDefinition::new("eps_growth_fy1", "EPS Growth FY1 %", Earnings, "(X(EPS1MN)/X(EPS0MN)-1)*100")
            .on(Estimate),
        MetricDefinition::new("eps_revision_3m", "EPS Rev. 3M %", Earnings, "PCH#(X(EPS1MN),-3M)")
            .on(Estimate),
        MetricDefinition::new("revision_ratio", "Up/Down Revisions", Earnings, "X(EPS1UP)/X(EPS1DN)")
            .on(Estimate),
        MetricDefinition::new("ltg", "LT Growth %", Earnings, "X(LTMN)").on(Estimate),
        // Valuation
        MetricDefinition::new("forward_pe", "Fwd P/E", Valuation, "X(PEFD12)")
            .on(Level)
            .with_trend(),
        MetricDefinition::new(
            "forward_pe_z",
            "Fwd P/E Z",
            Valuation,
            "(X(PEFD12)-AVG#(X(PEFD12),-10Y))/SDN#(X(PEFD12),-10Y)",
        )
        .on(Level),
        MetricDefinition::new("price_book", "P/B", Valuation, "X(PTBV)").on(Level),
        MetricDefinition::new(
            "price_book_z",
            "P/B Z",
            Valuation,
            "(X(PTBV)-AVG#(X(PTBV),-10Y))/SDN#(X(PTBV),-10Y)",
        )
        .on(Level),
        MetricDefinition::new("price_cash", "P/CF", Valuation, "X(PC)").on(Level),
        MetricDefinition::new(
            "price_cash_z",
            "P/CF Z",
            Valuation,
            "(X(PC)-AVG#(X(PC),-10Y))/SDN#(X(PC),-10Y)",
        )
        .on(Level),
        MetricDefinition::new("price_sales", "P/S", Valuation, "X(PS)").on(Level),
        MetricDefinition::new(
            "price_sales_z",
            "P/S Z",
            Valuation,
            "(X(PS)-AVG#(X(PS),-10Y))/SDN#(X(PS),-10Y)",
        )
        .on(Level),
        MetricDefinition::new("dividend_yield", "Div. Yield %", Valuation, "X(DY)"),
        // Operations
        MetricDefinition::new("roe", "ROE %", Operations, "X(ROE)")
            .on(Level)
            .with_trend(),
        MetricDefinition::new(
            "roe_z",
            "ROE Z",
            Operations,
            "(X(ROE)-AVG#(X(ROE),-10Y))/SDN#(X(ROE),-10Y)",
        )
        .on(Level),
        MetricDefinition::new("net_profit_margin", "Net Margin %", Operations, "X(NPM)").on(Level),
        MetricDefinition::new(
            "net_profit_margin_z",
            "Net Margin Z",
            Operations,
            "(X(NPM)-AVG#(X(NPM),-10Y))/SDN#(X(NPM),-10Y)",
        )
        .on(Level),
        MetricDefinition::new("operating_margin", "Op. Margin %", Operations, "X(OPM)").on(Level),
        MetricDefinition::new(
            "operating_margin_z",
            "Op. Margin Z",
            Operations,
            "(X(OPM)-AVG#(X(OPM),-10Y))/SDN#(X(OPM),-10Y)",
        )
        .on(Level),
    ]
}

fn standard_composites() -> Vec<CompositeDefinition> {
    vec![
        CompositeDefinition::new(
            VALUATION_COMPOSITE,
            "Valuation Z-Score",
            Category::Valuation,
            &["forward_pe_z", "price_book_z", "price_cash_z", "price_sales_z"],
        ),
        CompositeDefinition::new(
            OPERATIONS_COMPOSITE,
            "Operations Z-Score",
            Category::Operations,
            &["roe_z", "net_profit_margin_z", "operating_margin_z"],
        ),
    ]
}
