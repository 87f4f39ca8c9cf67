//! End-to-end snapshot builds over the standard sector registry and catalog,
//! driven by a scripted client.

use aggregation::{AggregationEngine, AggregationError, EngineSettings, WindowRole};
use api_client::error::ApiError;
use api_client::MockClient;
use catalog::{EntityRegistry, MetricCatalog};
use core_types::{CompositeNullPolicy, Direction, Window};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

const MTD: &str = "PCH#(X(RI),MTD)";
const PERF_1Y: &str = "PCH#(X(RI),-1Y)";
const RSI: &str = "RSI#(X,14D)";
const FWD_PE_Z: &str = "(X(PEFD12)-AVG#(X(PEFD12),-10Y))/SDN#(X(PEFD12),-10Y)";
const PB_Z: &str = "(X(PTBV)-AVG#(X(PTBV),-10Y))/SDN#(X(PTBV),-10Y)";
const PC_Z: &str = "(X(PC)-AVG#(X(PC),-10Y))/SDN#(X(PC),-10Y)";
const PS_Z: &str = "(X(PS)-AVG#(X(PS),-10Y))/SDN#(X(PS),-10Y)";

fn healthcare_valuation(client: MockClient, price_book_z: Option<rust_decimal::Decimal>) -> MockClient {
    client
        .respond(FWD_PE_Z, Window::current(), &[("G#LHLTHCWD", Some(dec!(0.5)))])
        .respond(PB_Z, Window::current(), &[("G#LHLTHCWD", price_book_z)])
        .respond(PC_Z, Window::current(), &[("G#LHLTHCWD", Some(dec!(1.1)))])
        .respond(PS_Z, Window::current(), &[("G#LHLTHCWD", Some(dec!(0.7)))])
}

async fn build(
    client: MockClient,
    settings: EngineSettings,
) -> Result<aggregation::Snapshot, AggregationError> {
    let registry = EntityRegistry::sectors().unwrap();
    let catalog = MetricCatalog::standard().unwrap();
    AggregationEngine::new(Arc::new(client), settings)
        .build_snapshot(registry.list_entities(), &catalog)
        .await
}

#[tokio::test]
async fn mtd_values_are_left_joined_onto_every_sector() {
    let client = MockClient::new().respond(
        MTD,
        Window::current(),
        &[("TECNOWD", Some(dec!(1.2))), ("FINANWD", None)],
    );

    let snapshot = build(client, EngineSettings::default()).await.unwrap();

    assert_eq!(snapshot.records.len(), 11);
    assert_eq!(snapshot.record("Technology").unwrap().metric("mtd_performance"), Some(dec!(1.2)));
    assert_eq!(snapshot.record("Financials").unwrap().metric("mtd_performance"), None);
    for record in &snapshot.records {
        assert!(record.has_metric("mtd_performance"));
    }
}

#[tokio::test]
async fn healthcare_valuation_composite_is_the_mean_of_its_z_scores() {
    let client = healthcare_valuation(MockClient::new(), Some(dec!(-0.3)));

    let snapshot = build(client, EngineSettings::default()).await.unwrap();

    let healthcare = snapshot.record("Healthcare").unwrap();
    assert_eq!(healthcare.composite("valuation_z"), Some(dec!(0.5)));
    // No inputs at all for the other sectors.
    assert_eq!(snapshot.record("Energy").unwrap().composite("valuation_z"), None);
    assert!(snapshot.record("Energy").unwrap().has_composite("operations_z"));
}

#[tokio::test]
async fn null_policy_decides_partial_composites() {
    let skip = build(healthcare_valuation(MockClient::new(), None), EngineSettings::default())
        .await
        .unwrap();
    let composite = skip.record("Healthcare").unwrap().composite("valuation_z").unwrap();
    assert_eq!(composite.round_dp(6), dec!(0.766667));

    let strict = EngineSettings {
        null_policy: CompositeNullPolicy::NullIfAnyNull,
        ..EngineSettings::default()
    };
    let snapshot = build(healthcare_valuation(MockClient::new(), None), strict).await.unwrap();
    assert_eq!(snapshot.record("Healthcare").unwrap().composite("valuation_z"), None);
}

#[tokio::test]
async fn a_slow_metric_is_nulled_without_losing_the_others() {
    let client = MockClient::new()
        .respond(MTD, Window::current(), &[("TECNOWD", Some(dec!(1.2)))])
        .respond(PERF_1Y, Window::current(), &[("TECNOWD", Some(dec!(15)))])
        .delay(PERF_1Y, Duration::from_secs(5));
    let settings = EngineSettings {
        query_timeout: Duration::from_millis(100),
        ..EngineSettings::default()
    };

    let snapshot = build(client, settings).await.unwrap();

    for record in &snapshot.records {
        assert!(record.has_metric("perf_1y"));
        assert_eq!(record.metric("perf_1y"), None);
    }
    assert_eq!(snapshot.record("Technology").unwrap().metric("mtd_performance"), Some(dec!(1.2)));

    let timed_out: Vec<_> = snapshot
        .warnings
        .iter()
        .filter(|w| w.metric == "perf_1y")
        .collect();
    assert_eq!(timed_out.len(), 1);
    assert!(timed_out[0].reason.contains("timed out"));
}

#[tokio::test]
async fn trend_indicators_compare_against_the_reference_window() {
    let client = MockClient::new()
        .respond(RSI, Window::current(), &[("TECNOWD", Some(dec!(62))), ("ENEGYWD", Some(dec!(40)))])
        .respond(RSI, Window::days_ago(90), &[("TECNOWD", Some(dec!(55))), ("ENEGYWD", Some(dec!(40)))]);

    let snapshot = build(client, EngineSettings::default()).await.unwrap();

    let tech = snapshot.record("Technology").unwrap().trend("rsi_14").unwrap();
    assert_eq!(tech.direction, Direction::Up);
    assert_eq!(tech.value, dec!(62));
    let energy = snapshot.record("Energy").unwrap().trend("rsi_14").unwrap();
    assert_eq!(energy.direction, Direction::Down);
    assert_eq!(snapshot.record("Utilities").unwrap().trend("rsi_14"), None);
}

#[tokio::test]
async fn unreachable_service_produces_no_snapshot() {
    let client = MockClient::new().fail(
        PERF_1Y,
        Window::current(),
        ApiError::Unreachable("connection refused".to_string()),
    );
    let err = build(client, EngineSettings::default()).await.unwrap_err();
    assert!(matches!(err, AggregationError::Transport(ApiError::Unreachable(_))));

    let client = MockClient::new().refuse_connection(ApiError::Authentication("invalid credentials".to_string()));
    let err = build(client, EngineSettings::default()).await.unwrap_err();
    assert!(matches!(err, AggregationError::Transport(ApiError::Authentication(_))));
}

#[tokio::test]
async fn every_catalog_query_is_issued_once() {
    let client = Arc::new(MockClient::new());
    let registry = EntityRegistry::sectors().unwrap();
    let catalog = MetricCatalog::standard().unwrap();

    let snapshot = AggregationEngine::new(client.clone(), EngineSettings::default())
        .build_snapshot(registry.list_entities(), &catalog)
        .await
        .unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), catalog.query_count());
    let reference_calls = calls.iter().filter(|c| c.start == "-90D").count();
    assert_eq!(reference_calls, catalog.trend_metrics().count());
    // The estimate batch skips the sector without I/B/E/S coverage.
    let eps = calls.iter().find(|c| c.expression == "X(EPS1MN)").unwrap();
    assert_eq!(eps.ticker_list().count(), 10);

    // Nothing was scripted, so every query degrades.
    assert_eq!(snapshot.warnings.len(), catalog.query_count());
    assert!(snapshot
        .warnings
        .iter()
        .any(|w| w.metric == "rsi_14" && w.window == WindowRole::Reference));
}

#[tokio::test]
async fn snapshots_are_deterministic_and_independent() {
    let script = || {
        healthcare_valuation(MockClient::new(), Some(dec!(-0.3)))
            .respond(MTD, Window::current(), &[("TECNOWD", Some(dec!(1.2)))])
            .delay(MTD, Duration::from_millis(20))
    };

    let first = build(script(), EngineSettings::default()).await.unwrap();
    let serial = EngineSettings {
        max_concurrency: 1,
        ..EngineSettings::default()
    };
    let second = build(script(), serial).await.unwrap();

    assert_eq!(first.records, second.records);
    assert_ne!(first.id, second.id);

    let names: Vec<_> = first.records.iter().map(|r| r.name()).collect();
    assert_eq!(names[0], "Technology");
    assert_eq!(names[10], "Utilities");

    let catalog = MetricCatalog::standard().unwrap();
    let expected: Vec<_> = catalog.list_metrics().iter().map(|m| m.key.as_str()).collect();
    assert_eq!(first.records[0].metric_keys().collect::<Vec<_>>(), expected);
}
