//! End-to-end tests of the fetch, parse, merge and report pipeline

use crate::support::{date, snapshot_xml, MemoryFetcher, StubResponse, StubServer};
use currency_rate_stats::downloader::{
    FailurePolicy, RunConfig, RunError, ScheduleMode, SnapshotExecutor,
};
use currency_rate_stats::fetcher::FetcherError;
use currency_rate_stats::report::render_human;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const EXPECTED_USD_LINE: &str = "USD                    (USD) – minimum value:  74.5000 on 03/01/2023; maximum value:  76.0000 on 04/01/2023; average value:  75.1667\n";

async fn three_day_server() -> StubServer {
    StubServer::with_documents(&[
        ("02/01/2023", snapshot_xml(&[("USD", "USD", "75,0000")])),
        ("03/01/2023", snapshot_xml(&[("USD", "USD", "74,5000")])),
        ("04/01/2023", snapshot_xml(&[("USD", "USD", "76,0000")])),
    ])
    .await
}

#[tokio::test]
async fn test_three_day_window_over_http() {
    for mode in [ScheduleMode::Sequential, ScheduleMode::Concurrent] {
        let server = three_day_server().await;
        let config = RunConfig::default()
            .with_base_url(server.base_url())
            .with_mode(mode);

        let report = SnapshotExecutor::from_config(config)
            .unwrap()
            .run(date(2023, 1, 1), 3)
            .await
            .unwrap();

        assert_eq!(render_human(&report), EXPECTED_USD_LINE, "mode {mode}");
        for day in ["02/01/2023", "03/01/2023", "04/01/2023"] {
            assert_eq!(server.hits(day), 1);
        }
        assert_eq!(server.hits("01/01/2023"), 0);
    }
}

#[tokio::test]
async fn test_malformed_snapshot_aborts_run() {
    let server = StubServer::with_documents(&[
        ("02/01/2023", snapshot_xml(&[("USD", "USD", "75,0000")])),
        ("03/01/2023", "<ValCurs><Valute>".to_string()),
        ("04/01/2023", snapshot_xml(&[("USD", "USD", "76,0000")])),
    ])
    .await;
    let config = RunConfig::default().with_base_url(server.base_url());

    let err = SnapshotExecutor::from_config(config)
        .unwrap()
        .run(date(2023, 1, 1), 3)
        .await
        .unwrap_err();

    assert_eq!(err.date(), Some(date(2023, 1, 3)));
    assert!(matches!(
        err.fetcher_error(),
        Some(FetcherError::MalformedDocument(_))
    ));
}

#[tokio::test]
async fn test_http_failure_names_the_day() {
    let routes = HashMap::from([
        (
            "02/01/2023".to_string(),
            vec![StubResponse::ok(snapshot_xml(&[("USD", "USD", "75,0")]))],
        ),
        ("03/01/2023".to_string(), vec![StubResponse::status(500)]),
    ]);
    let server = StubServer::start(routes).await;
    let config = RunConfig::default()
        .with_base_url(server.base_url())
        .with_mode(ScheduleMode::Sequential);

    let err = SnapshotExecutor::from_config(config)
        .unwrap()
        .run(date(2023, 1, 1), 2)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Snapshot { .. }));
    assert_eq!(err.date(), Some(date(2023, 1, 3)));
    assert!(err.to_string().contains("2023-01-03"));
}

#[tokio::test]
async fn test_skip_policy_over_http() {
    let server = StubServer::with_documents(&[
        ("02/01/2023", snapshot_xml(&[("USD", "USD", "75,0000")])),
        ("04/01/2023", snapshot_xml(&[("USD", "USD", "76,0000")])),
    ])
    .await;
    let config = RunConfig::default()
        .with_base_url(server.base_url())
        .with_failure_policy(FailurePolicy::Skip);

    let report = SnapshotExecutor::from_config(config)
        .unwrap()
        .run(date(2023, 1, 1), 3)
        .await
        .unwrap();

    assert_eq!(report.skipped().len(), 1);
    assert_eq!(report.skipped()[0].date, date(2023, 1, 3));
    let usd = &report.stats()[0];
    assert_eq!(usd.samples, 2);
    assert_eq!(usd.average, 75.5);
}

#[tokio::test]
async fn test_negative_period_makes_no_requests() {
    let server = three_day_server().await;
    let config = RunConfig::default().with_base_url(server.base_url());

    let err = SnapshotExecutor::from_config(config)
        .unwrap()
        .run(date(2023, 1, 1), -1)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::InvalidRange(_)));
    assert!(server.request_lines().is_empty());
}

/// Ten days of three currencies where later days answer first
fn reversed_latency_fetcher() -> MemoryFetcher {
    let mut fetcher = MemoryFetcher::new();
    for day in 2..=11_u32 {
        let usd = format!("{},{:04}", 70 + day % 4, day * 37);
        let eur = format!("{},{:04}", 80 - day % 3, day * 11);
        let cny = format!("10,{:04}", 1000 + day % 5);
        let xml = snapshot_xml(&[
            ("USD", "USD", usd.as_str()),
            ("EUR", "EUR", eur.as_str()),
            ("CNY", "CNY", cny.as_str()),
        ]);
        fetcher = fetcher
            .with_snapshot(date(2023, 1, day), xml)
            .with_delay(date(2023, 1, day), Duration::from_millis(u64::from(12 - day) * 10));
    }
    fetcher
}

#[tokio::test(start_paused = true)]
async fn test_modes_produce_identical_reports() {
    let sequential = SnapshotExecutor::new(Arc::new(reversed_latency_fetcher()))
        .with_mode(ScheduleMode::Sequential)
        .run(date(2023, 1, 1), 10)
        .await
        .unwrap();
    let concurrent = SnapshotExecutor::new(Arc::new(reversed_latency_fetcher()))
        .with_mode(ScheduleMode::Concurrent)
        .run(date(2023, 1, 1), 10)
        .await
        .unwrap();

    assert_eq!(sequential.len(), 3);
    assert_eq!(render_human(&sequential), render_human(&concurrent));
    assert_eq!(sequential.stats(), concurrent.stats());
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_cap_is_respected() {
    let fetcher = Arc::new(reversed_latency_fetcher());
    SnapshotExecutor::new(fetcher.clone())
        .with_max_concurrency(Some(3))
        .run(date(2023, 1, 1), 10)
        .await
        .unwrap();

    assert_eq!(fetcher.peak(), 3);
    assert_eq!(fetcher.completed(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_mode_overlaps_every_request() {
    let fetcher = Arc::new(reversed_latency_fetcher());
    SnapshotExecutor::new(fetcher.clone())
        .run(date(2023, 1, 1), 10)
        .await
        .unwrap();

    assert_eq!(fetcher.peak(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_mode_fetches_one_at_a_time() {
    let fetcher = Arc::new(reversed_latency_fetcher());
    SnapshotExecutor::new(fetcher.clone())
        .with_mode(ScheduleMode::Sequential)
        .run(date(2023, 1, 1), 10)
        .await
        .unwrap();

    assert_eq!(fetcher.peak(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_abort_cancels_outstanding_requests() {
    // Day 1 has no snapshot and fails at once; the rest would take a minute
    let mut fetcher = MemoryFetcher::new();
    for day in 3..=6_u32 {
        fetcher = fetcher
            .with_snapshot(date(2023, 1, day), snapshot_xml(&[("USD", "USD", "75,0")]))
            .with_delay(date(2023, 1, day), Duration::from_secs(60));
    }
    let fetcher = Arc::new(fetcher);

    let err = SnapshotExecutor::new(fetcher.clone())
        .run(date(2023, 1, 1), 5)
        .await
        .unwrap_err();

    assert_eq!(err.date(), Some(date(2023, 1, 2)));
    // Only the failing day ran to completion
    assert_eq!(fetcher.completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_later_failure_aborts_without_waiting_for_earlier_days() {
    // Day 1 is slow but fine; day 2 fails at once
    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_snapshot(date(2023, 1, 2), snapshot_xml(&[("USD", "USD", "75,0")]))
            .with_delay(date(2023, 1, 2), Duration::from_secs(60)),
    );

    let started = tokio::time::Instant::now();
    let err = SnapshotExecutor::new(fetcher.clone())
        .run(date(2023, 1, 1), 2)
        .await
        .unwrap_err();

    assert_eq!(err.date(), Some(date(2023, 1, 3)));
    assert!(started.elapsed() < Duration::from_secs(60));
    // The slow day was abandoned, not awaited
    assert_eq!(fetcher.completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_report_keeps_first_seen_currency_order() {
    // The later day answers first and introduces a new currency
    let fetcher = || {
        MemoryFetcher::new()
            .with_snapshot(
                date(2023, 1, 2),
                snapshot_xml(&[("USD", "USD", "75,0"), ("AUD", "AUD", "48,0")]),
            )
            .with_delay(date(2023, 1, 2), Duration::from_millis(50))
            .with_snapshot(
                date(2023, 1, 3),
                snapshot_xml(&[("CNY", "CNY", "10,5"), ("AUD", "AUD", "48,5")]),
            )
    };

    for mode in [ScheduleMode::Sequential, ScheduleMode::Concurrent] {
        let report = SnapshotExecutor::new(Arc::new(fetcher()))
            .with_mode(mode)
            .run(date(2023, 1, 1), 2)
            .await
            .unwrap();

        let codes: Vec<String> = report.stats().into_iter().map(|s| s.code).collect();
        assert_eq!(codes, vec!["USD", "AUD", "CNY"], "mode {mode}");
    }
}
