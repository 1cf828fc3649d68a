mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use drove::prelude::*;
    use drove_core::RunConfig;
    use drove_runtime::catalog::ArchetypeChoice;
    use drove_runtime::cli::ProtocolChoice;
    use drove_runtime::{DroveRuntime, RuntimeConfig};
    use mock_service::MockOptions;
    use std::sync::Arc;
    use std::time::Duration;

    fn browsing() -> Archetype<RestAdapter> {
        Archetype::<RestAdapter>::builder("browsing")
            .think_time(Duration::from_millis(10), Duration::from_millis(30))
            .action("GET /terms", 3, |ctx| {
                Box::pin(async move {
                    let outcome = ctx.adapter.call(Operation::ListTerms).await;
                    ctx.session.refresh_from(&outcome);
                    outcome
                })
            })
            .action("GET /graph", 1, |ctx| {
                Box::pin(async move { ctx.adapter.call(Operation::GetGraph).await })
            })
            .build()
            .unwrap()
    }

    fn config(base_url: String, archetype: &str, run_time: Option<Duration>) -> RuntimeConfig {
        RuntimeConfig {
            run: RunConfig {
                rest_base_url: base_url,
                population: 4,
                spawn_rate: 20.,
                run_time,
                grace_period: Duration::from_secs(3),
                ..Default::default()
            },
            protocol: ProtocolChoice::Rest,
            archetypes: vec![archetype.parse::<ArchetypeChoice>().unwrap()],
            report_interval: Duration::from_millis(500),
            ..Default::default()
        }
    }

    #[tokio::test]
    #[ntest::timeout(20_000)]
    async fn users_run_against_the_mock_service() {
        init();
        let base = mock(MockOptions::default().latency(Duration::from_millis(2))).await;
        let factory = RestAdapterFactory::new(&base, Duration::from_secs(2)).unwrap();
        let bucket = Arc::new(BucketSink::new());

        let running = LoadTest::new(factory)
            .archetype(Arc::new(browsing()), 1)
            .population(5)
            .spawn_rate(50.)
            .sink(bucket.clone())
            .start()
            .await
            .unwrap();
        let stats = running.run_for(Duration::from_secs(1)).await;

        assert_eq!(stats.population, 5);
        assert_eq!(stats.spawned, 5);
        assert_eq!(stats.failed_to_connect, 0);
        assert_eq!(stats.lingering, 0);
        assert!(stats.actions > 20, "{stats}");

        let events = bucket.drain();
        assert_eq!(events.len() as u64, stats.actions);
        assert!(events.iter().all(|e| e.protocol == Protocol::Rest && !e.failed));
        assert!(events.iter().any(|e| e.operation == "GET /graph"));
    }

    #[tokio::test]
    #[ntest::timeout(20_000)]
    async fn runtime_reports_and_logs_every_event() {
        init();
        let base = mock(MockOptions::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let events_file = dir.path().join("events.jsonl");

        let config = RuntimeConfig {
            events_file: Some(events_file.clone()),
            ..config(base, "stress", Some(Duration::from_secs(2)))
        };
        let report = DroveRuntime::new()
            .config(config)
            .run_until(std::future::pending())
            .await
            .unwrap();

        assert_eq!(report.stats.spawned, 4);
        assert_eq!(report.total_failures(), 0, "{report}");
        assert!(!report.operations.is_empty());
        assert!(report
            .operations
            .iter()
            .all(|op| op.operation.ends_with("[stress]")));

        let logged = std::fs::read_to_string(&events_file).unwrap();
        let total: u64 = report.operations.iter().map(|op| op.count).sum();
        assert_eq!(logged.lines().count() as u64, total);
        let first: serde_json::Value = serde_json::from_str(logged.lines().next().unwrap()).unwrap();
        assert_eq!(first["protocol"], "REST");
    }

    #[tokio::test]
    #[ntest::timeout(20_000)]
    async fn interrupt_ends_an_open_ended_run() {
        init();
        let base = mock(MockOptions::default()).await;

        let report = DroveRuntime::new()
            .config(config(base, "heavy", None))
            .run_until(tokio::time::sleep(Duration::from_millis(800)))
            .await
            .unwrap();

        assert_eq!(report.stats.population, 4);
        assert!(report.stats.elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn unreachable_service_is_reported_as_unavailable() {
        init();
        let base = format!("http://{}", closed_addr());

        let report = DroveRuntime::new()
            .config(config(base, "stress", Some(Duration::from_secs(2))))
            .run_until(std::future::pending())
            .await
            .unwrap();

        assert!(report.total_failures() > 0);
        for op in &report.operations {
            assert_eq!(op.failures, op.count, "{}", op.operation);
            assert!(op
                .failure_details
                .iter()
                .all(|(detail, _)| detail.starts_with("Unavailable")));
        }
    }
}
