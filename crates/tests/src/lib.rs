//! # Integration Tests
//!
//! End-to-end tests across the workspace, with no broker required: the
//! simulator publishes into a channel-backed publisher and the ingestor
//! consumes the other end, exercising the same seams the MQTT transport
//! plugs into.

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::NaiveDate;
    use contracts::{
        ClockMode, PoleConfig, PoleId, Reading, ReadingPublisher, RetryConfig, SimulatorConfig,
        StoreConfig, StoreType, TelemetryError,
    };
    use ingestion::{create_ingestor, SqliteStore};
    use simulator::Simulator;
    use tokio::sync::watch;

    /// Publisher backed by a channel; the test stands in for the broker.
    struct ChannelPublisher {
        tx: async_channel::Sender<Reading>,
    }

    impl ReadingPublisher for ChannelPublisher {
        async fn publish(&self, reading: &Reading) -> Result<(), TelemetryError> {
            self.tx
                .send(reading.clone())
                .await
                .map_err(|e| TelemetryError::transport_publish("channel", e.to_string()))
        }
    }

    fn pole(id: u16) -> PoleConfig {
        PoleConfig {
            id: PoleId::new(id).unwrap(),
            min_level: 0.0,
            max_level: 8.0,
            initial_level: Some(2.0),
            trend_range: 0.2,
            noise_amplitude: 0.05,
            flip_probability: 0.1,
        }
    }

    fn replay_config(seed: u64) -> SimulatorConfig {
        SimulatorConfig {
            tick_period_ms: 1,
            seed: Some(seed),
            clock: ClockMode::Replay {
                start: NaiveDate::from_ymd_opt(2025, 11, 29)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap(),
                step_secs: 900,
            },
            retry: RetryConfig {
                max_attempts: 2,
                backoff_ms: 1,
            },
        }
    }

    fn reading(id: u64, pole: u16, level: f64, minute: u32) -> Reading {
        Reading {
            id,
            pole_id: PoleId::new(pole).unwrap(),
            water_level: level,
            observed_at: NaiveDate::from_ymd_opt(2025, 11, 29)
                .unwrap()
                .and_hms_opt(10, minute, 0)
                .unwrap(),
        }
    }

    fn json_store(name: &str, path: &std::path::Path) -> StoreConfig {
        StoreConfig {
            name: name.to_string(),
            store_type: StoreType::Json,
            queue_capacity: 512,
            params: HashMap::from([(
                "path".to_string(),
                path.to_string_lossy().into_owned(),
            )]),
        }
    }

    fn sqlite_store(name: &str, path: &std::path::Path) -> StoreConfig {
        StoreConfig {
            name: name.to_string(),
            store_type: StoreType::Sqlite,
            queue_capacity: 512,
            params: HashMap::from([(
                "path".to_string(),
                path.to_string_lossy().into_owned(),
            )]),
        }
    }

    fn read_snapshot(path: &std::path::Path) -> Vec<Reading> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    /// Simulator -> channel -> Ingestor -> JSON snapshot.
    #[tokio::test]
    async fn test_e2e_simulator_to_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("data.json");

        let (tx, rx) = async_channel::bounded(512);
        let poles = vec![pole(1), pole(2)];

        let ingestor = create_ingestor(vec![json_store("snapshot", &snapshot)], &poles, rx).unwrap();
        let ingestor_handle = ingestor.spawn();

        let sim = Simulator::new(&poles, &replay_config(42), ChannelPublisher { tx })
            .with_max_ticks(Some(50));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = sim.run(shutdown_rx).await;
        assert_eq!(stats.published, 100);

        // Simulator (and its publisher) dropped; ingestor drains and stops.
        let store_stats = tokio::time::timeout(Duration::from_secs(5), ingestor_handle)
            .await
            .expect("ingestor must drain")
            .unwrap();
        assert_eq!(store_stats[0].1.insert_count, 100);

        let stored = read_snapshot(&snapshot);
        assert_eq!(stored.len(), 100);

        // ids unique and monotonically increasing at the producer
        let ids: HashSet<u64> = stored.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 100);
        for w in stored.windows(2) {
            assert!(w[1].id > w[0].id);
        }

        // levels bounded and rounded to 2 decimals
        for r in &stored {
            assert!((0.0..=8.0).contains(&r.water_level), "level {}", r.water_level);
            let rounded = (r.water_level * 100.0).round() / 100.0;
            assert_eq!(r.water_level, rounded);
        }

        // per-pole observed_at non-decreasing
        for pole_id in [1u16, 2] {
            let times: Vec<_> = stored
                .iter()
                .filter(|r| r.pole_id.get() == pole_id)
                .map(|r| r.observed_at)
                .collect();
            assert_eq!(times.len(), 50);
            for w in times.windows(2) {
                assert!(w[1] >= w[0]);
            }
        }
    }

    /// At-least-once redelivery: one reading delivered twice, stored once.
    #[tokio::test]
    async fn test_duplicate_delivery_stored_once() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("data.json");
        let db = dir.path().join("readings.db");

        let (tx, rx) = async_channel::bounded(16);
        let poles = vec![pole(1)];
        let ingestor = create_ingestor(
            vec![json_store("snapshot", &snapshot), sqlite_store("db", &db)],
            &poles,
            rx,
        )
        .unwrap();
        let handle = ingestor.spawn();

        let duplicated = reading(7, 1, 4.52, 0);
        tx.send(duplicated.clone()).await.unwrap();
        tx.send(duplicated).await.unwrap();
        drop(tx);

        let store_stats = handle.await.unwrap();
        for (name, snapshot_stats) in &store_stats {
            assert_eq!(snapshot_stats.insert_count, 1, "store {name}");
            assert_eq!(snapshot_stats.duplicate_count, 1, "store {name}");
            assert_eq!(snapshot_stats.failure_count, 0, "store {name}");
        }

        let stored = read_snapshot(&snapshot);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, 7);
        assert_eq!(stored[0].water_level, 4.52);
        assert_eq!(
            stored[0].observed_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2025-11-29T10:00:00"
        );

        let check = SqliteStore::new("check", &db).unwrap();
        assert_eq!(check.count().unwrap(), 1);
    }

    /// Readings survive the wire codec byte-for-byte.
    #[tokio::test]
    async fn test_wire_roundtrip_preserves_readings() {
        let (tx, rx) = async_channel::unbounded();
        let sim = Simulator::new(
            &[pole(1), pole(2)],
            &replay_config(7),
            ChannelPublisher { tx },
        )
        .with_max_ticks(Some(10));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        sim.run(shutdown_rx).await;

        while let Ok(original) = rx.try_recv() {
            let topic = transport::topic::for_pole(original.pole_id);
            let payload = transport::codec::encode(&original).unwrap();
            let decoded = transport::codec::decode(&topic, &payload).unwrap();
            assert_eq!(decoded, original);
        }
    }

    /// A concurrent reader of the snapshot file must always parse a
    /// complete document, at any point during the run.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_snapshot_atomicity_under_concurrent_reads() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("data.json");

        let (tx, rx) = async_channel::bounded(512);
        let poles = vec![pole(1)];
        let ingestor = create_ingestor(vec![json_store("snapshot", &snapshot)], &poles, rx).unwrap();
        let handle = ingestor.spawn();

        // Snapshot exists (empty) from store creation, so the reader can
        // start immediately.
        let stop = Arc::new(AtomicBool::new(false));
        let parses = Arc::new(AtomicU64::new(0));
        let reader = {
            let stop = Arc::clone(&stop);
            let parses = Arc::clone(&parses);
            let path = snapshot.clone();
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let raw = std::fs::read_to_string(&path).expect("snapshot must exist");
                    let parsed: Result<Vec<Reading>, _> = serde_json::from_str(&raw);
                    assert!(parsed.is_ok(), "reader saw a partial document: {raw}");
                    parses.fetch_add(1, Ordering::Relaxed);
                }
            })
        };

        for i in 0..300u64 {
            tx.send(reading(i + 1, 1, 2.0 + (i % 10) as f64 * 0.1, 0))
                .await
                .unwrap();
        }
        drop(tx);
        handle.await.unwrap();

        stop.store(true, Ordering::Relaxed);
        reader.join().unwrap();
        assert!(parses.load(Ordering::Relaxed) > 0, "reader never sampled the file");

        assert_eq!(read_snapshot(&snapshot).len(), 300);
    }

    /// Out-of-order arrivals are accepted and stored as-is.
    #[tokio::test]
    async fn test_out_of_order_arrivals_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("data.json");

        let (tx, rx) = async_channel::bounded(16);
        let poles = vec![pole(1)];
        let ingestor = create_ingestor(vec![json_store("snapshot", &snapshot)], &poles, rx).unwrap();
        let handle = ingestor.spawn();

        tx.send(reading(1, 1, 2.0, 30)).await.unwrap();
        tx.send(reading(2, 1, 2.1, 0)).await.unwrap(); // earlier timestamp
        drop(tx);
        handle.await.unwrap();

        let stored = read_snapshot(&snapshot);
        assert_eq!(stored.len(), 2);
        assert!(stored[1].observed_at < stored[0].observed_at);
    }

    /// An out-of-range reading is rejected before any store sees it.
    #[tokio::test]
    async fn test_out_of_range_rejected_before_store() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("data.json");

        let (tx, rx) = async_channel::bounded(16);
        let poles = vec![pole(1)];
        let ingestor = create_ingestor(vec![json_store("snapshot", &snapshot)], &poles, rx).unwrap();
        let handle = ingestor.spawn();

        tx.send(reading(1, 1, 9.99, 0)).await.unwrap();
        tx.send(reading(2, 1, 4.0, 0)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let stored = read_snapshot(&snapshot);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, 2);
    }
}
