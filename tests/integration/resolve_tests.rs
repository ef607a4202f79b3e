//! Integration tests for the resolver
//!
//! These tests use wiremock to serve a fake asset host and drive complete
//! resolution runs against it, plus an in-process asset source with per-URL
//! delays to check that selection does not depend on completion order.

use async_trait::async_trait;
use asset_sweep::catalog::Catalog;
use asset_sweep::config::{parse_config, Config};
use asset_sweep::locator::AssetKind;
use asset_sweep::resolver::{AssetSource, Coordinator, TransportFailure};
use asset_sweep::storage::{
    open_ledger, CatalogStore, FsAssetStore, JsonCatalogStore, RunLedger, RunStatus, SqliteLedger,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted in `dir` and pointing at `base_url`
fn create_test_config(dir: &Path, base_url: &str) -> Config {
    let content = format!(
        r#"
[resolver]
languages = ["zh", "en"]
probe-workers = 4
fetch-workers = 2
entity-workers = 2
probe-timeout-ms = 2000
fetch-timeout-ms = 2000

[remote]
base-url = "{base}"

[storage]
catalog-path = "{dir}/games.json"
asset-dir = "{dir}/images"
ledger-path = "{dir}/sweep.db"
summary-path = "{dir}/summary.md"

[[windows]]
start = 1001
end = 1002

[[keyword-ranges]]
keyword = "dragon"
start = 5001
end = 5002
"#,
        base = base_url,
        dir = dir.display()
    );
    parse_config(&content).expect("Failed to parse test config")
}

fn write_catalog(dir: &Path, json: &str) {
    std::fs::write(dir.join("games.json"), json).expect("Failed to write catalog");
}

fn read_catalog(dir: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(dir.join("games.json")).expect("Failed to read catalog");
    serde_json::from_str(&content).expect("Catalog is not valid JSON")
}

#[tokio::test]
async fn test_end_to_end_resolution_and_idempotent_rerun() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path(), &mock_server.uri());

    write_catalog(
        dir.path(),
        r#"[{"id": "dragon-1", "name": "Dragon Treasure", "imageMetadata": {"id": "5001"}}]"#,
    );

    Mock::given(method("HEAD"))
        .and(path("/zh/img/5001.webp"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    // Exactly one download across both runs
    Mock::given(method("GET"))
        .and(path("/zh/img/5001.webp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFF-webp-zh".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut coordinator = Coordinator::new(config.clone(), "hash".to_string()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.counters.fetched, 1);
    assert_eq!(summary.counters.entities_updated, 1);
    assert_eq!(summary.exhausted, vec![("dragon-1".to_string(), AssetKind::Icon)]);

    let catalog = read_catalog(dir.path());
    assert_eq!(
        catalog[0]["images"]["local_main"],
        "/assets/images/games/wg_game_5001_zh.webp"
    );
    assert!(catalog[0]["images"].get("local_icon").is_none());
    assert_eq!(
        std::fs::read(dir.path().join("images").join("wg_game_5001_zh.webp")).unwrap(),
        b"RIFF-webp-zh"
    );

    // Second run: the primary asset is already recorded
    let mut coordinator = Coordinator::new(config.clone(), "hash".to_string()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.counters.fetch_requests, 0);
    assert_eq!(summary.counters.already_present, 1);
    assert_eq!(summary.counters.entities_updated, 0);
    assert_eq!(
        read_catalog(dir.path())[0]["images"]["local_main"],
        "/assets/images/games/wg_game_5001_zh.webp"
    );

    let ledger = open_ledger(Path::new(&config.storage.ledger_path)).unwrap();
    let runs = ledger.list_runs().unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.status == RunStatus::Completed));
}

#[tokio::test]
async fn test_failed_fetch_leaves_asset_unset() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path(), &mock_server.uri());

    write_catalog(dir.path(), r#"[{"id": "g1", "name": "Lucky", "imageMetadata": {"id": 5001}}]"#);

    Mock::given(method("HEAD"))
        .and(path("/zh/img/5001.webp"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/zh/img/5001.webp"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut coordinator = Coordinator::new(config.clone(), "hash".to_string()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.counters.transport_failed, 1);
    assert_eq!(summary.counters.fetched, 0);
    assert_eq!(
        coordinator.catalog().get("g1").unwrap().asset_refs.get(AssetKind::Primary),
        None
    );
    assert!(!dir.path().join("images").join("wg_game_5001_zh.webp").exists());

    let ledger = open_ledger(Path::new(&config.storage.ledger_path)).unwrap();
    let counts = ledger.count_outcomes(summary.run_id).unwrap();
    assert_eq!(counts.get("transport_error"), Some(&1));
}

#[tokio::test]
async fn test_all_negative_entity_is_exhausted() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path(), &mock_server.uri());

    write_catalog(dir.path(), r#"[{"id": "gold-2", "name": "Mahjong"}]"#);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut coordinator = Coordinator::new(config.clone(), "hash".to_string()).unwrap();
    let summary = coordinator.run().await.unwrap();

    // window 1001-1002, two languages, two kinds
    assert_eq!(summary.counters.probes_sent, 8);
    assert_eq!(summary.counters.not_found, 2);
    assert_eq!(
        summary.exhausted,
        vec![
            ("gold-2".to_string(), AssetKind::Primary),
            ("gold-2".to_string(), AssetKind::Icon),
        ]
    );
    assert!(coordinator.catalog().get("gold-2").unwrap().asset_refs.is_empty());

    let ledger = open_ledger(Path::new(&config.storage.ledger_path)).unwrap();
    assert_eq!(ledger.get_exhausted(summary.run_id).unwrap().len(), 2);
}

/// Asset source whose probes complete after a per-URL delay
struct DelayedSource {
    delays: HashMap<String, Duration>,
}

impl DelayedSource {
    fn new(base: &str, delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(p, ms)| (format!("{}/{}", base, p), Duration::from_millis(*ms)))
                .collect(),
        }
    }
}

#[async_trait]
impl AssetSource for DelayedSource {
    async fn exists(&self, url: &str) -> bool {
        match self.delays.get(url) {
            Some(delay) => {
                tokio::time::sleep(*delay).await;
                true
            }
            None => false,
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportFailure> {
        if self.delays.contains_key(url) {
            Ok(url.as_bytes().to_vec())
        } else {
            Err(TransportFailure::Status(404))
        }
    }
}

#[tokio::test]
async fn test_preference_order_wins_over_completion_order() {
    let base = "https://assets.test/apigame";
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path(), base);

    // The preferred candidates answer last
    let source = Arc::new(DelayedSource::new(
        base,
        &[
            ("zh/img/5001.webp", 150),
            ("en/img/5001.webp", 0),
            ("en/img/1001_icon.webp", 150),
            ("zh/img/1002_icon.webp", 0),
        ],
    ));

    let catalog_path = dir.path().join("games.json");
    write_catalog(
        dir.path(),
        r#"[{"id": "g1", "name": "Lucky", "imageMetadata": {"id": "5001"}}]"#,
    );

    let mut coordinator = Coordinator::with_parts(
        config,
        source,
        Arc::new(FsAssetStore::new(dir.path().join("images"))),
        Box::new(JsonCatalogStore::new(&catalog_path)),
        Box::new(SqliteLedger::new_in_memory().unwrap()),
        "hash".to_string(),
    )
    .unwrap();

    coordinator.run().await.unwrap();

    let saved: Catalog = JsonCatalogStore::new(&catalog_path).load().unwrap();
    let entity = saved.get("g1").unwrap();
    assert_eq!(
        entity.asset_refs.get(AssetKind::Primary),
        Some("/assets/images/games/wg_game_5001_zh.webp")
    );
    assert_eq!(
        entity.asset_refs.get(AssetKind::Icon),
        Some("/assets/images/games/wg_game_1001_en_icon.webp")
    );
}

#[tokio::test]
async fn test_interrupted_run_keeps_merged_entities() {
    let base = "https://assets.test/apigame";
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path(), base);

    // "a" resolves at once, "b" stalls on its canonical probes
    let source = Arc::new(DelayedSource::new(
        base,
        &[
            ("zh/img/1001.webp", 0),
            ("zh/img/7777.webp", 30_000),
            ("en/img/7777.webp", 30_000),
        ],
    ));
    write_catalog(
        dir.path(),
        r#"[{"id": "a", "name": "A"}, {"id": "b", "name": "B", "imageMetadata": {"id": "7777"}}]"#,
    );

    let catalog_path = dir.path().join("games.json");
    let ledger_path = dir.path().join("sweep.db");
    let mut coordinator = Coordinator::with_parts(
        config,
        source,
        Arc::new(FsAssetStore::new(dir.path().join("images"))),
        Box::new(JsonCatalogStore::new(&catalog_path)),
        Box::new(open_ledger(&ledger_path).unwrap()),
        "hash".to_string(),
    )
    .unwrap();

    let cancel = coordinator.cancellation_token();
    let interrupt = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
    });

    let summary = tokio::time::timeout(Duration::from_secs(10), coordinator.run())
        .await
        .expect("Run did not stop after cancellation")
        .unwrap();
    interrupt.await.unwrap();

    assert_eq!(summary.status, RunStatus::Interrupted);
    assert_eq!(summary.counters.entities_processed, 1);

    let saved = JsonCatalogStore::new(&catalog_path).load().unwrap();
    assert_eq!(
        saved.get("a").unwrap().asset_refs.get(AssetKind::Primary),
        Some("/assets/images/games/wg_game_1001_zh.webp")
    );
    assert!(saved.get("b").unwrap().asset_refs.is_empty());
    assert!(dir.path().join("images").join("wg_game_1001_zh.webp").exists());

    let ledger = open_ledger(&ledger_path).unwrap();
    let run = ledger.get_run(summary.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Interrupted);
    assert!(run.finished_at.is_some());
    assert!(ledger
        .get_outcomes(summary.run_id)
        .unwrap()
        .iter()
        .all(|o| o.entity_id == "a"));
}
