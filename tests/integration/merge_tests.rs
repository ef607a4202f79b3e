//! Integration tests for discovery merging
//!
//! These tests fold discovery pass records into catalogs the way the
//! `--merge-pass` mode does and check the union semantics end to end.

use asset_sweep::catalog::{matcher_for, Catalog, Entity, KeywordClassifier, LocalizedText};
use asset_sweep::config::MergeConfig;
use asset_sweep::merge::DiscoveryMerger;
use asset_sweep::storage::{CatalogStore, JsonCatalogStore};

fn merger() -> DiscoveryMerger {
    DiscoveryMerger::new(
        matcher_for(&MergeConfig::default()),
        Box::new(KeywordClassifier::default()),
    )
}

fn record(id: &str, names: LocalizedText) -> Entity {
    Entity::new(id).with_names(names)
}

#[test]
fn test_merge_union_in_both_orders() {
    // X = {en: "A"}, Y = {en: "B", zh: "C"}, matched by id
    let config = MergeConfig {
        match_by: asset_sweep::config::MatchStrategy::Id,
        ..MergeConfig::default()
    };
    let merger = DiscoveryMerger::new(matcher_for(&config), Box::new(KeywordClassifier::default()));

    let x = || record("g1", LocalizedText::from([("en", "A")]));
    let y = || record("g1", LocalizedText::from([("en", "B"), ("zh", "C")]));

    let mut xy = Catalog::new();
    merger.fold(&mut xy, vec![x()]);
    merger.fold(&mut xy, vec![y()]);

    let mut yx = Catalog::new();
    merger.fold(&mut yx, vec![y()]);
    merger.fold(&mut yx, vec![x()]);

    for catalog in [&xy, &yx] {
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("g1").unwrap().names.get("zh"), Some("C"));
    }

    // The earliest merge owns the language it introduced
    assert_eq!(xy.get("g1").unwrap().names.get("en"), Some("A"));
    assert_eq!(yx.get("g1").unwrap().names.get("en"), Some("B"));
}

#[test]
fn test_repeated_pass_is_a_no_op() {
    let merger = merger();
    let pass = || {
        vec![
            record("dragon-1", LocalizedText::from([("en", "Dragon Treasure")])),
            record("baccarat-2", LocalizedText::from([("en", "Royal Baccarat"), ("th", "บาคาร่า")])),
        ]
    };

    let mut catalog = Catalog::new();
    let first = merger.fold(&mut catalog, pass());
    assert_eq!(first.created, 2);

    let snapshot = catalog.to_json_string().unwrap();
    let second = merger.fold(&mut catalog, pass());
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.unchanged, 2);
    assert_eq!(catalog.to_json_string().unwrap(), snapshot);
}

#[test]
fn test_pass_files_fold_into_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("games.json");
    let pass_path = dir.path().join("pass-th.json");

    std::fs::write(
        &catalog_path,
        r#"{"version": 3, "games": [
            {"id": "dragon-1", "name": "Dragon Treasure", "category": "Slot Games",
             "images": {"local_main": "/assets/images/games/wg_game_5001_zh.webp"}}
        ]}"#,
    )
    .unwrap();
    std::fs::write(
        &pass_path,
        r#"[
            {"id": "harvest-17", "name": {"en": "dragon treasure", "th": "มังกร"},
             "platform": ["Web", "Web", "iOS"]},
            {"id": "harvest-18", "name": {"en": "Live Studio"}}
        ]"#,
    )
    .unwrap();

    let store = JsonCatalogStore::new(&catalog_path);
    let mut catalog = store.load().unwrap();
    let records = JsonCatalogStore::new(&pass_path).load().unwrap().into_entities();

    let report = merger().fold(&mut catalog, records);
    assert_eq!(report.updated, 1);
    assert_eq!(report.created, 1);
    store.save(&catalog).unwrap();

    let saved = store.load().unwrap();
    assert_eq!(saved.len(), 2);

    let dragon = saved.get("dragon-1").unwrap();
    assert_eq!(dragon.names.get("en"), Some("Dragon Treasure"));
    assert_eq!(dragon.names.get("th"), Some("มังกร"));
    assert_eq!(dragon.platforms, vec!["Web".to_string(), "iOS".to_string()]);
    assert_eq!(dragon.category.as_deref(), Some("Slot Games"));
    assert!(dragon.asset_refs.primary.is_some());

    let studio = saved.get("harvest-18").unwrap();
    assert_eq!(studio.category.as_deref(), Some("Live Games"));
    assert_eq!(studio.platforms, vec!["Web".to_string(), "Mobile".to_string()]);
    assert!(!studio.features.is_empty() && studio.features.len() <= 4);

    let raw = std::fs::read_to_string(&catalog_path).unwrap();
    assert!(raw.contains("\"version\": 3"));
}
