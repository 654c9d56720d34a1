// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
use logmerge_config::{
    ConfigError, ConfigStore, FsConfigStore, MergeConfigService, DEFAULT_PROFILE,
};
use logmerge_core::{MergeConfig, MergeError};
use logmerge_dry_tests::InMemoryConfigStore;

#[test]
fn missing_profile_loads_defaults() {
    let store = InMemoryConfigStore::new();
    let service = MergeConfigService::new(store.clone());
    assert_eq!(service.profile(), DEFAULT_PROFILE);
    assert_eq!(service.load().unwrap(), MergeConfig::default());
    assert_eq!(store.read_count(), 1);
}

#[test]
fn empty_profile_reads_as_missing() {
    let service =
        MergeConfigService::new(InMemoryConfigStore::with_raw(DEFAULT_PROFILE, Vec::new()));
    assert_eq!(service.load().unwrap(), MergeConfig::default());
}

#[test]
fn saved_limits_load_back() {
    let store = InMemoryConfigStore::new();
    let service = MergeConfigService::new(store.clone());
    let config = MergeConfig::default()
        .with_frontier_capacity(32)
        .with_max_in_flight(4);
    service.save(&config).unwrap();
    assert_eq!(store.write_count(), 1);
    assert_eq!(service.load().unwrap(), config);

    let raw = String::from_utf8(store.raw(DEFAULT_PROFILE).unwrap()).unwrap();
    assert!(raw.contains("\"frontier_capacity\": 32"), "{raw}");
}

#[test]
fn profiles_are_independent() {
    let store = InMemoryConfigStore::new();
    let wide = MergeConfigService::new(store.clone()).with_profile("wide");
    wide.save(&MergeConfig::default().with_max_in_flight(16)).unwrap();

    let default = MergeConfigService::new(store.clone());
    assert_eq!(default.load().unwrap(), MergeConfig::default());
    assert_eq!(wide.load().unwrap().max_in_flight, Some(16));
    assert!(store.raw("wide").is_some());
}

#[test]
fn partial_profile_fills_defaults() {
    let service = MergeConfigService::new(InMemoryConfigStore::with_raw(
        DEFAULT_PROFILE,
        br#"{ "max_in_flight": 2 }"#.to_vec(),
    ));
    let config = service.load().unwrap();
    assert_eq!(config.max_in_flight, Some(2));
    assert_eq!(config.frontier_capacity, None);
}

#[test]
fn unknown_fields_are_rejected() {
    let service = MergeConfigService::new(InMemoryConfigStore::with_raw(
        DEFAULT_PROFILE,
        br#"{ "max_inflight": 2 }"#.to_vec(),
    ));
    let err = service.load().unwrap_err();
    assert!(matches!(err, ConfigError::Json { .. }), "got {err:?}");
}

#[test]
fn zero_ceiling_is_rejected_on_load() {
    let service = MergeConfigService::new(InMemoryConfigStore::with_raw(
        DEFAULT_PROFILE,
        br#"{ "max_in_flight": 0 }"#.to_vec(),
    ));
    let err = service.load().unwrap_err();
    assert!(
        matches!(
            &err,
            ConfigError::Invalid { profile, error: MergeError::Config(_) } if profile == DEFAULT_PROFILE
        ),
        "got {err:?}"
    );
}

#[test]
fn zero_ceiling_is_never_written() {
    let store = InMemoryConfigStore::new();
    let service = MergeConfigService::new(store.clone());
    let err = service
        .save(&MergeConfig::default().with_frontier_capacity(0))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "got {err:?}");
    assert_eq!(store.write_count(), 0);
    assert!(store.raw(DEFAULT_PROFILE).is_none());
}

#[test]
fn limits_resolve_against_source_count() {
    let service = MergeConfigService::new(InMemoryConfigStore::with_raw(
        DEFAULT_PROFILE,
        br#"{ "frontier_capacity": 4 }"#.to_vec(),
    ));
    let limits = service.load_limits(3).unwrap();
    assert_eq!(limits.frontier_capacity(), 4);
    assert_eq!(limits.max_in_flight(), 3);
    assert!(matches!(
        service.load_limits(5),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn store_failures_propagate() {
    let store = InMemoryConfigStore::new();
    store.set_fail_on_read(true);
    store.set_fail_on_write(true);
    let service = MergeConfigService::new(store);
    assert!(matches!(service.load(), Err(ConfigError::Unavailable(_))));
    assert!(matches!(
        service.save(&MergeConfig::default()),
        Err(ConfigError::Unavailable(_))
    ));
}

#[test]
fn fs_store_creates_its_dir_on_first_save() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested");
    let store = FsConfigStore::at(&root);
    assert!(store.read(DEFAULT_PROFILE).unwrap().is_none());
    assert!(!root.exists());

    let service = MergeConfigService::new(store);
    let config = MergeConfig::default().with_max_in_flight(3);
    service.save(&config).unwrap();
    assert!(root.join("merge.json").is_file());
    assert!(!root.join("merge.json.tmp").exists());
    assert_eq!(service.load().unwrap(), config);

    let replaced = MergeConfig::default().with_frontier_capacity(9);
    service.save(&replaced).unwrap();
    assert_eq!(service.load().unwrap(), replaced);
}

#[test]
fn fs_store_rejects_path_like_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsConfigStore::at(dir.path());
    for bad in ["", "../escape", "a/b", "with.dot"] {
        assert!(
            matches!(store.write(bad, b"{}"), Err(ConfigError::ProfileName(_))),
            "accepted {bad:?}"
        );
    }
    assert_eq!(
        store.path_for("night-shift_2").unwrap(),
        dir.path().join("night-shift_2.json")
    );
}
