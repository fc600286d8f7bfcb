//! StoreConfig loaded from TOML drives store behavior

use crate::common::*;
use tempfile::TempDir;

#[test]
fn store_built_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("optistore.toml");
    std::fs::write(
        &file,
        r#"
conflict_policy = "strict-abort"
history_depth = 2

[retry]
max_retries = 10
"#,
    )
    .unwrap();

    let config = StoreConfig::from_file(&file).unwrap();
    assert_eq!(config.conflict_policy, ConflictPolicy::StrictAbort);
    assert_eq!(config.retry.max_retries, Some(10));

    let store = SystemStore::with_config(v(json!({"a": 1, "b": 1})), config);
    for n in 2..=5 {
        let baseline = store.read();
        store.commit(&baseline, v(json!({"a": n, "b": 1}))).unwrap();
    }
    assert_eq!(store.history_len(), 2);

    // Strict policy: a stale but independent proposal is refused
    let stale = v(json!({"a": 1, "b": 1}));
    let err = store.commit(&stale, v(json!({"a": 1, "b": 2}))).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn config_toml_round_trip() {
    let config = StoreConfig::default()
        .with_history_depth(4)
        .with_transact_retries(2)
        .with_retry(RetryConfig::new().with_max_retries(7).with_max_delay_us(50));

    let text = config.to_toml_string().unwrap();
    assert_eq!(StoreConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn default_toml_documents_defaults() {
    let config = StoreConfig::from_toml_str(StoreConfig::default_toml()).unwrap();
    assert_eq!(config, StoreConfig::default());
}
