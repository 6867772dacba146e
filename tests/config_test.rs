//! 配置构建与文件读写测试

use rat_mongo_adapter::*;
use std::sync::Arc;

fn logging() -> LoggingConfig {
    LoggingConfig::builder()
        .level(LogLevel::Debug)
        .console(false)
        .build()
        .unwrap()
}

fn full_config() -> AdapterConfig {
    AdapterConfig::builder()
        .uri("mongodb://localhost:27017")
        .database("app")
        .logging(logging())
        .diagnostics(DiagnosticsConfig::new(true, 5))
        .build()
        .unwrap()
}

#[test]
fn test_builder_requires_every_item() {
    let err = AdapterConfig::builder()
        .database("app")
        .logging(logging())
        .diagnostics(DiagnosticsConfig::new(false, 5))
        .build()
        .unwrap_err();
    assert!(matches!(err, AdapterError::ConfigError { .. }));

    let err = AdapterConfig::builder()
        .uri("mongodb://localhost")
        .database("app")
        .logging(logging())
        .build()
        .unwrap_err();
    assert!(matches!(err, AdapterError::ConfigError { .. }));

    let err = LoggingConfig::builder().console(true).build().unwrap_err();
    assert!(matches!(err, AdapterError::ConfigError { .. }));
}

#[test]
fn test_builder_rejects_invalid_values() {
    let invalid = [
        ("postgres://localhost", "app", 5),
        ("mongodb://localhost", "", 5),
        ("mongodb://localhost", "app", 0),
    ];
    for (uri, database, depth) in invalid {
        let result = AdapterConfig::builder()
            .uri(uri)
            .database(database)
            .logging(logging())
            .diagnostics(DiagnosticsConfig::new(false, depth))
            .build();
        assert!(result.is_err(), "应拒绝 {} / {} / {}", uri, database, depth);
    }
}

#[test]
fn test_toml_and_json_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = full_config();

    for name in ["adapter.toml", "adapter.json"] {
        let path = dir.path().join(name);
        config.save_to_file(&path).unwrap();
        let loaded = AdapterConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config, "{} 读写后不一致", name);
    }

    let toml_text = std::fs::read_to_string(dir.path().join("adapter.toml")).unwrap();
    assert!(toml_text.contains("database = \"app\""));
}

#[test]
fn test_broken_or_missing_files_are_reported() {
    let dir = tempfile::tempdir().unwrap();

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "uri = [").unwrap();
    assert!(matches!(
        AdapterConfig::from_file(&broken).unwrap_err(),
        AdapterError::ConfigError { .. }
    ));

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        AdapterConfig::from_file(&missing).unwrap_err(),
        AdapterError::IoError(_)
    ));
}

#[test]
fn test_loaded_files_are_validated_like_built_ones() {
    let dir = tempfile::tempdir().unwrap();

    let zero_depth = dir.path().join("zero_depth.toml");
    std::fs::write(
        &zero_depth,
        r#"
uri = "mongodb://localhost:27017"
database = "app"

[logging]
level = "Info"
console = false

[diagnostics]
always_emit = false
max_depth = 0
"#,
    )
    .unwrap();
    assert!(matches!(
        AdapterConfig::from_file(&zero_depth).unwrap_err(),
        AdapterError::ConfigError { .. }
    ));

    let mut wrong_scheme = full_config();
    wrong_scheme.uri = "postgres://localhost".to_string();
    let json = dir.path().join("wrong_scheme.json");
    std::fs::write(&json, serde_json::to_string(&wrong_scheme).unwrap()).unwrap();
    assert!(matches!(
        AdapterConfig::from_file(&json).unwrap_err(),
        AdapterError::ConfigError { .. }
    ));

    let mut empty_database = full_config();
    empty_database.database.clear();
    assert!(empty_database.validate().is_err());
    assert!(full_config().validate().is_ok());
}

#[tokio::test]
async fn test_adapter_from_config_uses_diagnostics_settings() {
    let config = full_config();
    let catalog = ModelCatalog::from_models(vec![ModelMeta::new("notes")
        .field("id", object_id_field())
        .field("body", string_field(None, None, None))])
    .unwrap();

    let driver = Arc::new(MemoryDriver::new(&config.database));
    let adapter = MongoAdapter::from_config(driver.clone(), catalog, &config);
    assert!(adapter.catalog().contains("notes"));

    let result = adapter
        .create_record(NormalizedQuery::create("notes", Default::default()))
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(driver.insert_calls(), 1);
}

#[test]
fn test_init_logging_without_console_is_noop() {
    assert!(init_logging(&logging()).is_ok());
}
