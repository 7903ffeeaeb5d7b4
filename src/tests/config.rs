use crate::config::{Config, ConfigError, ImageMode, TieBreak};

fn base_path(dir: &tempfile::TempDir) -> String {
    dir.path().to_str().unwrap().to_string()
}

#[test]
fn test_first_load_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let config = Config::load_with(&base_path(&dir)).unwrap();

    assert_eq!(config.image_mode, ImageMode::SmartSelect);
    assert_eq!(config.load_timeout_ms, 5000);
    assert_eq!(config.max_description_length, 130);
    assert_eq!(config.history_length, 5);
    assert_eq!(config.logo_color_tie_break, TieBreak::First);
    assert!(dir.path().join("config.yaml").exists());
}

#[test]
fn test_partial_config_is_completed_and_resaved() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        "image_mode: brand_cards\nhistory_length: 2\n",
    )
    .unwrap();

    let config = Config::load_with(&base_path(&dir)).unwrap();
    assert_eq!(config.image_mode, ImageMode::BrandCards);
    assert_eq!(config.history_length, 2);
    assert_eq!(config.fetch_retries, 3);

    let saved = std::fs::read_to_string(dir.path().join("config.yaml")).unwrap();
    assert!(saved.contains("favicon_service"));
    assert!(saved.contains("excluded_keywords"));
}

#[test]
fn test_bad_heuristic_pattern_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        "heuristics:\n  content_zone_pattern: \"(unclosed\"\n",
    )
    .unwrap();

    let err = Config::load_with(&base_path(&dir)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "heuristics.content_zone_pattern"));
}

#[test]
fn test_favicon_template_needs_placeholder() {
    let mut config = Config::default();
    config.favicon_service = "https://icons.test/fixed.png".into();
    assert!(config.validate().is_err());

    let config = Config::default();
    assert!(config.validate().is_ok());
    assert!(config.favicon_url("example.com").contains("url=http://example.com"));
}

#[test]
fn test_malformed_yaml_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.yaml"), "load_timeout_ms: [1, 2\n").unwrap();

    assert!(matches!(
        Config::load_with(&base_path(&dir)),
        Err(ConfigError::Malformed(_))
    ));
}
