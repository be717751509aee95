use std::io::Write;

use gcs_optimizer_core::{config::Config, pricing::StorageClass, Error};

#[test]
fn parse_valid_toml() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(
        f,
        r#"
project_id = "demo-project"
dominance_threshold = 0.75
old_version_fraction = 0.1
noncurrent_retention_days = 14
strict = true

[pricing.STANDARD]
storage_per_gb_month = 0.026

[pricing.nearline]
storage_per_gb_month = 0.013
min_storage_days = 30
"#
    )
    .unwrap();

    let cfg = Config::load(f.path()).unwrap();
    assert_eq!(cfg.project_id.as_deref(), Some("demo-project"));
    assert_eq!(cfg.strict, Some(true));
    assert_eq!(cfg.pricing.len(), 2);

    let engine = cfg.engine_config().unwrap();
    assert_eq!(engine.dominance_threshold, 0.75);
    assert_eq!(engine.old_version_fraction, 0.1);
    assert_eq!(engine.noncurrent_retention_days, 14);
    assert_eq!(engine.pricing.unit_price(StorageClass::Standard), 0.026);
    assert_eq!(engine.pricing.unit_price(StorageClass::Nearline), 0.013);
    assert_eq!(engine.pricing.unit_price(StorageClass::Archive), 0.0012);
}

#[test]
fn parse_empty_toml_gives_defaults() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "").unwrap();

    let cfg = Config::load(f.path()).unwrap();
    assert_eq!(cfg.project_id, None);
    assert_eq!(cfg.strict, None);
    assert!(cfg.pricing.is_empty());

    let engine = cfg.engine_config().unwrap();
    assert_eq!(engine.dominance_threshold, 0.6);
    assert_eq!(engine.old_version_fraction, 0.2);
}

#[test]
fn parse_invalid_toml_returns_error() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "this is not valid [ toml {{{{").unwrap();

    let result = Config::load(f.path());
    assert!(result.is_err());
}

#[test]
fn unknown_pricing_class_is_rejected() {
    let cfg: Config = toml::from_str(
        r#"
[pricing.GLACIER]
storage_per_gb_month = 0.001
"#,
    )
    .unwrap();
    assert_eq!(
        cfg.engine_config().unwrap_err(),
        Error::UnknownStorageClass("GLACIER".to_string())
    );
}

#[test]
fn overrides_that_invert_the_ordering_are_rejected() {
    let cfg: Config = toml::from_str(
        r#"
[pricing.ARCHIVE]
storage_per_gb_month = 0.5
"#,
    )
    .unwrap();
    assert!(matches!(
        cfg.engine_config().unwrap_err(),
        Error::InvalidPricing(_)
    ));
}
