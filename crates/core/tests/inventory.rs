use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};

use gcs_optimizer_core::inventory::{load_inventory, ParseMode};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

const SPLIT: &str = "../../fixtures/split_inventory";

#[test]
fn directory_is_read_in_file_name_order() {
    let inv = load_inventory(Path::new(SPLIT), ParseMode::BestEffort, now(), u64::MAX).unwrap();
    let names: Vec<&str> = inv.buckets.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["web-static", "backups-2019"]);
    assert_eq!(inv.project_id.as_deref(), Some("demo-project"));
    assert!(inv.buckets[1].objects[0].age_days > 365);
}

#[test]
fn strict_directory_load_fails_on_bad_bucket_name() {
    let err = load_inventory(Path::new(SPLIT), ParseMode::Strict, now(), u64::MAX).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("02-archive.json"), "{msg}");
    assert!(msg.contains("Bad_Name"), "{msg}");
}

#[test]
fn scan_budget_stops_before_oversized_files() {
    let inv = load_inventory(Path::new(SPLIT), ParseMode::BestEffort, now(), 0).unwrap();
    assert!(inv.buckets.is_empty());
}

#[test]
fn conflicting_projects_fail_in_strict_mode() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.json"),
        r#"{"project_id":"one-project","buckets":[]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("b.json"),
        r#"{"project_id":"two-project","buckets":[]}"#,
    )
    .unwrap();

    assert!(load_inventory(dir.path(), ParseMode::Strict, now(), u64::MAX).is_err());
    let inv = load_inventory(dir.path(), ParseMode::BestEffort, now(), u64::MAX).unwrap();
    assert_eq!(inv.project_id.as_deref(), Some("one-project"));
}
