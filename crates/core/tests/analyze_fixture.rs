use std::path::Path;
use std::{
    fs,
    time::{SystemTime, UNIX_EPOCH},
};

use chrono::{DateTime, TimeZone, Utc};

use gcs_optimizer_core::{
    analyze_path,
    cost::Usd,
    report::Report,
    types::ActionKind,
    AnalyzeOptions,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

const DEMO: &str = "../../fixtures/demo_project/inventory.json";

#[test]
fn analyze_fixture_rows_are_stable() {
    let report = analyze_path(Path::new(DEMO), now(), AnalyzeOptions::default())
        .expect("analyze_path ok");

    assert_eq!(report.project_id.as_deref(), Some("demo-project"));
    assert_eq!(report.totals.bucket_count, 4);
    assert_eq!(report.totals.current_monthly_cost, Usd::from_cents(450));
    assert_eq!(report.totals.optimized_monthly_cost, Usd::from_cents(158));
    assert_eq!(report.totals.savings, Usd::from_cents(292));
    assert_eq!(report.totals.savings_percent, 64.8);

    insta::assert_json_snapshot!(report.rows());
}

#[test]
fn fixture_recommendations_follow_age_profile() {
    let report = analyze_path(Path::new(DEMO), now(), AnalyzeOptions::default()).unwrap();
    let detailed = report.detailed();

    let kinds = |i: usize| -> Vec<ActionKind> { detailed[i].1.iter().map(|a| a.kind).collect() };

    assert_eq!(detailed[0].0, "my-app-assets");
    assert_eq!(kinds(0), vec![ActionKind::ChangeClass]);
    assert_eq!(kinds(1), Vec::<ActionKind>::new());
    assert_eq!(
        kinds(2),
        vec![ActionKind::AddLifecyclePolicy, ActionKind::DisableOldVersions]
    );
    assert!(report.buckets[3].recommendation.empty_profile);
}

#[test]
fn identical_runs_export_identical_bytes() {
    let a = analyze_path(Path::new(DEMO), now(), AnalyzeOptions::default()).unwrap();
    let b = analyze_path(Path::new(DEMO), now(), AnalyzeOptions::default()).unwrap();
    let bytes = a.to_json().unwrap();
    assert_eq!(bytes, b.to_json().unwrap());

    let reloaded = Report::from_json(&bytes).unwrap();
    assert_eq!(reloaded.to_json().unwrap(), bytes);
}

#[test]
fn strict_mode_rejects_unknown_storage_class() {
    let input = Path::new("../../fixtures/invalid_class.json");
    let opts = AnalyzeOptions {
        strict: true,
        ..AnalyzeOptions::default()
    };

    let err = analyze_path(input, now(), opts).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("unknown storage class"), "{msg}");

    let report = analyze_path(input, now(), AnalyzeOptions::default()).unwrap();
    assert_eq!(report.buckets.len(), 1);
    assert_eq!(report.buckets[0].profile.name, "fine-bucket");
}

#[test]
fn project_override_and_baseline_comparison() {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let baseline_path =
        std::env::temp_dir().join(format!("gcs-optimizer-core-baseline-{nonce}.json"));
    fs::write(
        &baseline_path,
        r#"{"totals":{"current_monthly_cost":400,"optimized_monthly_cost":200},
            "buckets":[{"profile":{"name":"my-app-logs"}},{"profile":{"name":"retired-bucket"}}]}"#,
    )
    .unwrap();

    let opts = AnalyzeOptions {
        baseline_path: Some(baseline_path.clone()),
        project_id: Some("other-project".to_string()),
        ..AnalyzeOptions::default()
    };

    let report = analyze_path(Path::new(DEMO), now(), opts).expect("analyze with baseline");
    let cmp = report
        .baseline_comparison
        .as_ref()
        .expect("baseline comparison present");

    assert_eq!(report.project_id.as_deref(), Some("other-project"));
    assert_eq!(cmp.delta_current_monthly_cost, Usd::from_cents(50));
    assert_eq!(cmp.delta_optimized_monthly_cost, Usd::from_cents(-42));
    assert_eq!(
        cmp.added_buckets,
        vec!["my-app-assets", "data-lake", "empty-bucket"]
    );
    assert_eq!(cmp.removed_buckets, vec!["retired-bucket"]);

    let _ = fs::remove_file(baseline_path);
}

#[test]
fn missing_inventory_is_an_error() {
    let err = analyze_path(
        Path::new("../../fixtures/does-not-exist"),
        now(),
        AnalyzeOptions::default(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("failed to load inventory"));
}
