pub mod apply;
pub mod baseline;
pub mod classify;
pub mod config;
pub mod cost;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod pricing;
pub mod recommend;
pub mod report;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use log::info;

pub use crate::error::{Error, Result};

use crate::{
    baseline::Baseline,
    classify::classify,
    cost::estimate,
    inventory::{Inventory, ParseMode},
    recommend::{recommend, EngineConfig},
    report::{BucketReport, Report},
};

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub strict: bool,
    pub baseline_path: Option<PathBuf>,
    /// Replaces the project recorded in the inventory.
    pub project_id: Option<String>,
    pub max_total_bytes_scanned: u64,
    pub engine: EngineConfig,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            strict: false,
            baseline_path: None,
            project_id: None,
            max_total_bytes_scanned: 512 * 1024 * 1024,
            engine: EngineConfig::default(),
        }
    }
}

/// Classify, recommend and cost every bucket, in inventory order.
pub fn analyze(inventory: &Inventory, cfg: &EngineConfig, now: DateTime<Utc>) -> Result<Report> {
    let buckets = inventory
        .buckets
        .iter()
        .map(|bucket| -> Result<BucketReport> {
            let profile = classify(bucket);
            let recommendation = recommend(&profile, cfg)?;
            let cost = estimate(&profile, &recommendation, &cfg.pricing);
            Ok(BucketReport {
                profile,
                recommendation,
                cost,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let report = Report::new(inventory.project_id.clone(), now, buckets);
    info!(
        "analyzed {} buckets: {} -> {} per month",
        report.totals.bucket_count,
        report.totals.current_monthly_cost,
        report.totals.optimized_monthly_cost
    );
    Ok(report)
}

/// Loads the inventory at `input`, analyzes it as of `now`, and attaches a
/// baseline comparison when one is configured.
pub fn analyze_path(
    input: &Path,
    now: DateTime<Utc>,
    opts: AnalyzeOptions,
) -> anyhow::Result<Report> {
    let parse_mode = if opts.strict {
        ParseMode::Strict
    } else {
        ParseMode::BestEffort
    };

    let mut inventory =
        inventory::load_inventory(input, parse_mode, now, opts.max_total_bytes_scanned)
            .with_context(|| format!("failed to load inventory at {}", input.display()))?;
    if let Some(p) = opts.project_id {
        inventory.project_id = Some(p);
    }

    let mut report = analyze(&inventory, &opts.engine, now).context("analysis failed")?;

    if let Some(p) = &opts.baseline_path {
        let baseline = Baseline::load_json(p)
            .with_context(|| format!("failed to load baseline {}", p.display()))?;
        report.baseline_comparison = Some(report::compare_to_baseline(&baseline, &report));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cost::Usd,
        inventory::BucketInventory,
        pricing::StorageClass,
        types::{ActionKind, ObjectSummary},
    };
    use chrono::TimeZone;

    #[test]
    fn empty_bucket_becomes_an_ordinary_row() {
        let inventory = Inventory {
            project_id: None,
            buckets: vec![BucketInventory {
                name: "empty-bucket".to_string(),
                storage_class: StorageClass::Standard,
                location: None,
                versioning_enabled: true,
                objects: vec![],
            }],
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let report = analyze(&inventory, &EngineConfig::default(), now).unwrap();

        let row = &report.buckets[0];
        assert!(row.recommendation.empty_profile);
        assert_eq!(row.cost.current_monthly_cost, Usd::ZERO);
        assert_eq!(row.cost.optimized_monthly_cost, Usd::ZERO);
        assert_eq!(row.cost.savings_percent, 0.0);
    }

    #[test]
    fn lifecycle_only_projects_to_deepest_tier() {
        let gb = 1u64 << 30;
        let obj = |size_bytes, age_days| ObjectSummary {
            size_bytes,
            age_days,
            storage_class: None,
            is_live: true,
        };
        let inventory = Inventory {
            project_id: None,
            buckets: vec![BucketInventory {
                name: "mixed-bucket".to_string(),
                storage_class: StorageClass::Standard,
                location: None,
                versioning_enabled: false,
                objects: vec![obj(40 * gb, 1), obj(30 * gb, 40), obj(30 * gb, 400)],
            }],
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let report = analyze(&inventory, &EngineConfig::default(), now).unwrap();

        let row = &report.buckets[0];
        assert!(row.recommendation.action(ActionKind::ChangeClass).is_none());
        assert_eq!(row.cost.optimized_class, StorageClass::Archive);
        assert_eq!(row.cost.current_monthly_cost, Usd::from_cents(200));
        assert_eq!(row.cost.optimized_monthly_cost, Usd::from_cents(12));
    }
}
