use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cost::Usd;

/// The parts of an earlier exported report needed for comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub project_id: Option<String>,
    pub current_monthly_cost: Usd,
    pub optimized_monthly_cost: Usd,
    pub buckets: Vec<String>,
}

impl Baseline {
    pub fn from_report_json(bytes: &[u8]) -> anyhow::Result<Self> {
        let v: serde_json::Value = serde_json::from_slice(bytes).context("parse json")?;
        let totals = v.get("totals");
        let cents = |key: &str| {
            totals
                .and_then(|t| t.get(key))
                .and_then(|n| n.as_i64())
                .map(Usd::from_cents)
                .unwrap_or_default()
        };
        let buckets: Vec<String> = v
            .get("buckets")
            .and_then(|b| b.as_array())
            .map(|rows| {
                rows.iter()
                    .filter_map(|r| r.get("profile")?.get("name")?.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            project_id: v
                .get("project_id")
                .and_then(|p| p.as_str())
                .map(str::to_string),
            current_monthly_cost: cents("current_monthly_cost"),
            optimized_monthly_cost: cents("optimized_monthly_cost"),
            buckets,
        })
    }

    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_report_json(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_from_report_json_defaults_to_zero() {
        let bytes = br#"{"totals":{}}"#;
        let baseline = Baseline::from_report_json(bytes).unwrap();
        assert_eq!(baseline.current_monthly_cost, Usd::ZERO);
        assert!(baseline.buckets.is_empty());
        assert_eq!(baseline.project_id, None);
    }

    #[test]
    fn baseline_reads_totals_and_bucket_names() {
        let bytes = br#"{"project_id":"demo","totals":{"current_monthly_cost":313,"optimized_monthly_cost":156},
            "buckets":[{"profile":{"name":"a-bucket"}},{"profile":{"name":"b-bucket"}}]}"#;
        let baseline = Baseline::from_report_json(bytes).unwrap();
        assert_eq!(baseline.project_id.as_deref(), Some("demo"));
        assert_eq!(baseline.current_monthly_cost, Usd::from_cents(313));
        assert_eq!(baseline.optimized_monthly_cost, Usd::from_cents(156));
        assert_eq!(baseline.buckets, vec!["a-bucket", "b-bucket"]);
    }

    #[test]
    fn baseline_rejects_non_json() {
        assert!(Baseline::from_report_json(b"not json").is_err());
    }
}
