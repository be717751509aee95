use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    baseline::Baseline,
    cost::{CostEstimate, Totals, Usd},
    pricing::StorageClass,
    types::{bytes_to_gb, Action, BucketProfile, Recommendation},
};

pub const REPORT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_version: String,
    pub project_id: Option<String>,
    pub analyzed_at: DateTime<Utc>,
    pub buckets: Vec<BucketReport>,
    pub totals: Totals,
    pub baseline_comparison: Option<BaselineComparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketReport {
    pub profile: BucketProfile,
    pub recommendation: Recommendation,
    pub cost: CostEstimate,
}

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow<'a> {
    pub bucket: &'a str,
    pub storage_class: StorageClass,
    pub size_bytes: u64,
    pub objects: u64,
    pub current_monthly_cost: Usd,
    pub optimized_monthly_cost: Usd,
    pub savings: Usd,
    pub savings_percent: f64,
}

impl SummaryRow<'_> {
    pub fn size_gb(&self) -> f64 {
        bytes_to_gb(self.size_bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub baseline_current_monthly_cost: Usd,
    pub baseline_optimized_monthly_cost: Usd,
    pub delta_current_monthly_cost: Usd,
    pub delta_optimized_monthly_cost: Usd,
    pub added_buckets: Vec<String>,
    pub removed_buckets: Vec<String>,
}

impl Report {
    /// Totals are derived here so they always match the rows.
    pub fn new(
        project_id: Option<String>,
        analyzed_at: DateTime<Utc>,
        buckets: Vec<BucketReport>,
    ) -> Self {
        let totals = Totals::from_estimates(buckets.iter().map(|b| &b.cost));
        Self {
            report_version: REPORT_VERSION.to_string(),
            project_id,
            analyzed_at,
            buckets,
            totals,
            baseline_comparison: None,
        }
    }

    pub fn rows(&self) -> Vec<SummaryRow<'_>> {
        self.buckets
            .iter()
            .map(|b| SummaryRow {
                bucket: &b.profile.name,
                storage_class: b.profile.storage_class,
                size_bytes: b.profile.total_bytes,
                objects: b.profile.object_count,
                current_monthly_cost: b.cost.current_monthly_cost,
                optimized_monthly_cost: b.cost.optimized_monthly_cost,
                savings: b.cost.savings,
                savings_percent: b.cost.savings_percent,
            })
            .collect()
    }

    pub fn detailed(&self) -> Vec<(&str, &[Action])> {
        self.buckets
            .iter()
            .map(|b| (b.profile.name.as_str(), b.recommendation.actions.as_slice()))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn to_markdown(&self) -> String {
        let mut s = String::new();
        s.push_str("# storage cost optimization report\n\n");
        s.push_str(&format!("- report_version: `{}`\n", self.report_version));
        if let Some(p) = &self.project_id {
            s.push_str(&format!("- project_id: `{p}`\n"));
        }
        s.push_str(&format!(
            "- analyzed_at: `{}`\n",
            self.analyzed_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        s.push('\n');

        s.push_str("## Buckets\n\n");
        s.push_str(
            "| Bucket | Storage Class | Size | Objects | Current Cost | Optimized Cost | Savings | Savings % |\n",
        );
        s.push_str("|---|---|---:|---:|---:|---:|---:|---:|\n");
        for r in self.rows() {
            s.push_str(&format!(
                "| {} | {} | {:.2} GB | {} | {} | {} | {} | {:.1}% |\n",
                r.bucket,
                r.storage_class,
                r.size_gb(),
                r.objects,
                r.current_monthly_cost,
                r.optimized_monthly_cost,
                r.savings,
                r.savings_percent
            ));
        }
        s.push('\n');

        s.push_str("## Totals\n\n");
        s.push_str(&format!("- buckets: `{}`\n", self.totals.bucket_count));
        s.push_str(&format!(
            "- current_monthly_cost: `{}`\n",
            self.totals.current_monthly_cost
        ));
        s.push_str(&format!(
            "- optimized_monthly_cost: `{}`\n",
            self.totals.optimized_monthly_cost
        ));
        s.push_str(&format!(
            "- savings: `{}` (`{:.1}%`)\n",
            self.totals.savings, self.totals.savings_percent
        ));
        s.push('\n');

        if let Some(cmp) = &self.baseline_comparison {
            s.push_str("## Baseline comparison\n\n");
            s.push_str(&format!(
                "- baseline_current_monthly_cost: `{}`\n",
                cmp.baseline_current_monthly_cost
            ));
            s.push_str(&format!(
                "- delta_current_monthly_cost: `{}`\n",
                cmp.delta_current_monthly_cost
            ));
            s.push_str(&format!(
                "- delta_optimized_monthly_cost: `{}`\n",
                cmp.delta_optimized_monthly_cost
            ));
            if !cmp.added_buckets.is_empty() {
                s.push_str(&format!("- added: {}\n", cmp.added_buckets.join(", ")));
            }
            if !cmp.removed_buckets.is_empty() {
                s.push_str(&format!("- removed: {}\n", cmp.removed_buckets.join(", ")));
            }
            s.push('\n');
        }

        s.push_str("## Recommendations\n\n");
        for (bucket, actions) in self.detailed() {
            if actions.is_empty() {
                s.push_str(&format!("### {bucket}\n- (none)\n\n"));
                continue;
            }
            s.push_str(&format!("### {bucket}\n"));
            for (i, a) in actions.iter().enumerate() {
                s.push_str(&format!("{}. {}\n", i + 1, a.description));
                s.push_str(&format!("   - {}\n", a.details));
            }
            s.push('\n');
        }

        s
    }
}

pub fn compare_to_baseline(b: &Baseline, report: &Report) -> BaselineComparison {
    let added_buckets = report
        .buckets
        .iter()
        .map(|r| &r.profile.name)
        .filter(|name| !b.buckets.contains(name))
        .cloned()
        .collect();
    let removed_buckets = b
        .buckets
        .iter()
        .filter(|name| !report.buckets.iter().any(|r| &r.profile.name == *name))
        .cloned()
        .collect();

    BaselineComparison {
        baseline_current_monthly_cost: b.current_monthly_cost,
        baseline_optimized_monthly_cost: b.optimized_monthly_cost,
        delta_current_monthly_cost: report.totals.current_monthly_cost - b.current_monthly_cost,
        delta_optimized_monthly_cost: report.totals.optimized_monthly_cost
            - b.optimized_monthly_cost,
        added_buckets,
        removed_buckets,
    }
}
