use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    lifecycle::{DocumentRule, LifecycleDocument},
    pricing::StorageClass,
    report::Report,
    types::{Action, ActionKind},
};

/// Approved changes for one bucket. Nothing here touches the bucket itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketChanges {
    pub bucket: String,
    pub default_storage_class: Option<StorageClass>,
    pub lifecycle: Option<LifecycleDocument>,
}

impl BucketChanges {
    pub fn lifecycle_file_name(&self) -> String {
        format!("lifecycle-{}.json", self.bucket)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyPlan {
    pub project_id: Option<String>,
    pub changes: Vec<BucketChanges>,
}

/// Collects the actions `approve` accepts, in report order. Lifecycle
/// transitions and old-version expiry for a bucket share one document.
pub fn plan_apply<F>(report: &Report, mut approve: F) -> ApplyPlan
where
    F: FnMut(&str, &Action) -> bool,
{
    let mut changes = Vec::new();

    for b in &report.buckets {
        let bucket = b.profile.name.as_str();
        let mut c = BucketChanges {
            bucket: bucket.to_string(),
            default_storage_class: None,
            lifecycle: None,
        };

        for action in &b.recommendation.actions {
            if !approve(bucket, action) {
                debug!("{bucket}: skipped {:?}", action.kind);
                continue;
            }
            match action.kind {
                ActionKind::ChangeClass => c.default_storage_class = action.target_class,
                ActionKind::AddLifecyclePolicy => {
                    if let Some(policy) = &action.lifecycle_policy {
                        c.lifecycle
                            .get_or_insert_with(LifecycleDocument::default)
                            .rule
                            .extend(policy.to_document().rule);
                    }
                }
                ActionKind::DisableOldVersions => {
                    let days = action.noncurrent_retention_days.unwrap_or(30);
                    c.lifecycle
                        .get_or_insert_with(LifecycleDocument::default)
                        .rule
                        .push(DocumentRule::delete_noncurrent(days));
                }
            }
        }

        if c.default_storage_class.is_some() || c.lifecycle.is_some() {
            changes.push(c);
        }
    }

    ApplyPlan {
        project_id: report.project_id.clone(),
        changes,
    }
}

impl ApplyPlan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// `gcloud` commands equivalent to the plan. Lifecycle files are expected
    /// next to the script.
    pub fn to_shell_script(&self, credentials: Option<&Path>) -> String {
        let mut s = String::from("#!/bin/sh\nset -eu\ncd \"$(dirname \"$0\")\"\n\n");
        if let Some(path) = credentials {
            s.push_str(&format!(
                "gcloud auth activate-service-account --key-file={}\n\n",
                shell_quote(&path.display().to_string())
            ));
        }
        let project = self
            .project_id
            .as_deref()
            .map(|p| format!(" --project={}", shell_quote(p)))
            .unwrap_or_default();

        for c in &self.changes {
            if let Some(class) = c.default_storage_class {
                s.push_str(&format!(
                    "gcloud storage buckets update gs://{}{project} --default-storage-class={class}\n",
                    c.bucket
                ));
            }
            if c.lifecycle.is_some() {
                s.push_str(&format!(
                    "gcloud storage buckets update gs://{}{project} --lifecycle-file={}\n",
                    c.bucket,
                    c.lifecycle_file_name()
                ));
            }
        }
        s
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
