mod document;

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use walkdir::WalkDir;

use crate::{pricing::StorageClass, types::ObjectSummary};

pub use document::{
    is_valid_bucket_name, parse_inventory_json, validate_document, BucketRecord,
    InventoryDocument, ObjectRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Strict,
    BestEffort,
}

/// A bucket after boundary validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketInventory {
    pub name: String,
    pub storage_class: StorageClass,
    pub location: Option<String>,
    pub versioning_enabled: bool,
    pub objects: Vec<ObjectSummary>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Inventory {
    pub project_id: Option<String>,
    pub buckets: Vec<BucketInventory>,
}

/// Loads one inventory file, or every `*.json` under a directory in file-name
/// order. Files past `max_total_bytes_scanned` are not read.
pub fn load_inventory(
    input: &Path,
    mode: ParseMode,
    now: DateTime<Utc>,
    max_total_bytes_scanned: u64,
) -> anyhow::Result<Inventory> {
    let meta = std::fs::metadata(input).with_context(|| format!("stat {}", input.display()))?;
    if meta.is_file() {
        let bytes = std::fs::read(input).with_context(|| format!("read {}", input.display()))?;
        return parse_inventory_json(&bytes, mode, now)
            .with_context(|| format!("parse inventory {}", input.display()));
    }

    let mut merged = Inventory::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut scanned: u64 = 0;

    for entry in WalkDir::new(input).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "json" {
            continue;
        }

        let len = entry.metadata()?.len();
        if scanned.saturating_add(len) > max_total_bytes_scanned {
            warn!(
                "inventory scan budget of {max_total_bytes_scanned} bytes reached at {}",
                path.display()
            );
            break;
        }
        scanned += len;

        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let inv = parse_inventory_json(&bytes, mode, now)
            .with_context(|| format!("parse inventory {}", path.display()))?;
        debug!("{}: {} buckets", path.display(), inv.buckets.len());

        merge(&mut merged, inv, mode, &mut seen)
            .with_context(|| format!("merge inventory {}", path.display()))?;
    }

    Ok(merged)
}

fn merge(
    into: &mut Inventory,
    other: Inventory,
    mode: ParseMode,
    seen: &mut HashSet<String>,
) -> anyhow::Result<()> {
    if let Some(p) = other.project_id {
        match into.project_id.as_deref() {
            None => into.project_id = Some(p),
            Some(a) if a != p => {
                if mode == ParseMode::Strict {
                    anyhow::bail!("project `{p}` does not match earlier project `{a}`");
                }
                warn!("ignoring project `{p}`; inventory already belongs to `{a}`");
            }
            Some(_) => {}
        }
    }

    for bucket in other.buckets {
        if !seen.insert(bucket.name.clone()) {
            if mode == ParseMode::Strict {
                anyhow::bail!("bucket `{}` listed more than once", bucket.name);
            }
            warn!("skipping repeated bucket {}", bucket.name);
            continue;
        }
        into.buckets.push(bucket);
    }
    Ok(())
}
