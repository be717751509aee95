use std::collections::HashSet;

use anyhow::Context;
use chrono::{DateTime, Utc};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::{classify::age_days, error::Error, pricing::StorageClass, types::ObjectSummary};

use super::{BucketInventory, Inventory, ParseMode};

/// One inventory file as written by the listing collaborator. Buckets stay raw
/// until validation so one malformed bucket cannot sink the whole file.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryDocument {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub buckets: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketRecord {
    pub name: String,
    pub storage_class: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub versioning_enabled: bool,
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRecord {
    pub name: String,
    pub size: u64,
    /// RFC 3339 with an explicit offset; normalized to UTC.
    pub time_created: String,
    #[serde(default)]
    pub storage_class: Option<String>,
    #[serde(default = "default_live")]
    pub is_live: bool,
}

fn default_live() -> bool {
    true
}

static RE_BUCKET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9._-]{1,61}[a-z0-9]$").expect("valid regex"));

pub fn is_valid_bucket_name(name: &str) -> bool {
    RE_BUCKET_NAME.is_match(name) && !name.contains("..")
}

impl ObjectSummary {
    pub fn from_record(
        record: &ObjectRecord,
        now: DateTime<Utc>,
        mode: ParseMode,
    ) -> anyhow::Result<Self> {
        let storage_class = match record.storage_class.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<StorageClass>() {
                Ok(c) => Some(c),
                Err(e) if mode == ParseMode::Strict => {
                    return Err(e).with_context(|| format!("object {}", record.name));
                }
                Err(e) => {
                    warn!("object {}: {e}; ignoring its class", record.name);
                    None
                }
            },
        };
        let created = DateTime::parse_from_rfc3339(&record.time_created)
            .map_err(|e| {
                Error::InvalidInventory(format!(
                    "object {}: time_created `{}` is not RFC 3339 with an offset ({e})",
                    record.name, record.time_created
                ))
            })?
            .with_timezone(&Utc);
        Ok(Self {
            size_bytes: record.size,
            age_days: age_days(created, now),
            storage_class,
            is_live: record.is_live,
        })
    }
}

pub fn parse_inventory_json(
    bytes: &[u8],
    mode: ParseMode,
    now: DateTime<Utc>,
) -> anyhow::Result<Inventory> {
    let doc: InventoryDocument = serde_json::from_slice(bytes).context("parse inventory json")?;
    validate_document(doc, mode, now)
}

pub fn validate_document(
    doc: InventoryDocument,
    mode: ParseMode,
    now: DateTime<Utc>,
) -> anyhow::Result<Inventory> {
    let mut buckets: Vec<BucketInventory> = Vec::with_capacity(doc.buckets.len());
    let mut seen: HashSet<String> = HashSet::new();

    for raw in doc.buckets {
        let label = raw
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string();
        let validated = serde_json::from_value::<BucketRecord>(raw)
            .map_err(|e| {
                anyhow::Error::new(Error::InvalidInventory(format!("bucket {label}: {e}")))
            })
            .and_then(|record| validate_bucket(&record, mode, now, &seen));
        match validated {
            Ok(bucket) => {
                seen.insert(bucket.name.clone());
                buckets.push(bucket);
            }
            Err(e) if mode == ParseMode::BestEffort => {
                warn!("skipping bucket {label}: {e:#}");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Inventory {
        project_id: doc.project_id,
        buckets,
    })
}

fn validate_bucket(
    record: &BucketRecord,
    mode: ParseMode,
    now: DateTime<Utc>,
    seen: &HashSet<String>,
) -> anyhow::Result<BucketInventory> {
    if !is_valid_bucket_name(&record.name) {
        return Err(Error::InvalidInventory(format!(
            "`{}` is not a valid bucket name",
            record.name
        ))
        .into());
    }
    if seen.contains(&record.name) {
        return Err(Error::InvalidInventory(format!(
            "bucket `{}` listed more than once",
            record.name
        ))
        .into());
    }

    let storage_class: StorageClass = record
        .storage_class
        .parse()
        .with_context(|| format!("bucket {}", record.name))?;

    let objects = record
        .objects
        .iter()
        .map(|o| ObjectSummary::from_record(o, now, mode))
        .collect::<anyhow::Result<Vec<_>>>()
        .with_context(|| format!("bucket {}", record.name))?;

    Ok(BucketInventory {
        name: record.name.clone(),
        storage_class,
        location: record.location.clone(),
        versioning_enabled: record.versioning_enabled,
        objects,
    })
}
