use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::{
    error::Result,
    pricing::{PricingTable, StorageClass},
    recommend::EngineConfig,
};

pub const CONFIG_FILE_NAME: &str = "gcs-optimizer.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub project_id: Option<String>,
    pub dominance_threshold: Option<f64>,
    pub old_version_fraction: Option<f64>,
    pub noncurrent_retention_days: Option<u32>,
    pub strict: Option<bool>,
    /// Keyed by storage class name, e.g. `[pricing.NEARLINE]`.
    pub pricing: BTreeMap<String, PricingOverride>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PricingOverride {
    pub storage_per_gb_month: Option<f64>,
    pub retrieval_per_gb: Option<f64>,
    pub min_storage_days: Option<u32>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }

    /// `None` when the working directory has no config file.
    pub fn discover() -> Option<anyhow::Result<Self>> {
        let path = Path::new(CONFIG_FILE_NAME);
        if path.exists() {
            Some(Config::load(path))
        } else {
            None
        }
    }

    /// Defaults with this file's overrides applied, validated as a whole.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let defaults = EngineConfig::default();

        let mut entries = defaults.pricing.entries();
        for (name, o) in &self.pricing {
            let class: StorageClass = name.parse()?;
            let e = &mut entries[class as usize];
            if let Some(v) = o.storage_per_gb_month {
                e.storage_per_gb_month = v;
            }
            if let Some(v) = o.retrieval_per_gb {
                e.retrieval_per_gb = v;
            }
            if let Some(v) = o.min_storage_days {
                e.min_storage_days = v;
            }
        }

        EngineConfig {
            pricing: PricingTable::new(entries)?,
            dominance_threshold: self
                .dominance_threshold
                .unwrap_or(defaults.dominance_threshold),
            old_version_fraction: self
                .old_version_fraction
                .unwrap_or(defaults.old_version_fraction),
            noncurrent_retention_days: self
                .noncurrent_retention_days
                .unwrap_or(defaults.noncurrent_retention_days),
        }
        .validate()
    }
}
