use serde::{Deserialize, Serialize};

use crate::{cost::Usd, lifecycle::LifecyclePolicy, pricing::StorageClass};

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Age band used as a stand-in for access recency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgeCohort {
    Recent,
    Medium,
    Rare,
    Cold,
}

impl AgeCohort {
    pub const ALL: [AgeCohort; 4] = [
        AgeCohort::Recent,
        AgeCohort::Medium,
        AgeCohort::Rare,
        AgeCohort::Cold,
    ];

    /// Lower age bound in days of every band after the first.
    pub const BOUNDARIES: [u32; 3] = [30, 90, 365];

    pub fn for_age(age_days: u32) -> Self {
        match age_days {
            0..=29 => AgeCohort::Recent,
            30..=89 => AgeCohort::Medium,
            90..=364 => AgeCohort::Rare,
            _ => AgeCohort::Cold,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeCohort::Recent => "<30d",
            AgeCohort::Medium => "30-89d",
            AgeCohort::Rare => "90-364d",
            AgeCohort::Cold => ">=365d",
        }
    }

    pub fn min_age_days(&self) -> u32 {
        match self {
            AgeCohort::Recent => 0,
            AgeCohort::Medium => 30,
            AgeCohort::Rare => 90,
            AgeCohort::Cold => 365,
        }
    }

    pub fn target_class(&self) -> StorageClass {
        match self {
            AgeCohort::Recent => StorageClass::Standard,
            AgeCohort::Medium => StorageClass::Nearline,
            AgeCohort::Rare => StorageClass::Coldline,
            AgeCohort::Cold => StorageClass::Archive,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CohortStats {
    pub objects: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgeDistribution {
    pub recent: CohortStats,
    pub medium: CohortStats,
    pub rare: CohortStats,
    pub cold: CohortStats,
}

impl AgeDistribution {
    pub fn get(&self, cohort: AgeCohort) -> CohortStats {
        match cohort {
            AgeCohort::Recent => self.recent,
            AgeCohort::Medium => self.medium,
            AgeCohort::Rare => self.rare,
            AgeCohort::Cold => self.cold,
        }
    }

    pub(crate) fn get_mut(&mut self, cohort: AgeCohort) -> &mut CohortStats {
        match cohort {
            AgeCohort::Recent => &mut self.recent,
            AgeCohort::Medium => &mut self.medium,
            AgeCohort::Rare => &mut self.rare,
            AgeCohort::Cold => &mut self.cold,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgeCohort, CohortStats)> + '_ {
        AgeCohort::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// One object as seen at analysis time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub size_bytes: u64,
    pub age_days: u32,
    pub storage_class: Option<StorageClass>,
    /// False for noncurrent versions in a versioned bucket.
    pub is_live: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketProfile {
    pub name: String,
    pub storage_class: StorageClass,
    pub location: Option<String>,
    pub total_bytes: u64,
    pub object_count: u64,
    pub age_distribution: AgeDistribution,
    pub versioning_enabled: bool,
    pub noncurrent_bytes: u64,
}

impl BucketProfile {
    pub fn size_gb(&self) -> f64 {
        bytes_to_gb(self.total_bytes)
    }

    /// No objects at all. A bucket of zero-byte objects is not empty.
    pub fn is_empty(&self) -> bool {
        self.object_count == 0
    }
}

pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    ChangeClass,
    AddLifecyclePolicy,
    DisableOldVersions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub description: String,
    pub details: String,
    pub estimated_monthly_saving: Usd,
    pub target_class: Option<StorageClass>,
    pub lifecycle_policy: Option<LifecyclePolicy>,
    pub noncurrent_retention_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub bucket: String,
    pub actions: Vec<Action>,
    /// Set when the bucket held no bytes; the action list is then empty.
    pub empty_profile: bool,
}

impl Recommendation {
    pub fn action(&self, kind: ActionKind) -> Option<&Action> {
        self.actions.iter().find(|a| a.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
