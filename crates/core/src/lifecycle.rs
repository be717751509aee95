use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    pricing::{PricingTable, StorageClass},
    types::AgeCohort,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRule {
    pub age_days: u32,
    pub target_class: StorageClass,
}

/// Age-ordered transitions, each one to a strictly colder class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LifecycleRule>", into = "Vec<LifecycleRule>")]
pub struct LifecyclePolicy {
    rules: Vec<LifecycleRule>,
}

impl LifecyclePolicy {
    pub fn new(rules: Vec<LifecycleRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::InvalidLifecyclePolicy(
                "policy has no rules".to_string(),
            ));
        }
        for pair in rules.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.age_days <= prev.age_days {
                return Err(Error::InvalidLifecyclePolicy(format!(
                    "threshold {}d does not follow {}d",
                    next.age_days, prev.age_days
                )));
            }
            if next.target_class <= prev.target_class {
                return Err(Error::InvalidLifecyclePolicy(format!(
                    "transition to {} after {} is not a downgrade",
                    next.target_class, prev.target_class
                )));
            }
        }
        Ok(Self { rules })
    }

    /// The 30/90/365-day schedule, keeping only transitions that store for
    /// less than `current` and less than the rule before them. `None` when
    /// nothing is left.
    pub fn standard_for(current: StorageClass, pricing: &PricingTable) -> Result<Option<Self>> {
        let mut rules: Vec<LifecycleRule> = Vec::new();
        let mut floor = current;
        for (age_days, cohort) in AgeCohort::BOUNDARIES
            .into_iter()
            .zip(AgeCohort::ALL.into_iter().skip(1))
        {
            let target = cohort.target_class();
            if pricing.is_cheaper(target, floor) {
                rules.push(LifecycleRule {
                    age_days,
                    target_class: target,
                });
                floor = target;
            }
        }
        if rules.is_empty() {
            return Ok(None);
        }
        Self::new(rules).map(Some)
    }

    pub fn rules(&self) -> &[LifecycleRule] {
        &self.rules
    }

    pub fn deepest(&self) -> StorageClass {
        // non-empty by construction
        self.rules
            .last()
            .map(|r| r.target_class)
            .unwrap_or(StorageClass::Standard)
    }

    /// Class an object of this age has been moved to, if any rule fired.
    pub fn class_at_age(&self, age_days: u32) -> Option<StorageClass> {
        self.rules
            .iter()
            .take_while(|r| r.age_days <= age_days)
            .last()
            .map(|r| r.target_class)
    }

    pub fn to_document(&self) -> LifecycleDocument {
        LifecycleDocument {
            rule: self
                .rules
                .iter()
                .map(|r| DocumentRule {
                    action: DocumentAction {
                        kind: "SetStorageClass".to_string(),
                        storage_class: Some(r.target_class),
                    },
                    condition: DocumentCondition {
                        age: Some(r.age_days),
                        ..DocumentCondition::default()
                    },
                })
                .collect(),
        }
    }
}

impl TryFrom<Vec<LifecycleRule>> for LifecyclePolicy {
    type Error = Error;

    fn try_from(rules: Vec<LifecycleRule>) -> Result<Self> {
        Self::new(rules)
    }
}

impl From<LifecyclePolicy> for Vec<LifecycleRule> {
    fn from(p: LifecyclePolicy) -> Self {
        p.rules
    }
}

/// Bucket lifecycle configuration in the provider's JSON shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleDocument {
    pub rule: Vec<DocumentRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRule {
    pub action: DocumentAction,
    pub condition: DocumentCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(
        rename = "storageClass",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub storage_class: Option<StorageClass>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_since_noncurrent_time: Option<u32>,
}

impl DocumentRule {
    pub fn delete_noncurrent(after_days: u32) -> Self {
        Self {
            action: DocumentAction {
                kind: "Delete".to_string(),
                storage_class: None,
            },
            condition: DocumentCondition {
                is_live: Some(false),
                days_since_noncurrent_time: Some(after_days),
                ..DocumentCondition::default()
            },
        }
    }
}
