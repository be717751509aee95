use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Storage tiers in cost order: each step down is slower to retrieve and
/// cheaper to store.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageClass {
    Standard,
    Nearline,
    Coldline,
    Archive,
}

impl StorageClass {
    pub const ALL: [StorageClass; 4] = [
        StorageClass::Standard,
        StorageClass::Nearline,
        StorageClass::Coldline,
        StorageClass::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::Nearline => "NEARLINE",
            StorageClass::Coldline => "COLDLINE",
            StorageClass::Archive => "ARCHIVE",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        StorageClass::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownStorageClass(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassPricing {
    /// Currency per GB-month at rest.
    pub storage_per_gb_month: f64,
    /// Currency per GB read back.
    pub retrieval_per_gb: f64,
    /// Objects deleted or rewritten earlier are billed for the remainder.
    pub min_storage_days: u32,
}

/// Per-class unit prices, indexed by [`StorageClass`].
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    classes: [ClassPricing; 4],
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            classes: [
                ClassPricing {
                    storage_per_gb_month: 0.020,
                    retrieval_per_gb: 0.0,
                    min_storage_days: 0,
                },
                ClassPricing {
                    storage_per_gb_month: 0.010,
                    retrieval_per_gb: 0.01,
                    min_storage_days: 30,
                },
                ClassPricing {
                    storage_per_gb_month: 0.004,
                    retrieval_per_gb: 0.02,
                    min_storage_days: 90,
                },
                ClassPricing {
                    storage_per_gb_month: 0.0012,
                    retrieval_per_gb: 0.05,
                    min_storage_days: 365,
                },
            ],
        }
    }
}

impl PricingTable {
    /// Builds a table from entries listed in [`StorageClass::ALL`] order.
    pub fn new(classes: [ClassPricing; 4]) -> Result<Self> {
        for (class, p) in StorageClass::ALL.iter().zip(classes.iter()) {
            if !p.storage_per_gb_month.is_finite() || p.storage_per_gb_month < 0.0 {
                return Err(Error::InvalidPricing(format!(
                    "{class} storage price {} must be a non-negative number",
                    p.storage_per_gb_month
                )));
            }
            if !p.retrieval_per_gb.is_finite() || p.retrieval_per_gb < 0.0 {
                return Err(Error::InvalidPricing(format!(
                    "{class} retrieval price {} must be a non-negative number",
                    p.retrieval_per_gb
                )));
            }
        }

        for pair in StorageClass::ALL.windows(2) {
            let (warmer, colder) = (pair[0], pair[1]);
            let (a, b) = (classes[warmer.index()], classes[colder.index()]);
            if b.storage_per_gb_month > a.storage_per_gb_month {
                return Err(Error::InvalidPricing(format!(
                    "{colder} ({}) is priced above {warmer} ({})",
                    b.storage_per_gb_month, a.storage_per_gb_month
                )));
            }
        }

        Ok(Self { classes })
    }

    pub fn classes(&self) -> &'static [StorageClass] {
        &StorageClass::ALL
    }

    /// Entries in [`StorageClass::ALL`] order, suitable for [`PricingTable::new`].
    pub fn entries(&self) -> [ClassPricing; 4] {
        self.classes
    }

    pub fn pricing(&self, class: StorageClass) -> ClassPricing {
        self.classes[class.index()]
    }

    pub fn unit_price(&self, class: StorageClass) -> f64 {
        self.pricing(class).storage_per_gb_month
    }

    pub fn unit_price_by_name(&self, class: &str) -> Result<f64> {
        Ok(self.unit_price(class.parse()?))
    }

    /// True when `candidate` sits deeper in the ordering than `current` and
    /// also stores for strictly less.
    pub fn is_cheaper(&self, candidate: StorageClass, current: StorageClass) -> bool {
        candidate > current && self.unit_price(candidate) < self.unit_price(current)
    }

    pub fn one_tier_down(&self, class: StorageClass) -> Option<StorageClass> {
        StorageClass::ALL.get(class.index() + 1).copied()
    }

    pub fn with_override(
        &self,
        class: StorageClass,
        f: impl FnOnce(&mut ClassPricing),
    ) -> Result<Self> {
        let mut classes = self.classes;
        f(&mut classes[class.index()]);
        Self::new(classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_are_ordered_and_prices_non_increasing() {
        let t = PricingTable::default();
        let prices: Vec<f64> = t.classes().iter().map(|c| t.unit_price(*c)).collect();
        assert!(prices.windows(2).all(|w| w[0] >= w[1]));
        assert!(StorageClass::Standard < StorageClass::Archive);
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!(
            "nearline".parse::<StorageClass>().unwrap(),
            StorageClass::Nearline
        );
        assert_eq!(
            "REGIONAL".parse::<StorageClass>().unwrap_err(),
            Error::UnknownStorageClass("REGIONAL".to_string())
        );
        assert!(PricingTable::default().unit_price_by_name("GLACIER").is_err());
    }

    #[test]
    fn one_tier_down_stops_at_archive() {
        let t = PricingTable::default();
        assert_eq!(
            t.one_tier_down(StorageClass::Standard),
            Some(StorageClass::Nearline)
        );
        assert_eq!(t.one_tier_down(StorageClass::Archive), None);
    }

    #[test]
    fn rejects_inverted_prices() {
        let err = PricingTable::default()
            .with_override(StorageClass::Archive, |p| p.storage_per_gb_month = 0.5)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPricing(_)));
    }

    #[test]
    fn equal_prices_are_not_cheaper() {
        let t = PricingTable::default()
            .with_override(StorageClass::Nearline, |p| p.storage_per_gb_month = 0.020)
            .unwrap();
        assert!(!t.is_cheaper(StorageClass::Nearline, StorageClass::Standard));
        assert!(t.is_cheaper(StorageClass::Coldline, StorageClass::Standard));
        assert!(!t.is_cheaper(StorageClass::Standard, StorageClass::Coldline));
    }
}
