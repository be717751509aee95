use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::{
    pricing::{PricingTable, StorageClass},
    types::{bytes_to_gb, ActionKind, BucketProfile, Recommendation},
};

/// Whole cents. Sums are exact, so totals do not depend on bucket order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Usd(i64);

impl Usd {
    pub const ZERO: Usd = Usd(0);

    pub fn from_cents(cents: i64) -> Self {
        Usd(cents)
    }

    /// Rounds half away from zero to the nearest cent.
    pub fn from_dollars(dollars: f64) -> Self {
        if !dollars.is_finite() {
            return Usd::ZERO;
        }
        Usd((dollars * 100.0).round() as i64)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn dollars(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Usd {
    type Output = Usd;

    fn add(self, rhs: Usd) -> Usd {
        Usd(self.0 + rhs.0)
    }
}

impl Sub for Usd {
    type Output = Usd;

    fn sub(self, rhs: Usd) -> Usd {
        Usd(self.0 - rhs.0)
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Usd>>(iter: I) -> Usd {
        iter.fold(Usd::ZERO, Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub bucket: String,
    pub current_class: StorageClass,
    pub optimized_class: StorageClass,
    pub current_monthly_cost: Usd,
    pub optimized_monthly_cost: Usd,
    pub savings: Usd,
    pub savings_percent: f64,
    /// Unrounded costs in millionths of a dollar. Percentages are taken from
    /// these so cent rounding does not skew them.
    #[serde(default)]
    pub current_micros: i64,
    #[serde(default)]
    pub optimized_micros: i64,
}

pub fn estimate(
    profile: &BucketProfile,
    recommendation: &Recommendation,
    pricing: &PricingTable,
) -> CostEstimate {
    let current_class = profile.storage_class;
    let optimized_class = optimized_class(current_class, recommendation);

    let mut billable_bytes = profile.total_bytes;
    if recommendation
        .action(ActionKind::DisableOldVersions)
        .is_some()
    {
        billable_bytes = billable_bytes.saturating_sub(profile.noncurrent_bytes);
    }

    let current = profile.size_gb() * pricing.unit_price(current_class);
    let optimized = bytes_to_gb(billable_bytes) * pricing.unit_price(optimized_class);

    let current_monthly_cost = Usd::from_dollars(current);
    let optimized_monthly_cost = Usd::from_dollars(optimized);
    let current_micros = to_micros(current);
    let optimized_micros = to_micros(optimized);

    CostEstimate {
        bucket: profile.name.clone(),
        current_class,
        optimized_class,
        current_monthly_cost,
        optimized_monthly_cost,
        savings: current_monthly_cost - optimized_monthly_cost,
        savings_percent: savings_percent(current_monthly_cost, current_micros, optimized_micros),
        current_micros,
        optimized_micros,
    }
}

fn to_micros(dollars: f64) -> i64 {
    if !dollars.is_finite() {
        return 0;
    }
    (dollars * 1_000_000.0).round() as i64
}

/// Shared by rows and totals. A cost that displays as zero has no savings
/// percentage.
fn savings_percent(current_monthly_cost: Usd, current_micros: i64, optimized_micros: i64) -> f64 {
    if current_monthly_cost <= Usd::ZERO {
        return 0.0;
    }
    percent(
        (current_micros - optimized_micros) as f64,
        current_micros as f64,
    )
}

/// A class change wins; otherwise a lifecycle policy is projected to its
/// deepest tier.
fn optimized_class(current: StorageClass, recommendation: &Recommendation) -> StorageClass {
    if let Some(target) = recommendation
        .action(ActionKind::ChangeClass)
        .and_then(|a| a.target_class)
    {
        return target;
    }
    recommendation
        .action(ActionKind::AddLifecyclePolicy)
        .and_then(|a| a.lifecycle_policy.as_ref())
        .map(|p| p.deepest())
        .unwrap_or(current)
}

/// One decimal place; zero whenever the base is not positive.
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 || !whole.is_finite() {
        return 0.0;
    }
    ((part / whole) * 1000.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub bucket_count: usize,
    pub current_monthly_cost: Usd,
    pub optimized_monthly_cost: Usd,
    pub savings: Usd,
    pub savings_percent: f64,
}

impl Totals {
    pub fn from_estimates<'a>(estimates: impl IntoIterator<Item = &'a CostEstimate>) -> Self {
        let mut bucket_count = 0;
        let mut current = Usd::ZERO;
        let mut optimized = Usd::ZERO;
        let (mut current_micros, mut optimized_micros) = (0i64, 0i64);
        for e in estimates {
            bucket_count += 1;
            current = current + e.current_monthly_cost;
            optimized = optimized + e.optimized_monthly_cost;
            current_micros = current_micros.saturating_add(e.current_micros);
            optimized_micros = optimized_micros.saturating_add(e.optimized_micros);
        }
        Self {
            bucket_count,
            current_monthly_cost: current,
            optimized_monthly_cost: optimized,
            savings: current - optimized,
            savings_percent: savings_percent(current, current_micros, optimized_micros),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_rounds_and_formats() {
        assert_eq!(Usd::from_dollars(3.1284).cents(), 313);
        assert_eq!(Usd::from_dollars(1.5642).cents(), 156);
        assert_eq!(Usd::from_dollars(0.005).to_string(), "$0.01");
        assert_eq!(Usd::from_cents(-157).to_string(), "-$1.57");
        assert_eq!(Usd::from_cents(100_005).to_string(), "$1000.05");
        assert_eq!(Usd::from_dollars(f64::NAN), Usd::ZERO);
    }

    #[test]
    fn percent_never_divides_by_zero() {
        assert_eq!(percent(5.0, 0.0), 0.0);
        assert_eq!(percent(1.5642, 3.1284), 50.0);
        assert_eq!(percent(1.0, 3.0), 33.3);
    }

    fn profile(class: StorageClass, medium_bytes: u64) -> BucketProfile {
        let mut age_distribution = crate::types::AgeDistribution::default();
        age_distribution.medium.objects = 1;
        age_distribution.medium.bytes = medium_bytes;
        BucketProfile {
            name: "bucket".to_string(),
            storage_class: class,
            location: None,
            total_bytes: medium_bytes,
            object_count: 1,
            age_distribution,
            versioning_enabled: false,
            noncurrent_bytes: 0,
        }
    }

    fn change_to(class: StorageClass) -> Recommendation {
        Recommendation {
            bucket: "bucket".to_string(),
            actions: vec![crate::types::Action {
                kind: ActionKind::ChangeClass,
                description: String::new(),
                details: String::new(),
                estimated_monthly_saving: Usd::ZERO,
                target_class: Some(class),
                lifecycle_policy: None,
                noncurrent_retention_days: None,
            }],
            empty_profile: false,
        }
    }

    #[test]
    fn single_bucket_totals_match_its_row() {
        // 156.42 GB
        let p = profile(StorageClass::Standard, 167_954_696_110);
        let e = estimate(&p, &change_to(StorageClass::Nearline), &PricingTable::default());
        let totals = Totals::from_estimates([&e]);
        assert_eq!(e.savings, Usd::from_cents(157));
        assert_eq!(e.savings_percent, 50.0);
        assert_eq!(totals.savings, e.savings);
        assert_eq!(totals.savings_percent, e.savings_percent);
    }

    #[test]
    fn cost_that_rounds_to_zero_has_no_percentage() {
        let p = profile(StorageClass::Standard, 200 << 20);
        let e = estimate(&p, &change_to(StorageClass::Nearline), &PricingTable::default());
        assert_eq!(e.current_monthly_cost, Usd::ZERO);
        assert_eq!(e.savings, Usd::ZERO);
        assert_eq!(e.savings_percent, 0.0);
        assert_eq!(Totals::from_estimates([&e]).savings_percent, 0.0);
    }

    #[test]
    fn usd_serializes_as_integer_cents() {
        assert_eq!(serde_json::to_string(&Usd::from_cents(313)).unwrap(), "313");
        let back: Usd = serde_json::from_str("156").unwrap();
        assert_eq!(back, Usd::from_cents(156));
    }
}
