use log::debug;

use crate::{
    cost::Usd,
    error::{Error, Result},
    lifecycle::LifecyclePolicy,
    pricing::{PricingTable, StorageClass},
    types::{
        bytes_to_gb, Action, ActionKind, AgeCohort, AgeDistribution, BucketProfile,
        Recommendation,
    },
};

/// Decision parameters shared by the recommendation engine and the cost
/// calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub pricing: PricingTable,
    /// Byte share a single cohort needs before the bucket counts as uniform.
    pub dominance_threshold: f64,
    /// Share of bytes held by old versions above which cleanup is suggested.
    pub old_version_fraction: f64,
    pub noncurrent_retention_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pricing: PricingTable::default(),
            dominance_threshold: 0.6,
            old_version_fraction: 0.2,
            noncurrent_retention_days: 30,
        }
    }
}

impl EngineConfig {
    pub fn validate(self) -> Result<Self> {
        if !(self.dominance_threshold > 0.0 && self.dominance_threshold <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "dominance_threshold {} must be in (0, 1]",
                self.dominance_threshold
            )));
        }
        if !(self.old_version_fraction >= 0.0 && self.old_version_fraction < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "old_version_fraction {} must be in [0, 1)",
                self.old_version_fraction
            )));
        }
        Ok(self)
    }
}

/// Largest cohort by bytes and its share of the total. Ties go to the
/// younger cohort.
pub fn dominant_cohort(dist: &AgeDistribution, total_bytes: u64) -> (AgeCohort, f64) {
    let mut best = (AgeCohort::Recent, 0u64);
    for (cohort, stats) in dist.iter() {
        if stats.bytes > best.1 {
            best = (cohort, stats.bytes);
        }
    }
    let share = if total_bytes == 0 {
        0.0
    } else {
        best.1 as f64 / total_bytes as f64
    };
    (best.0, share)
}

pub fn recommend(profile: &BucketProfile, cfg: &EngineConfig) -> Result<Recommendation> {
    if profile.total_bytes == 0 {
        debug!("{}: no stored bytes, nothing to recommend", profile.name);
        return Ok(Recommendation {
            bucket: profile.name.clone(),
            actions: vec![],
            empty_profile: profile.is_empty(),
        });
    }

    let pricing = &cfg.pricing;
    let current = profile.storage_class;
    let (dominant, share) = dominant_cohort(&profile.age_distribution, profile.total_bytes);
    debug!(
        "{}: dominant cohort {} holds {:.1}% of bytes",
        profile.name,
        dominant.label(),
        share * 100.0
    );

    let mut actions: Vec<Action> = Vec::new();

    let target = dominant.target_class();
    if pricing.is_cheaper(target, current) {
        let delta = pricing.unit_price(current) - pricing.unit_price(target);
        let saving = Usd::from_dollars(delta * profile.size_gb());
        actions.push(Action {
            kind: ActionKind::ChangeClass,
            description: format!("Change storage class from {current} to {target}"),
            details: with_caveats(pricing, target, saving),
            estimated_monthly_saving: saving,
            target_class: Some(target),
            lifecycle_policy: None,
            noncurrent_retention_days: None,
        });
    }

    if share < cfg.dominance_threshold {
        if let Some(policy) = LifecyclePolicy::standard_for(current, pricing)? {
            let saving = lifecycle_saving(profile, &policy, pricing);
            actions.push(Action {
                kind: ActionKind::AddLifecyclePolicy,
                description: "Add lifecycle policy to transition older objects to cheaper \
                              storage classes"
                    .to_string(),
                details: format!(
                    "Suggested policy: {}. Estimated monthly savings: {saving}",
                    describe_policy(&policy)
                ),
                estimated_monthly_saving: saving,
                target_class: Some(policy.deepest()),
                lifecycle_policy: Some(policy),
                noncurrent_retention_days: None,
            });
        }
    }

    if profile.versioning_enabled {
        let fraction = profile.noncurrent_bytes as f64 / profile.total_bytes as f64;
        if fraction > cfg.old_version_fraction {
            let saving = Usd::from_dollars(
                bytes_to_gb(profile.noncurrent_bytes) * pricing.unit_price(current),
            );
            actions.push(Action {
                kind: ActionKind::DisableOldVersions,
                description: "Expire noncurrent object versions".to_string(),
                details: format!(
                    "Old versions hold {:.1}% of stored bytes; delete them {} days after \
                     they become noncurrent. Estimated monthly savings: {saving}",
                    fraction * 100.0,
                    cfg.noncurrent_retention_days
                ),
                estimated_monthly_saving: saving,
                target_class: None,
                lifecycle_policy: None,
                noncurrent_retention_days: Some(cfg.noncurrent_retention_days),
            });
        }
    }

    actions.sort_by_key(|a| a.kind);

    Ok(Recommendation {
        bucket: profile.name.clone(),
        actions,
        empty_profile: false,
    })
}

/// Steady-state saving once every cohort sits in the class the policy moves
/// it to.
fn lifecycle_saving(
    profile: &BucketProfile,
    policy: &LifecyclePolicy,
    pricing: &PricingTable,
) -> Usd {
    let current_price = pricing.unit_price(profile.storage_class);
    let dollars: f64 = profile
        .age_distribution
        .iter()
        .map(|(cohort, stats)| {
            let class = policy
                .class_at_age(cohort.min_age_days())
                .unwrap_or(profile.storage_class);
            bytes_to_gb(stats.bytes) * (current_price - pricing.unit_price(class))
        })
        .sum();
    Usd::from_dollars(dollars)
}

fn describe_policy(policy: &LifecyclePolicy) -> String {
    policy
        .rules()
        .iter()
        .map(|r| format!("move objects older than {} days to {}", r.age_days, r.target_class))
        .collect::<Vec<_>>()
        .join(", ")
}

fn with_caveats(pricing: &PricingTable, class: StorageClass, saving: Usd) -> String {
    let p = pricing.pricing(class);
    let mut s = format!("Estimated monthly savings: {saving}");
    if p.min_storage_days > 0 {
        s.push_str(&format!(
            "; {class} bills a minimum of {} days of storage and ${:.2}/GB for retrieval",
            p.min_storage_days, p.retrieval_per_gb
        ));
    }
    s
}
