use chrono::{DateTime, Utc};

use crate::{
    inventory::BucketInventory,
    types::{AgeCohort, AgeDistribution, BucketProfile},
};

/// Whole days between creation and `now`; objects stamped in the future are
/// treated as brand new.
pub fn age_days(created: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    (now - created).num_days().clamp(0, i64::from(u32::MAX)) as u32
}

pub fn classify(bucket: &BucketInventory) -> BucketProfile {
    let mut age_distribution = AgeDistribution::default();
    let mut total_bytes: u64 = 0;
    let mut noncurrent_bytes: u64 = 0;

    for obj in &bucket.objects {
        let band = age_distribution.get_mut(AgeCohort::for_age(obj.age_days));
        band.objects += 1;
        band.bytes = band.bytes.saturating_add(obj.size_bytes);

        total_bytes = total_bytes.saturating_add(obj.size_bytes);
        if !obj.is_live {
            noncurrent_bytes = noncurrent_bytes.saturating_add(obj.size_bytes);
        }
    }

    BucketProfile {
        name: bucket.name.clone(),
        storage_class: bucket.storage_class,
        location: bucket.location.clone(),
        total_bytes,
        object_count: bucket.objects.len() as u64,
        age_distribution,
        versioning_enabled: bucket.versioning_enabled,
        noncurrent_bytes,
    }
}
