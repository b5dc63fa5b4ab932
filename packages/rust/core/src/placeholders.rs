//! Download counts and timestamps for catalog records.
//!
//! The source tree carries no usage or history data. Records either leave
//! these fields unknown (`null` in the artifact) or get values derived from
//! a seed and the component id, so identical inputs always produce identical
//! artifacts.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use componentry_shared::PlaceholderPolicy;

/// 2024-01-01T00:00:00Z, the earliest seeded `createdAt`.
const SEEDED_EPOCH_SECS: i64 = 1_704_067_200;

/// Seeded `createdAt` falls within this many days of the epoch.
const CREATED_SPAN_DAYS: u32 = 365;

/// Seeded `updatedAt` trails `createdAt` by at most this many days.
const UPDATED_SPAN_DAYS: u32 = 120;

/// Seeded download counts fall in `[MIN_DOWNLOADS, MIN_DOWNLOADS + DOWNLOAD_SPAN)`.
const MIN_DOWNLOADS: u64 = 50;
const DOWNLOAD_SPAN: u64 = 5_000;

/// Placeholder values for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placeholders {
    pub downloads: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Placeholder values for the component `id` under `policy`.
pub fn placeholders_for(policy: PlaceholderPolicy, id: &str) -> Placeholders {
    match policy {
        PlaceholderPolicy::Unknown => Placeholders::default(),
        PlaceholderPolicy::Seeded { seed } => seeded(seed, id),
    }
}

fn seeded(seed: u64, id: &str) -> Placeholders {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(id.as_bytes());
    let digest = hasher.finalize();

    let word = |i: usize| -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&digest[i * 8..i * 8 + 8]);
        u64::from_le_bytes(buf)
    };

    let downloads = MIN_DOWNLOADS + word(0) % DOWNLOAD_SPAN;

    let created_offset = (word(1) % (u64::from(CREATED_SPAN_DAYS) * 86_400)) as i64;
    let updated_offset = (word(2) % (u64::from(UPDATED_SPAN_DAYS) * 86_400)) as i64;

    let created_at = DateTime::<Utc>::from_timestamp(SEEDED_EPOCH_SECS + created_offset, 0);
    let updated_at = created_at.map(|c| c + Duration::seconds(updated_offset));

    Placeholders {
        downloads: Some(downloads),
        created_at,
        updated_at,
    }
}
