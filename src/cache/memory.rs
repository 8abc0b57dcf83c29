//! In-process metadata cache.

use async_trait::async_trait;
use color_eyre::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::traits::MetadataCache;
use crate::weather::city::cache_key;
use crate::weather::types::CacheEntry;

#[derive(Debug, Clone)]
struct Slot {
  entry: CacheEntry,
  expires_at: Instant,
}

/// Cache held in a `HashMap` behind an async `RwLock`.
///
/// Expired slots are skipped on read and dropped on the next write.
#[derive(Clone, Default)]
pub struct MemoryCache {
  slots: Arc<RwLock<HashMap<String, Slot>>>,
}

impl MemoryCache {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl MetadataCache for MemoryCache {
  async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
    let slots = self.slots.read().await;
    let now = Instant::now();

    Ok(
      slots
        .get(&cache_key(key))
        .filter(|slot| slot.expires_at > now)
        .map(|slot| slot.entry.clone()),
    )
  }

  async fn set(&self, key: &str, entry: &CacheEntry, ttl: Duration) -> Result<()> {
    let now = Instant::now();
    let expires_at = now.checked_add(ttl).unwrap_or(now + Duration::from_secs(86_400 * 365));

    let mut slots = self.slots.write().await;
    slots.retain(|_, slot| slot.expires_at > now);
    slots.insert(
      cache_key(key),
      Slot {
        entry: entry.clone(),
        expires_at,
      },
    );

    Ok(())
  }
}
