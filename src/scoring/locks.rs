use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::region::RegionId;

/// One write gate per region, shared by saves and bulk recomputes.
#[derive(Debug, Default)]
pub struct RegionLocks {
    gates: Mutex<HashMap<RegionId, Arc<AsyncMutex<()>>>>,
}

impl RegionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other writer holds `region`.
    pub async fn acquire(&self, region: &RegionId) -> OwnedMutexGuard<()> {
        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(region.clone())
            .or_default()
            .clone();
        gate.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn second_writer_waits_for_the_first() {
        let locks = Arc::new(RegionLocks::new());
        let region = RegionId::kecamatan("Cisurupan");
        let guard = locks.acquire(&region).await;

        let waiting = {
            let locks = Arc::clone(&locks);
            let region = region.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&region).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        waiting.await.expect("second writer proceeds");
    }

    #[tokio::test]
    async fn different_regions_do_not_block_each_other() {
        let locks = RegionLocks::new();
        let _first = locks.acquire(&RegionId::kecamatan("Cisurupan")).await;
        let _second = locks.acquire(&RegionId::desa("Cisurupan")).await;
    }
}
