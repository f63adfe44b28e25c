//! Per-player mutual exclusion for stat updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::PlayerId;

/// One async lock per player id.
///
/// Entries are created on first use and never pruned, so the map holds at
/// most one entry per player ever updated.
#[derive(Debug, Default)]
pub struct PlayerLocks {
    locks: Mutex<HashMap<PlayerId, Arc<AsyncMutex<()>>>>,
}

impl PlayerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder exists for this player.
    pub async fn acquire(&self, id: &PlayerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_same_player_waits() {
        let locks = PlayerLocks::new();
        let p1 = PlayerId::from("p1");

        let guard = locks.acquire(&p1).await;
        assert!(timeout(Duration::from_millis(50), locks.acquire(&p1)).await.is_err());

        drop(guard);
        assert!(timeout(Duration::from_millis(50), locks.acquire(&p1)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_players_do_not_wait() {
        let locks = PlayerLocks::new();

        let _p1 = locks.acquire(&"p1".into()).await;
        assert!(timeout(Duration::from_millis(50), locks.acquire(&"p2".into())).await.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_reacquire_reuses_entry() {
        let locks = PlayerLocks::new();
        let p1 = PlayerId::from("p1");

        for _ in 0..3 {
            drop(locks.acquire(&p1).await);
        }
        assert_eq!(locks.len(), 1);
    }
}
