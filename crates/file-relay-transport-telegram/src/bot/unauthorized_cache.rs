//! Unauthorized access flood protection
//!
//! Users outside the allowlist get one "Access denied" reply per cooldown
//! period; further attempts are dropped silently.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Users that were recently told they have no access
#[derive(Clone)]
pub struct UnauthorizedCache {
    /// user id → (), expiring after the cooldown
    notified: Cache<i64, ()>,
    silenced_count: Arc<AtomicU64>,
}

impl UnauthorizedCache {
    /// Create a cache with the given cooldown and capacity
    #[must_use]
    pub fn new(cooldown_secs: u64, max_capacity: u64) -> Self {
        Self {
            notified: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(Duration::from_secs(cooldown_secs))
                .build(),
            silenced_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Whether a denial message should go out to `user_id` now
    pub async fn should_send(&self, user_id: i64) -> bool {
        if self.notified.get(&user_id).await.is_none() {
            return true;
        }

        let count = self.silenced_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count.is_multiple_of(100) {
            debug!("⛔️ Silenced {count} unauthorized attempts (recent: user {user_id})");
        }
        false
    }

    /// Start the cooldown for `user_id`
    pub async fn mark_sent(&self, user_id: i64) {
        self.notified.insert(user_id, ()).await;
    }
}
