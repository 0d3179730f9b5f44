// ============================================================================
// Bucket Store
// ============================================================================
//
// One store per rate tier, mapping client key -> token bucket.
//
// Lookups of existing buckets take the shared lock; only creating a bucket
// and sweeping take the exclusive one. Each bucket sits behind its own mutex
// so refill-and-spend is atomic per client. The shared lock is held while a
// bucket is mutated, so a sweep can never evict a bucket mid-admission.
//
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use turnate_config::RateTierConfig;
use turnate_metrics::{RATE_LIMIT_BUCKETS, RATE_LIMIT_EVICTIONS};

use super::bucket::ClientBucket;
use super::clock::Clock;

pub struct BucketStore {
    tier: &'static str,
    config: RateTierConfig,
    clock: Arc<dyn Clock>,
    buckets: RwLock<HashMap<String, Mutex<ClientBucket>>>,
}

impl BucketStore {
    pub fn new(tier: &'static str, config: RateTierConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            tier,
            config,
            clock,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    pub fn tier(&self) -> &'static str {
        self.tier
    }

    pub fn config(&self) -> RateTierConfig {
        self.config
    }

    /// Admit or deny one request from `key`
    ///
    /// Unknown keys get a fresh full bucket, so a first request is always
    /// admitted while burst > 0.
    pub async fn allow(&self, key: &str) -> bool {
        {
            let buckets = self.buckets.read().await;
            if let Some(bucket) = buckets.get(key) {
                let mut bucket = bucket.lock().await;
                return bucket.try_acquire(self.clock.now());
            }
        }

        let mut buckets = self.buckets.write().await;
        let created = !buckets.contains_key(key);
        let now = self.clock.now();
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(ClientBucket::full(self.config, now)));
        let admitted = bucket.get_mut().try_acquire(now);

        if created {
            RATE_LIMIT_BUCKETS
                .with_label_values(&[self.tier])
                .set(buckets.len() as i64);
        }
        admitted
    }

    /// Evict every bucket that has refilled to capacity
    ///
    /// Removing a full bucket is indistinguishable from keeping it: the next
    /// request from that key gets a new full bucket. Returns the eviction count.
    pub async fn sweep(&self) -> usize {
        let mut buckets = self.buckets.write().await;
        let now = self.clock.now();
        let before = buckets.len();
        buckets.retain(|_, bucket| !bucket.get_mut().is_idle_at(now));
        let evicted = before - buckets.len();

        RATE_LIMIT_BUCKETS
            .with_label_values(&[self.tier])
            .set(buckets.len() as i64);
        if evicted > 0 {
            RATE_LIMIT_EVICTIONS
                .with_label_values(&[self.tier])
                .inc_by(evicted as u64);
            tracing::debug!(
                tier = self.tier,
                evicted = evicted,
                remaining = buckets.len(),
                "Swept idle rate limit buckets"
            );
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.buckets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.buckets.read().await.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.buckets.read().await.contains_key(key)
    }

    /// Start a background task that sweeps this store every `every`
    ///
    /// The task lives until the returned handle is shut down or dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> SweeperHandle {
        let store = Arc::clone(self);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.sweep().await;
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!(tier = store.tier, "Rate limit sweeper stopped");
                        break;
                    }
                }
            }
        });

        tracing::info!(
            tier = self.tier,
            interval_secs = every.as_secs(),
            "Rate limit sweeper started"
        );

        SweeperHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Owns a running sweeper task
///
/// Dropping the handle aborts the task; `shutdown` stops it and waits.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
