//! Background job: sweep expired tokens out of the cache.
//!
//! Runs at a fixed interval, independent of request traffic. Eviction
//! only reclaims memory; the cache read path rejects expired entries
//! anyway. The job is owned by the server lifecycle: tests call
//! `TokenCache::evict_expired` directly instead of waiting on the
//! wall clock.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::auth::TokenCache;

pub struct EvictionJob {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl EvictionJob {
    /// Spawn the sweep task, ticking at a fixed `period` independent of
    /// request traffic.
    pub fn start(cache: TokenCache, period: Duration) -> Self {
        let (shutdown, mut rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = cache.evict_expired();
                        if evicted > 0 {
                            tracing::debug!(
                                evicted,
                                remaining = cache.len(),
                                "evicted expired database tokens"
                            );
                        }
                    }
                    _ = rx.changed() => break,
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Stop the sweep and wait for the task to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenIssuer;

    #[tokio::test]
    async fn test_job_stops_promptly() {
        let issuer = TokenIssuer::new("http://127.0.0.1:9", "acme", "org-token", "2h");
        let cache = TokenCache::new(issuer);

        let job = EvictionJob::start(cache, Duration::from_secs(300));
        tokio::time::timeout(Duration::from_secs(5), job.stop())
            .await
            .expect("eviction job did not stop");
    }
}
