use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::AppConfig;
use crate::engine::ServiceContext;

/// How often idle per-client limiter entries are dropped.
pub const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

pub type ClientRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<ServiceContext>,
    pub config: Arc<AppConfig>,
    pub limiter: Arc<ClientRateLimiter>,
}

impl AppState {
    pub fn new(context: ServiceContext, config: AppConfig) -> Self {
        let per_minute = NonZeroU32::new(config.server.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            context: Arc::new(context),
            config: Arc::new(config),
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
        }
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.config.server.rate_limit_per_minute
    }
}

/// Removes clients whose quota has fully replenished. Returns the entries left.
pub fn prune_limiter(limiter: &ClientRateLimiter) -> usize {
    let before = limiter.len();
    limiter.retain_recent();
    limiter.shrink_to_fit();
    let after = limiter.len();
    if after < before {
        debug!("Rate limiter pruned {} idle clients, {} tracked", before - after, after);
    }
    after
}

pub fn spawn_limiter_pruning(limiter: Arc<ClientRateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            prune_limiter(&limiter);
        }
    })
}
