//! Brings the service database to a usable state at startup: apply entity
//! schemas, wait until they are queryable, then seed default fixture rows.

use anyhow::{Context as _, Result};
use std::env;
use std::time::Duration;

use seedbed_common::clock::Clock;
use seedbed_common::db::Store;
use seedbed_common::err::BootstrapError;

pub use seedbed_common::{clock, db, err, schema, types};

pub mod registry;
pub mod seeder;
pub mod waiter;

#[cfg(test)]
pub(crate) mod mock;

use registry::Registry;

/// Retry budgets for the bootstrap stages, overridable from the environment
/// at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Poll retries per table before convergence is abandoned.
    pub max_attempts: u32,
    pub poll_interval: Duration,
    pub migration_retry_backoff: Duration,
}

impl Default for BootstrapConfig {
    fn default() -> BootstrapConfig {
        BootstrapConfig {
            max_attempts: 100,
            poll_interval: Duration::from_millis(50),
            migration_retry_backoff: Duration::from_secs(1),
        }
    }
}

impl BootstrapConfig {
    pub fn from_env() -> Result<BootstrapConfig> {
        let mut config = BootstrapConfig::default();
        if let Ok(v) = env::var("SEEDBED_MAX_ATTEMPTS") {
            config.max_attempts = v.parse().context("SEEDBED_MAX_ATTEMPTS parse error")?;
        }
        if let Ok(v) = env::var("SEEDBED_POLL_INTERVAL_MS") {
            let ms = v.parse().context("SEEDBED_POLL_INTERVAL_MS parse error")?;
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Ok(v) = env::var("SEEDBED_RETRY_BACKOFF_MS") {
            let ms = v.parse().context("SEEDBED_RETRY_BACKOFF_MS parse error")?;
            config.migration_retry_backoff = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

/// Full bootstrap: migrate, wait for convergence, seed. Each stage must
/// complete before the next begins; the first fatal error stops the run.
pub async fn migrate_db(
    store: &dyn Store,
    registry: &Registry,
    config: &BootstrapConfig,
    clock: &dyn Clock,
) -> Result<(), BootstrapError> {
    log::info!("applying schema migrations");
    waiter::migrate(store, registry, config, clock).await?;
    log::info!("waiting for migration convergence");
    waiter::wait_for_migration(store, registry, config, clock).await?;
    log::info!("seeding default fixtures");
    seeder::seed_defaults(store, registry).await?;
    log::info!("database bootstrap complete");
    Ok(())
}
