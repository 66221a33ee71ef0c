//! Migration convergence waiter: apply schemas with a single retry, then
//! poll each table until it is queryable, bounded by a fixed attempt budget.

use seedbed_common::clock::Clock;
use seedbed_common::db::Store;
use seedbed_common::err::{BootstrapError, StoreError};

use crate::registry::{EntityDescriptor, Registry};
use crate::BootstrapConfig;

/// Per-entity outcome of a schema apply.
#[derive(Debug)]
pub enum MigrationResult {
    Succeeded,
    FailedAfterRetry(StoreError),
}

async fn migrate_entity(
    store: &dyn Store,
    entity: &EntityDescriptor,
    config: &BootstrapConfig,
    clock: &dyn Clock,
) -> MigrationResult {
    match store.apply_schema(entity.table()).await {
        Ok(()) => MigrationResult::Succeeded,
        Err(first) => {
            log::warn!(
                "schema apply failed for `{}`, retrying once: {}",
                entity.name(),
                first
            );
            clock.sleep(config.migration_retry_backoff).await;
            match store.apply_schema(entity.table()).await {
                Ok(()) => MigrationResult::Succeeded,
                Err(second) => MigrationResult::FailedAfterRetry(second),
            }
        }
    }
}

/// Applies every entity schema in registration order. A failed apply is
/// retried exactly once after `migration_retry_backoff`; a second failure
/// is fatal, since continuing against a half-migrated schema is worse than
/// refusing to start.
pub async fn migrate(
    store: &dyn Store,
    registry: &Registry,
    config: &BootstrapConfig,
    clock: &dyn Clock,
) -> Result<(), BootstrapError> {
    for entity in registry.iter() {
        match migrate_entity(store, entity, config, clock).await {
            MigrationResult::Succeeded => {
                log::info!("migrated `{}`", entity.name());
            }
            MigrationResult::FailedAfterRetry(source) => {
                return Err(BootstrapError::SchemaApply {
                    table: entity.name().to_owned(),
                    attempts: 2,
                    source,
                });
            }
        }
    }
    Ok(())
}

/// Polls each table with a count probe until it answers without error.
/// Any `Ok`, zero rows included, counts as converged. Tables are waited on
/// independently; exhausting the budget for one table is fatal.
pub async fn wait_for_migration(
    store: &dyn Store,
    registry: &Registry,
    config: &BootstrapConfig,
    clock: &dyn Clock,
) -> Result<(), BootstrapError> {
    'tables: for entity in registry.iter() {
        let table = entity.name();
        let mut last = match store.count(table).await {
            Ok(count) => {
                log::debug!("`{}` is queryable ({} rows)", table, count);
                continue 'tables;
            }
            Err(e) => e,
        };
        for _ in 0..config.max_attempts {
            clock.sleep(config.poll_interval).await;
            match store.count(table).await {
                Ok(count) => {
                    log::debug!("`{}` is queryable ({} rows)", table, count);
                    continue 'tables;
                }
                Err(e) => last = e,
            }
        }
        return Err(BootstrapError::Probe {
            table: table.to_owned(),
            attempts: config.max_attempts.saturating_add(1),
            source: last,
        });
    }
    Ok(())
}

/// Deletes all rows from every table, best effort. An empty table is not an
/// error, and a failing table never blocks cleanup of the remaining ones.
pub async fn truncate(store: &dyn Store, registry: &Registry) {
    for entity in registry.iter() {
        let table = entity.name();
        match store.delete_all(table).await {
            Ok(count) => log::info!("truncated `{}` ({} rows)", table, count),
            Err(StoreError::NoRows) => log::info!("truncated `{}` (already empty)", table),
            Err(e) => log::error!("failed to truncate `{}`: {}", table, e),
        }
    }
}

/// Drops every table. Unlike truncation this is fatal on the first failure:
/// a partially dropped schema is unsafe to leave running.
pub async fn drop_all(store: &dyn Store, registry: &Registry) -> Result<(), BootstrapError> {
    for entity in registry.iter() {
        let table = entity.name();
        store
            .drop_table(table)
            .await
            .map_err(|source| BootstrapError::Drop {
                table: table.to_owned(),
                source,
            })?;
        log::info!("dropped `{}`", table);
    }
    Ok(())
}
