//! Idempotent default-row seeding. A fixture row keyed by the table's
//! primary key is inserted only when no row with that key exists yet, so
//! repeated runs against an already-seeded store change nothing. Rows that
//! cannot be keyed are skipped, never inserted twice.

use seedbed_common::db::Store;
use seedbed_common::err::BootstrapError;

use crate::registry::Registry;

/// Seeds fixture rows for every entity that provides them. Returns the
/// number of rows actually inserted.
pub async fn seed_defaults(
    store: &dyn Store,
    registry: &Registry,
) -> Result<u64, BootstrapError> {
    let mut inserted = 0;
    for entity in registry.iter() {
        let Some(rows) = entity.fixtures() else {
            continue;
        };
        let table = entity.name();
        let key_column = entity.table().key_column();
        let mut added = 0;
        for row in &rows {
            let key = key_column.and_then(|column| row.get(column).map(|key| (column, key)));
            let Some((column, key)) = key else {
                log::warn!(
                    "fixture row for `{}` carries no primary key value, skipped",
                    table
                );
                continue;
            };
            let exists = store
                .row_exists(table, column, key)
                .await
                .map_err(|source| BootstrapError::Seed {
                    table: table.to_owned(),
                    source,
                })?;
            if exists {
                continue;
            }
            store
                .insert(table, row)
                .await
                .map_err(|source| BootstrapError::Seed {
                    table: table.to_owned(),
                    source,
                })?;
            added += 1;
        }
        log::info!(
            "seeded `{}` ({} of {} fixture rows inserted)",
            table,
            added,
            rows.len()
        );
        inserted += added;
    }
    Ok(inserted)
}
