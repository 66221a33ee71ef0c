//! In-memory store and clock doubles for the bootstrap tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use seedbed_common::clock::Clock;
use seedbed_common::db::Store;
use seedbed_common::err::StoreError;
use seedbed_common::schema::{Column, SqlType, Table};
use seedbed_common::types::{FixtureRow, SqlValue};

use crate::registry::{EntityDescriptor, Registry};

pub(crate) fn registry_of(names: &[&str]) -> Registry {
    let mut registry = Registry::new();
    for name in names {
        let table = Table::new(name)
            .column("id", Column::new(SqlType::BigInt).not_null())
            .primary_key(&["id"]);
        registry.register(EntityDescriptor::new(table)).unwrap();
    }
    registry
}

pub(crate) struct FakeClock {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> FakeClock {
        FakeClock {
            sleeps: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Scripted store: failure budgets per table, row storage in memory.
pub(crate) struct MockStore {
    pub rows: Mutex<HashMap<String, Vec<FixtureRow>>>,
    pub apply_calls: Mutex<Vec<String>>,
    pub probe_calls: Mutex<Vec<String>>,
    pub dropped: Mutex<Vec<String>>,
    apply_failures: Mutex<HashMap<String, u32>>,
    probe_failures: Mutex<HashMap<String, u32>>,
    truncate_failures: Mutex<HashSet<String>>,
    drop_failures: Mutex<HashSet<String>>,
}

impl MockStore {
    pub fn new() -> MockStore {
        MockStore {
            rows: Mutex::new(HashMap::new()),
            apply_calls: Mutex::new(Vec::new()),
            probe_calls: Mutex::new(Vec::new()),
            dropped: Mutex::new(Vec::new()),
            apply_failures: Mutex::new(HashMap::new()),
            probe_failures: Mutex::new(HashMap::new()),
            truncate_failures: Mutex::new(HashSet::new()),
            drop_failures: Mutex::new(HashSet::new()),
        }
    }

    pub fn create_table(&self, table: &str) {
        self.rows
            .lock()
            .unwrap()
            .entry(table.to_owned())
            .or_default();
    }

    pub fn push_row(&self, table: &str, row: FixtureRow) {
        self.rows
            .lock()
            .unwrap()
            .entry(table.to_owned())
            .or_default()
            .push(row);
    }

    /// Fail the next `times` schema applies for `table`.
    pub fn fail_apply(&self, table: &str, times: u32) {
        self.apply_failures
            .lock()
            .unwrap()
            .insert(table.to_owned(), times);
    }

    /// Fail the next `times` probes for `table`; `u32::MAX` fails forever.
    pub fn fail_probe(&self, table: &str, times: u32) {
        self.probe_failures
            .lock()
            .unwrap()
            .insert(table.to_owned(), times);
    }

    pub fn fail_truncate(&self, table: &str) {
        self.truncate_failures
            .lock()
            .unwrap()
            .insert(table.to_owned());
    }

    pub fn fail_drop(&self, table: &str) {
        self.drop_failures.lock().unwrap().insert(table.to_owned());
    }

    fn take_failure(failures: &Mutex<HashMap<String, u32>>, table: &str) -> bool {
        let mut failures = failures.lock().unwrap();
        if let Some(n) = failures.get_mut(table) {
            if *n > 0 {
                if *n != u32::MAX {
                    *n -= 1;
                }
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl Store for MockStore {
    async fn apply_schema(&self, table: &Table) -> Result<(), StoreError> {
        self.apply_calls.lock().unwrap().push(table.name.clone());
        if Self::take_failure(&self.apply_failures, &table.name) {
            return Err(StoreError::Unavailable(format!(
                "cannot apply schema for `{}`",
                table.name
            )));
        }
        self.create_table(&table.name);
        Ok(())
    }

    async fn count(&self, table: &str) -> Result<u64, StoreError> {
        self.probe_calls.lock().unwrap().push(table.to_owned());
        if Self::take_failure(&self.probe_failures, table) {
            return Err(StoreError::Unavailable(format!(
                "table `{}` not found",
                table
            )));
        }
        match self.rows.lock().unwrap().get(table) {
            Some(rows) => Ok(rows.len() as u64),
            None => Err(StoreError::Unavailable(format!(
                "table `{}` not found",
                table
            ))),
        }
    }

    async fn delete_all(&self, table: &str) -> Result<u64, StoreError> {
        if self.truncate_failures.lock().unwrap().contains(table) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "lock wait timeout on `{}`",
                table
            )));
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(table) {
            Some(rows) if rows.is_empty() => Err(StoreError::NoRows),
            Some(rows) => {
                let count = rows.len() as u64;
                rows.clear();
                Ok(count)
            }
            None => Err(StoreError::Unavailable(format!(
                "table `{}` not found",
                table
            ))),
        }
    }

    async fn drop_table(&self, table: &str) -> Result<(), StoreError> {
        if self.drop_failures.lock().unwrap().contains(table) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "cannot drop `{}`",
                table
            )));
        }
        if self.rows.lock().unwrap().remove(table).is_none() {
            return Err(StoreError::Unavailable(format!(
                "table `{}` not found",
                table
            )));
        }
        self.dropped.lock().unwrap().push(table.to_owned());
        Ok(())
    }

    async fn row_exists(
        &self,
        table: &str,
        column: &str,
        key: &SqlValue,
    ) -> Result<bool, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(table)
            .map(|rows| rows.iter().any(|row| row.get(column) == Some(key)))
            .unwrap_or(false))
    }

    async fn insert(&self, table: &str, row: &FixtureRow) -> Result<(), StoreError> {
        self.rows
            .lock()
            .unwrap()
            .entry(table.to_owned())
            .or_default()
            .push(row.clone());
        Ok(())
    }
}
