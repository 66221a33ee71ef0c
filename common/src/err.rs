use std::fmt;

/// Error surface of a [`crate::db::Store`] implementation.
#[derive(Debug)]
pub enum StoreError {
    /// The statement matched no rows. Not a failure for cleanup paths.
    NoRows,
    /// The table is not (yet) visible to this connection.
    Unavailable(String),
    Backend(anyhow::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NoRows => write!(f, "no rows found"),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Backend(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Backend(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> StoreError {
        match e {
            sqlx::Error::RowNotFound => StoreError::NoRows,
            e => StoreError::Backend(e.into()),
        }
    }
}

/// Fatal bootstrap outcomes. Stage functions return these instead of
/// terminating; the embedding binary decides whether to exit.
#[derive(Debug)]
pub enum BootstrapError {
    SchemaApply {
        table: String,
        attempts: u32,
        source: StoreError,
    },
    Probe {
        table: String,
        attempts: u32,
        source: StoreError,
    },
    Drop {
        table: String,
        source: StoreError,
    },
    Seed {
        table: String,
        source: StoreError,
    },
    DuplicateEntity {
        table: String,
    },
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::SchemaApply {
                table,
                attempts,
                source,
            } => write!(
                f,
                "schema apply failed for `{}` after {} attempts: {}",
                table, attempts, source
            ),
            BootstrapError::Probe {
                table,
                attempts,
                source,
            } => write!(
                f,
                "migration of `{}` did not converge after {} probes: {}",
                table, attempts, source
            ),
            BootstrapError::Drop { table, source } => {
                write!(f, "failed to drop `{}`: {}", table, source)
            }
            BootstrapError::Seed { table, source } => {
                write!(f, "failed to seed `{}`: {}", table, source)
            }
            BootstrapError::DuplicateEntity { table } => {
                write!(f, "entity `{}` is already registered", table)
            }
        }
    }
}

impl std::error::Error for BootstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootstrapError::SchemaApply { source, .. }
            | BootstrapError::Probe { source, .. }
            | BootstrapError::Drop { source, .. }
            | BootstrapError::Seed { source, .. } => Some(source),
            BootstrapError::DuplicateEntity { .. } => None,
        }
    }
}
