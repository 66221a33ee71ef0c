//! Schema definitions rendered as MySQL DDL.

use indexmap::IndexMap;
use std::fmt;

pub fn escape_db_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Bool,
    Int,
    BigInt,
    Double,
    Varchar(u16),
    Text,
    DateTime,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Bool => write!(f, "BOOLEAN"),
            SqlType::Int => write!(f, "INT"),
            SqlType::BigInt => write!(f, "BIGINT"),
            SqlType::Double => write!(f, "DOUBLE"),
            SqlType::Varchar(len) => write!(f, "VARCHAR({})", len),
            SqlType::Text => write!(f, "TEXT"),
            SqlType::DateTime => write!(f, "DATETIME"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub sql_type: SqlType,
    pub not_null: bool,
    pub auto_increment: bool,
}

impl Column {
    pub fn new(sql_type: SqlType) -> Column {
        Column {
            sql_type,
            not_null: false,
            auto_increment: false,
        }
    }

    pub fn not_null(mut self) -> Column {
        self.not_null = true;
        self
    }

    pub fn auto_increment(mut self) -> Column {
        self.auto_increment = true;
        self
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_type)?;
        if self.not_null {
            write!(f, " NOT NULL")?;
        } else {
            write!(f, " NULL")?;
        }
        if self.auto_increment {
            write!(f, " AUTO_INCREMENT")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableKey {
    pub columns: Vec<String>,
    pub unique: bool,
}

/// A named logical table. Columns and indexes keep registration order so
/// the rendered DDL is stable between runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: IndexMap<String, Column>,
    pub primary: Vec<String>,
    pub indexes: IndexMap<String, TableKey>,
}

impl Table {
    pub fn new(name: &str) -> Table {
        Table {
            name: name.to_owned(),
            columns: IndexMap::new(),
            primary: Vec::new(),
            indexes: IndexMap::new(),
        }
    }

    pub fn column(mut self, name: &str, column: Column) -> Table {
        self.columns.insert(name.to_owned(), column);
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Table {
        self.primary = columns.iter().map(|c| (*c).to_owned()).collect();
        self
    }

    pub fn index(mut self, name: &str, columns: &[&str]) -> Table {
        self.indexes.insert(
            name.to_owned(),
            TableKey {
                columns: columns.iter().map(|c| (*c).to_owned()).collect(),
                unique: false,
            },
        );
        self
    }

    pub fn unique(mut self, name: &str, columns: &[&str]) -> Table {
        self.indexes.insert(
            name.to_owned(),
            TableKey {
                columns: columns.iter().map(|c| (*c).to_owned()).collect(),
                unique: true,
            },
        );
        self
    }

    /// First primary key column, the identity used for fixture seeding.
    pub fn key_column(&self) -> Option<&str> {
        self.primary.first().map(|c| c.as_str())
    }

    pub fn create_sql(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CREATE TABLE IF NOT EXISTS {} (\n    ",
            escape_db_identifier(&self.name)
        )?;
        write!(
            f,
            "{}",
            self.columns
                .iter()
                .map(|(name, column)| format!("{} {}", escape_db_identifier(name), column))
                .collect::<Vec<_>>()
                .join(",\n    ")
        )?;
        if !self.primary.is_empty() {
            let columns = self
                .primary
                .iter()
                .map(|c| escape_db_identifier(c))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, ",\n    PRIMARY KEY ({})", columns)?;
        }
        for (name, key) in &self.indexes {
            let columns = key
                .columns
                .iter()
                .map(|c| escape_db_identifier(c))
                .collect::<Vec<_>>()
                .join(", ");
            let kind = if key.unique { "UNIQUE KEY" } else { "KEY" };
            write!(
                f,
                ",\n    {} {} ({})",
                kind,
                escape_db_identifier(name),
                columns
            )?;
        }
        write!(f, "\n)")
    }
}
