use indexmap::IndexMap;
use std::fmt;

/// Scalar values accepted for fixture rows.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(true) => write!(f, "TRUE"),
            SqlValue::Bool(false) => write!(f, "FALSE"),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> SqlValue {
        SqlValue::Bool(v)
    }
}
impl From<i32> for SqlValue {
    fn from(v: i32) -> SqlValue {
        SqlValue::Int(v as i64)
    }
}
impl From<i64> for SqlValue {
    fn from(v: i64) -> SqlValue {
        SqlValue::Int(v)
    }
}
impl From<f64> for SqlValue {
    fn from(v: f64) -> SqlValue {
        SqlValue::Float(v)
    }
}
impl From<&str> for SqlValue {
    fn from(v: &str) -> SqlValue {
        SqlValue::Text(v.to_owned())
    }
}
impl From<String> for SqlValue {
    fn from(v: String) -> SqlValue {
        SqlValue::Text(v)
    }
}

/// One default row for an entity, column order preserved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixtureRow {
    values: IndexMap<String, SqlValue>,
}

impl FixtureRow {
    pub fn new() -> FixtureRow {
        FixtureRow::default()
    }

    pub fn set(mut self, column: &str, value: impl Into<SqlValue>) -> FixtureRow {
        self.values.insert(column.to_owned(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals() {
        assert_eq!(SqlValue::Null.to_string(), "NULL");
        assert_eq!(SqlValue::from(true).to_string(), "TRUE");
        assert_eq!(SqlValue::from(42).to_string(), "42");
        assert_eq!(SqlValue::from("it's").to_string(), "'it''s'");
    }

    #[test]
    fn row_preserves_column_order() {
        let row = FixtureRow::new()
            .set("id", 1)
            .set("name", "admin")
            .set("active", true);
        let columns: Vec<_> = row.columns().collect();
        assert_eq!(columns, vec!["id", "name", "active"]);
        assert_eq!(row.get("name"), Some(&SqlValue::Text("admin".into())));
    }
}
