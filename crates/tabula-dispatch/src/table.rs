use serde::{Deserialize, Serialize};

use crate::error::UsageError;

/// A column as stored (`name`) and as exposed to clients (`alias`)
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub alias: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }

    /// Column whose alias matches its source name
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
        }
    }
}

/// Read-only view of a table, supplied by the schema layer.
///
/// The primary key is never empty; identifier extraction only looks at its
/// first column.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    name: String,
    alias: String,
    primary_key: Vec<ColumnDescriptor>,
    columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn new(
        name: impl Into<String>,
        alias: impl Into<String>,
        primary_key: Vec<ColumnDescriptor>,
    ) -> Result<Self, UsageError> {
        let name = name.into();
        if primary_key.is_empty() {
            return Err(UsageError::EmptyPrimaryKey(name));
        }

        Ok(Self {
            name,
            alias: alias.into(),
            columns: primary_key.clone(),
            primary_key,
        })
    }

    /// Add non-key columns. Columns already present (by alias) are skipped.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnDescriptor>) -> Self {
        for column in columns {
            if !self.columns.iter().any(|c| c.alias == column.alias) {
                self.columns.push(column);
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn primary_key(&self) -> &[ColumnDescriptor] {
        &self.primary_key
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Alias of the first primary-key column
    pub fn primary_key_alias(&self) -> &str {
        // Guaranteed non-empty by `new`.
        &self.primary_key[0].alias
    }

    /// `Table.column` form used by filter conditions
    pub fn qualified(&self, column: &ColumnDescriptor) -> String {
        format!("{}.{}", self.alias, column.alias)
    }

    /// Every column a filter condition may reference, qualified
    pub fn filterable_columns(&self) -> impl Iterator<Item = String> + '_ {
        self.columns.iter().map(|c| self.qualified(c))
    }

    /// Resolve a qualified column name back to its descriptor
    pub fn column_by_qualified(&self, qualified: &str) -> Option<&ColumnDescriptor> {
        let (table, column) = qualified.split_once('.')?;
        if table != self.alias {
            return None;
        }
        self.columns.iter().find(|c| c.alias == column)
    }
}
