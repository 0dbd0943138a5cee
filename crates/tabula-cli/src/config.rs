//! Table schema file.
//!
//! ```yaml
//! tables:
//!   - name: groups
//!     alias: Groups
//!     primary_key: [groupID]
//!     columns: [title]
//!   - name: users
//!     alias: Users
//!     primary_key: [{ name: user_id, alias: userID }]
//!     columns: [name, groupID]
//!     parent: groups
//!     rows:
//!       - { userID: "1", name: Joe Tester, groupID: g1 }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tabula_dispatch::{
    ColumnDescriptor, MemoryDao, Operation, Router as TableRouter, TableDescriptor, UsageError,
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid schema: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Table {0} is declared more than once")]
    DuplicateTable(String),

    #[error("Table {table} refers to unknown parent {parent}")]
    UnknownParent { table: String, parent: String },

    #[error(transparent)]
    Table(#[from] UsageError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub name: String,
    /// Defaults to `name`
    pub alias: Option<String>,
    pub primary_key: Vec<ColumnConfig>,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    /// Name of another table in the same file
    pub parent: Option<String>,
    /// Column holding the parent identifier; defaults to the parent's key alias
    pub parent_key: Option<String>,
    /// Operations the table's DAO offers; all when omitted
    pub operations: Option<Vec<Operation>>,
    #[serde(default = "default_true")]
    pub reconcile_bodies: bool,
    #[serde(default)]
    pub rows: Vec<Value>,
}

/// A bare column name or a `{name, alias}` pair
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ColumnConfig {
    Named(String),
    Aliased { name: String, alias: Option<String> },
}

impl From<&ColumnConfig> for ColumnDescriptor {
    fn from(column: &ColumnConfig) -> Self {
        match column {
            ColumnConfig::Named(name) => ColumnDescriptor::named(name.as_str()),
            ColumnConfig::Aliased { name, alias } => ColumnDescriptor::new(
                name.as_str(),
                alias.clone().unwrap_or_else(|| name.clone()),
            ),
        }
    }
}

fn default_true() -> bool {
    true
}

impl SchemaConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: SchemaConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.name.as_str()) {
                return Err(ConfigError::DuplicateTable(table.name.clone()));
            }
            table.descriptor()?;
        }

        for table in &self.tables {
            if let Some(parent) = &table.parent {
                if !seen.contains(parent.as_str()) {
                    return Err(ConfigError::UnknownParent {
                        table: table.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Descriptors keyed by table name
    pub fn descriptors(&self) -> Result<HashMap<String, Arc<TableDescriptor>>, ConfigError> {
        self.tables
            .iter()
            .map(|table| Ok((table.name.clone(), Arc::new(table.descriptor()?))))
            .collect()
    }

    /// One in-memory router per table, seeded with the configured rows
    pub fn routers(&self) -> Result<Vec<TableRouter>, ConfigError> {
        let descriptors = self.descriptors()?;
        let mut routers = Vec::with_capacity(self.tables.len());

        for table in &self.tables {
            let descriptor = descriptors[&table.name].clone();
            let mut dao = MemoryDao::new(descriptor.clone()).with_rows(table.rows.iter().cloned());
            if let Some(operations) = &table.operations {
                dao = dao.with_operations(operations.iter().copied());
            }

            let parent = match &table.parent {
                Some(name) => Some(descriptors.get(name).cloned().ok_or_else(|| {
                    ConfigError::UnknownParent {
                        table: table.name.clone(),
                        parent: name.clone(),
                    }
                })?),
                None => None,
            };
            if let Some(parent) = &parent {
                let key = table
                    .parent_key
                    .clone()
                    .unwrap_or_else(|| parent.primary_key_alias().to_string());
                dao = dao.with_parent_key(key);
            }

            let mut router = TableRouter::new(Arc::new(dao), descriptor)
                .with_body_reconciliation(table.reconcile_bodies);
            if let Some(parent) = parent {
                router = router.with_parent(parent);
            }

            debug!("Configured table {} with {} seed rows", table.name, table.rows.len());
            routers.push(router);
        }

        Ok(routers)
    }
}

impl TableConfig {
    fn descriptor(&self) -> Result<TableDescriptor, UsageError> {
        let alias = self.alias.clone().unwrap_or_else(|| self.name.clone());
        let primary_key = self.primary_key.iter().map(ColumnDescriptor::from).collect();
        Ok(TableDescriptor::new(self.name.as_str(), alias, primary_key)?
            .with_columns(self.columns.iter().map(ColumnDescriptor::from)))
    }
}
