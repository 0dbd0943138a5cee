use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::condition::{FilterCondition, ParameterMap};
use crate::error::{DataError, DataResult};
use crate::operation::Operation;

/// Argument shapes of the DAO's `retrieve` operation
#[derive(Debug, Clone, PartialEq)]
pub enum RetrieveQuery {
    /// No arguments: every row
    All,
    /// Rows belonging to one parent row. The identifier is forwarded as found
    /// in the request, absent included.
    ByParent(Option<String>),
    /// Rows matching a validated condition
    Filtered {
        condition: FilterCondition,
        params: ParameterMap,
    },
}

/// Per-table data-access object.
///
/// A DAO lists the operations it implements in [`TableDao::operations`]; the
/// router checks that list before every call and never calls an operation
/// that is not in it. The default bodies exist so implementations only write
/// the operations they list.
#[async_trait]
pub trait TableDao: Send + Sync {
    /// Operations this instance implements
    fn operations(&self) -> Vec<Operation>;

    /// Check if a specific operation is implemented
    fn supports(&self, operation: Operation) -> bool {
        self.operations().contains(&operation)
    }

    async fn create(&self, _body: Value) -> DataResult<Value> {
        Err(unsupported(Operation::Create))
    }

    async fn retrieve(&self, _query: RetrieveQuery) -> DataResult<Value> {
        Err(unsupported(Operation::Retrieve))
    }

    async fn retrieve_by_id(&self, _id: Option<String>) -> DataResult<Value> {
        Err(unsupported(Operation::RetrieveById))
    }

    async fn update(&self, _body: Value) -> DataResult<Value> {
        Err(unsupported(Operation::Update))
    }

    /// `criteria` is a single-entry object keyed by the primary-key alias
    async fn delete(&self, _criteria: Value) -> DataResult<Value> {
        Err(unsupported(Operation::Delete))
    }

    async fn replace(
        &self,
        _parent_table: &str,
        _parent_id: Option<String>,
        _body: Value,
    ) -> DataResult<Value> {
        Err(unsupported(Operation::Replace))
    }

    async fn options(&self) -> DataResult<Value> {
        Err(unsupported(Operation::Options))
    }
}

impl fmt::Debug for dyn TableDao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableDao")
            .field("operations", &self.operations())
            .finish()
    }
}

fn unsupported(operation: Operation) -> DataError {
    DataError::operation_not_supported(operation.to_string())
}
