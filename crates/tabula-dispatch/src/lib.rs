//! # tabula-dispatch
//!
//! Generic resource dispatch: exposes a table as CRUD operations over an
//! injected data-access object without per-resource code.
//!
//! ## Architecture
//!
//! - **TableDescriptor**: table name/alias, primary key and columns
//! - **TableDao**: per-table persistence; lists the operations it implements
//! - **CapabilityGuard**: checks that list before every call
//! - **identifier**: reads primary/parent key values from route parameters
//! - **reconcile**: writes route identifiers into mutation bodies
//! - **filter**: parses `where`/`params` into a typed [`FilterCondition`]
//! - **Router**: composes all of the above per operation
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tabula_dispatch::{
//!     ColumnDescriptor, MemoryDao, RequestContext, Router, TableDescriptor,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let users = Arc::new(
//!     TableDescriptor::new("users", "Users", vec![ColumnDescriptor::named("userID")])?
//!         .with_columns([ColumnDescriptor::named("name")]),
//! );
//! let router = Router::new(Arc::new(MemoryDao::new(users.clone())), users);
//!
//! let reply = router
//!     .create(RequestContext::new().with_body(json!({"name": "Joe Tester"})))
//!     .await?;
//! assert_eq!(reply.status, http::StatusCode::CREATED);
//!
//! let reply = router
//!     .retrieve_where(
//!         RequestContext::new()
//!             .with_query("where", r#"{"$eq":{"Users.name":":name"}}"#)
//!             .with_query("params", r#"{"name":"Joe Tester"}"#),
//!     )
//!     .await?;
//! assert_eq!(reply.body.as_array().map(Vec::len), Some(1));
//! # Ok(())
//! # }
//! ```

pub mod condition;
pub mod dao;
pub mod error;
pub mod filter;
pub mod guard;
pub mod identifier;
pub mod memory;
pub mod operation;
pub mod reconcile;
pub mod request;
pub mod router;
pub mod table;

pub use condition::{
    ComparisonOperator, ConditionParseError, ConditionValidator, FilterCondition, Operand,
    ParameterMap,
};
pub use dao::{RetrieveQuery, TableDao};
pub use error::{DataError, DataResult, UsageError, ValidationError, VAL_CONDITION, VAL_JSON};
pub use filter::FilterInput;
pub use guard::{CapabilityGuard, MissingOperationHook};
pub use memory::MemoryDao;
pub use operation::{Action, Operation};
pub use request::{Reply, RequestContext, Responder};
pub use router::Router;
pub use table::{ColumnDescriptor, TableDescriptor};
