//! axum adapter for table routers.
//!
//! [`configure_routes`] mounts one set of REST routes per table; errors leave
//! as `application/problem+json` responses.

mod error;
pub mod problem;
pub mod responder;
pub mod routes;

pub use problem::{ErrorBuilder, Problem};
pub use responder::HttpResponder;
pub use routes::{configure_routes, table_routes, RoutePaths};
