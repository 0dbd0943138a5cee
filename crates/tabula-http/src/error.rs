//! Mapping of dispatch errors onto problem responses

use tabula_dispatch::filter::WHERE_FIELD;
use tabula_dispatch::{DataError, UsageError};

use crate::problem::{self, Problem};

impl From<DataError> for Problem {
    fn from(error: DataError) -> Self {
        match error {
            DataError::NotFound(msg) => problem::not_found().detail(msg).build(),

            DataError::Validation(v) => problem::bad_request()
                .title("Validation Failed")
                .detail(v.message)
                .value("code", v.code)
                .value("field", v.field)
                .build(),

            DataError::Condition { code, message } => problem::bad_request()
                .title("Invalid Condition")
                .detail(message)
                .value("code", code)
                .build(),

            DataError::Conflict(msg) => problem::conflict().detail(msg).build(),

            DataError::InvalidQuery(msg) => problem::bad_request()
                .title("Invalid Query")
                .detail(msg)
                .build(),

            DataError::OperationNotSupported(op) => problem::method_not_allowed()
                .detail(format!("Operation {} is not supported", op))
                .build(),

            DataError::QueryTimeout(ms) => problem::gateway_timeout()
                .detail(format!("Query timed out after {}ms", ms))
                .build(),

            DataError::ConnectionFailed(msg) => {
                problem::service_unavailable().detail(msg).build()
            }

            DataError::QueryFailed(msg) => problem::internal_server_error()
                .title("Query Failed")
                .detail(msg)
                .build(),

            DataError::Internal(msg) => problem::internal_server_error().detail(msg).build(),
        }
    }
}

impl From<UsageError> for Problem {
    fn from(error: UsageError) -> Self {
        problem::internal_server_error()
            .title("Router Misconfigured")
            .detail(error.to_string())
            .build()
    }
}

/// Body that could not be decoded as JSON
pub(crate) fn malformed_body(error: serde_json::Error) -> Problem {
    problem::bad_request()
        .title("Malformed Body")
        .detail(error.to_string())
        .value("code", tabula_dispatch::VAL_JSON)
        .value("field", "body")
        .build()
}

/// `where`/`params` sent to a parent-scoped list; filtering is only offered on
/// the unscoped collection
pub(crate) fn scoped_filter(collection: &str) -> Problem {
    problem::bad_request()
        .title("Validation Failed")
        .detail(format!(
            "Filters are not available on parent-scoped routes; use {}",
            collection
        ))
        .value("code", tabula_dispatch::VAL_CONDITION)
        .value("field", WHERE_FIELD)
        .build()
}
