use std::collections::HashMap;

use http::StatusCode;
use serde_json::Value;

/// Everything the router reads from one inbound request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub body: Value,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// Settled result of a successful operation
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn created(body: Value) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
        }
    }
}

/// Response side of the callback contract.
///
/// `status` returns the responder so calls chain as
/// `responder.status(StatusCode::CREATED).json(value)`.
pub trait Responder {
    fn status(&mut self, code: StatusCode) -> &mut Self;

    /// Serialize `value` and complete the call
    fn json(&mut self, value: Value);
}
