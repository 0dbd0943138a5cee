//! RFC 7807 problem details and the builders used to fill them in

use std::collections::BTreeMap;

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

/// A problem response: status code plus the problem+json members
#[derive(Debug, Clone)]
pub struct Problem {
    pub status_code: StatusCode,
    pub body: BTreeMap<String, Value>,
}

/// Create a new `Problem` response to send to the client.
pub fn new<S>(status_code: S) -> Problem
where
    S: Into<StatusCode>,
{
    Problem {
        status_code: status_code.into(),
        body: BTreeMap::new(),
    }
}

impl Problem {
    pub fn with_type<S>(self, value: S) -> Self
    where
        S: Into<String>,
    {
        self.with_value("type", value.into())
    }

    pub fn with_title<S>(self, value: S) -> Self
    where
        S: Into<String>,
    {
        self.with_value("title", value.into())
    }

    pub fn with_detail<S>(self, value: S) -> Self
    where
        S: Into<String>,
    {
        self.with_value("detail", value.into())
    }

    /// Insert an arbitrary member, overwriting any previous value under `key`
    pub fn with_value<V>(mut self, key: &str, value: V) -> Self
    where
        V: Into<Value>,
    {
        self.body.insert(key.to_owned(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> axum::response::Response {
        if self.body.is_empty() {
            return self.status_code.into_response();
        }

        let mut response = (self.status_code, Json(self.body)).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

/// Fluent construction of a [`Problem`] with a timestamp member
pub struct ErrorBuilder {
    status: StatusCode,
    type_: Option<String>,
    title: Option<String>,
    detail: Option<String>,
    values: BTreeMap<String, Value>,
}

impl ErrorBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            type_: None,
            title: None,
            detail: None,
            values: BTreeMap::new(),
        }
    }

    pub fn type_(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn value<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.values.insert(key.to_string(), value);
        }
        self
    }

    pub fn build(self) -> Problem {
        let mut problem =
            new(self.status).with_value("timestamp", chrono::Utc::now().to_rfc3339());

        if let Some(type_) = self.type_ {
            problem = problem.with_type(type_);
        }
        if let Some(title) = self.title {
            problem = problem.with_title(title);
        }
        if let Some(detail) = self.detail {
            problem = problem.with_detail(detail);
        }
        for (key, value) in self.values {
            problem = problem.with_value(&key, value);
        }

        problem
    }
}

pub fn bad_request() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::BAD_REQUEST)
        .type_("about:blank#bad-request")
        .title("Bad Request")
        .detail("The request was malformed or invalid")
}

pub fn not_found() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::NOT_FOUND)
        .type_("about:blank#not-found")
        .title("Resource Not Found")
        .value("error_code", "NOT_FOUND")
}

pub fn method_not_allowed() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::METHOD_NOT_ALLOWED)
        .type_("about:blank#method-not-allowed")
        .title("Method Not Allowed")
        .value("error_code", "METHOD_NOT_ALLOWED")
}

pub fn conflict() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::CONFLICT)
        .type_("about:blank#conflict")
        .title("Conflict")
        .detail("The request conflicts with the current state of the resource")
        .value("error_code", "CONFLICT")
}

pub fn service_unavailable() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::SERVICE_UNAVAILABLE)
        .type_("about:blank#service-unavailable")
        .title("Service Unavailable")
        .value("error_code", "SERVICE_UNAVAILABLE")
}

pub fn gateway_timeout() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::GATEWAY_TIMEOUT)
        .type_("about:blank#gateway-timeout")
        .title("Gateway Timeout")
        .value("error_code", "GATEWAY_TIMEOUT")
}

pub fn internal_server_error() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
        .type_("about:blank#internal-server-error")
        .title("Internal Server Error")
        .detail("An unexpected error occurred while processing your request")
        .value("error_code", "INTERNAL_SERVER_ERROR")
}
