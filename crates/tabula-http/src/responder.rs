use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tabula_dispatch::Responder;

/// Collects the status and body the router settles on, then turns them into
/// an axum response
#[derive(Debug, Clone)]
pub struct HttpResponder {
    status: StatusCode,
    body: Option<Value>,
}

impl HttpResponder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for HttpResponder {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            body: None,
        }
    }
}

impl Responder for HttpResponder {
    fn status(&mut self, code: StatusCode) -> &mut Self {
        self.status = code;
        self
    }

    fn json(&mut self, value: Value) {
        self.body = Some(value);
    }
}

impl IntoResponse for HttpResponder {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_then_json() {
        let mut responder = HttpResponder::new();
        responder.status(StatusCode::CREATED).json(json!({"id": 1}));

        let response = responder.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[test]
    fn test_without_json_is_empty_response() {
        let response = HttpResponder::new().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(axum::http::header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_defaults_to_ok() {
        let mut responder = HttpResponder::new();
        responder.json(json!([]));
        assert_eq!(responder.into_response().status(), StatusCode::OK);
    }
}
