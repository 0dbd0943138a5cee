use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tabula_dispatch::{
    ColumnDescriptor, DataResult, MemoryDao, Operation, RetrieveQuery, Router as TableRouter,
    TableDao, TableDescriptor,
};
use tabula_http::configure_routes;
use tower::ServiceExt;

fn groups() -> Arc<TableDescriptor> {
    Arc::new(
        TableDescriptor::new("groups", "Groups", vec![ColumnDescriptor::named("groupID")])
            .unwrap()
            .with_columns([ColumnDescriptor::named("title")]),
    )
}

fn users() -> Arc<TableDescriptor> {
    Arc::new(
        TableDescriptor::new("users", "Users", vec![ColumnDescriptor::named("userID")])
            .unwrap()
            .with_columns([
                ColumnDescriptor::named("name"),
                ColumnDescriptor::named("groupID"),
            ]),
    )
}

fn app() -> axum::Router {
    let groups_dao = MemoryDao::new(groups()).with_rows([json!({"groupID": "g1", "title": "Admins"})]);
    let users_dao = MemoryDao::new(users())
        .with_parent_key("groupID")
        .with_rows([
            json!({"userID": "1", "name": "Joe Tester", "groupID": "g1"}),
            json!({"userID": "2", "name": "Jane Doe", "groupID": "g2"}),
        ]);

    configure_routes([
        TableRouter::new(Arc::new(groups_dao), groups()),
        TableRouter::new(Arc::new(users_dao), users()).with_parent(groups()),
    ])
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_returns_created() {
    let response = app()
        .oneshot(request(
            Method::POST,
            "/users",
            Some(json!({"userID": "3", "name": "New"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["userID"], "3");
}

#[tokio::test]
async fn test_list_without_parent_scope_returns_all() {
    let response = app()
        .oneshot(request(Method::GET, "/users", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_filtered_list() {
    let uri = format!(
        "/users?where={}&params={}",
        urlencoding::encode(r#"{"$eq":{"Users.name":":name"}}"#),
        urlencoding::encode(r#"{"name":"Joe Tester"}"#)
    );

    let response = app().oneshot(request(Method::GET, &uri, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!([{"userID": "1", "name": "Joe Tester", "groupID": "g1"}])
    );
}

#[tokio::test]
async fn test_unparsable_where_is_bad_request() {
    let uri = format!("/users?where={}", urlencoding::encode("{not json"));

    let response = app().oneshot(request(Method::GET, &uri, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let body = json_body(response).await;
    assert_eq!(body["code"], "VAL_JSON");
    assert_eq!(body["field"], "where");
}

#[tokio::test]
async fn test_unfilterable_column_is_bad_request() {
    let uri = format!(
        "/users?where={}&params={}",
        urlencoding::encode(r#"{"$eq":{"Users.password":":p"}}"#),
        urlencoding::encode(r#"{"p":"x"}"#)
    );

    let response = app().oneshot(request(Method::GET, &uri, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "COLUMN_NOT_FILTERABLE");
    assert_eq!(body["field"], "where");
}

#[tokio::test]
async fn test_retrieve_by_id() {
    let response = app()
        .oneshot(request(Method::GET, "/users/2", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Jane Doe");
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let response = app()
        .oneshot(request(Method::GET, "/users/404", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_uses_route_id() {
    let response = app()
        .oneshot(request(
            Method::PUT,
            "/users/1",
            Some(json!({"userID": "ignored", "name": "Joe Renamed"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["userID"], "1");
    assert_eq!(body["name"], "Joe Renamed");
}

#[tokio::test]
async fn test_delete_echoes_criteria() {
    let response = app()
        .oneshot(request(Method::DELETE, "/users/1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"userID": "1"}));
}

#[tokio::test]
async fn test_parent_scoped_list() {
    let response = app()
        .oneshot(request(Method::GET, "/groups/g1/users", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["userID"], "1");
}

#[tokio::test]
async fn test_parent_scoped_list_rejects_filters() {
    let uri = format!(
        "/groups/g1/users?where={}&params={}",
        urlencoding::encode(r#"{"$like":{"Users.name":":n"}}"#),
        urlencoding::encode(r#"{"n":"J%"}"#)
    );

    let response = app().oneshot(request(Method::GET, &uri, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "VAL_CONDITION");
    assert_eq!(body["field"], "where");
}

#[tokio::test]
async fn test_parent_scoped_list_with_blank_filter_stays_scoped() {
    let response = app()
        .oneshot(request(Method::GET, "/groups/g1/users?where=&params=", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["userID"], "1");
}

#[tokio::test]
async fn test_unscoped_update_keeps_parent_link() {
    let app = app();

    let response = app
        .clone()
        .oneshot(request(Method::PUT, "/users/1", Some(json!({"name": "Renamed"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["groupID"], "g1");

    let response = app
        .oneshot(request(Method::GET, "/groups/g1/users", None))
        .await
        .unwrap();
    assert_eq!(
        json_body(response).await,
        json!([{"userID": "1", "name": "Renamed", "groupID": "g1"}])
    );
}

#[tokio::test]
async fn test_unscoped_create_keeps_body_parent() {
    let app = app();

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/users",
            Some(json!({"userID": "9", "groupID": "g1"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["groupID"], "g1");

    let response = app
        .oneshot(request(Method::GET, "/groups/g1/users", None))
        .await
        .unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_replace_children() {
    let response = app()
        .oneshot(request(
            Method::PUT,
            "/groups/g1/users",
            Some(json!([{"userID": "7", "name": "Solo"}])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body[0]["groupID"], "g1");
}

#[tokio::test]
async fn test_options_describes_table() {
    let response = app()
        .oneshot(request(Method::OPTIONS, "/users", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["table"]["name"], "users");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/users")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{oops"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["field"], "body");
}

struct ReadOnlyDao;

#[async_trait]
impl TableDao for ReadOnlyDao {
    fn operations(&self) -> Vec<Operation> {
        vec![Operation::Retrieve]
    }

    async fn retrieve(&self, _query: RetrieveQuery) -> DataResult<Value> {
        Ok(json!([]))
    }
}

#[tokio::test]
async fn test_missing_operation_is_not_found() {
    let app = configure_routes([TableRouter::new(Arc::new(ReadOnlyDao), users())]);

    let response = app
        .oneshot(request(Method::POST, "/users", Some(json!({"name": "x"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await["detail"],
        "Method create not available."
    );
}
