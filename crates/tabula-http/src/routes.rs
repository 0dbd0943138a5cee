//! HTTP routes for table routers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::Value;
use tabula_dispatch::filter::{PARAMS_FIELD, WHERE_FIELD};
use tabula_dispatch::{Action, DataError, RequestContext, Router as TableRouter};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::error::{malformed_body, scoped_filter};
use crate::problem::Problem;
use crate::responder::HttpResponder;

type SharedRouter = Arc<TableRouter>;
type Params = HashMap<String, String>;

/// Mount every table router and trace requests
pub fn configure_routes(routers: impl IntoIterator<Item = TableRouter>) -> Router {
    routers
        .into_iter()
        .fold(Router::new(), |app, router| app.merge(table_routes(router)))
        .layer(TraceLayer::new_for_http())
}

/// URL paths mounted for one table router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePaths {
    /// `/{alias}`
    pub collection: String,
    /// `/{alias}/{pk}`
    pub item: String,
    /// `/{parent alias}/{parent pk}/{alias}`, only with a parent table
    pub scoped: Option<String>,
}

impl RoutePaths {
    pub fn for_router(router: &TableRouter) -> Self {
        let table = router.table();
        let collection = format!("/{}", table.alias().to_lowercase());
        let item = format!("{}/{{{}}}", collection, table.primary_key_alias());
        let scoped = router.parent().map(|parent| {
            format!(
                "/{}/{{{}}}{}",
                parent.alias().to_lowercase(),
                parent.primary_key_alias(),
                collection
            )
        });

        Self {
            collection,
            item,
            scoped,
        }
    }
}

/// Routes for one table (plus its parent-scoped routes when it has a parent)
pub fn table_routes(router: TableRouter) -> Router {
    let paths = RoutePaths::for_router(&router);
    debug!(
        "Mounting {} at {} and {}",
        router.table().name(),
        paths.collection,
        paths.item
    );

    let mut app = Router::new()
        .route(&paths.collection, get(list).post(create).options(options))
        .route(&paths.item, get(retrieve_by_id).put(update).delete(remove));

    if let Some(scoped) = &paths.scoped {
        debug!("Mounting {} children at {}", router.table().name(), scoped);
        app = app.route(
            scoped,
            get(list_children).post(create_child).put(replace_children),
        );
    }

    app.with_state(Arc::new(router))
}

async fn list(State(router): State<SharedRouter>, Query(query): Query<Params>) -> Response {
    let action = list_action(&query);
    run(&router, action, context(Params::new(), query, Value::Null)).await
}

async fn create(
    State(router): State<SharedRouter>,
    Query(query): Query<Params>,
    body: Bytes,
) -> Response {
    match decode(&body) {
        Ok(body) => run(&router, Action::Create, context(Params::new(), query, body)).await,
        Err(problem) => problem.into_response(),
    }
}

async fn options(State(router): State<SharedRouter>, Query(query): Query<Params>) -> Response {
    run(&router, Action::Options, context(Params::new(), query, Value::Null)).await
}

async fn retrieve_by_id(
    State(router): State<SharedRouter>,
    Path(params): Path<Params>,
    Query(query): Query<Params>,
) -> Response {
    run(&router, Action::RetrieveById, context(params, query, Value::Null)).await
}

async fn update(
    State(router): State<SharedRouter>,
    Path(params): Path<Params>,
    Query(query): Query<Params>,
    body: Bytes,
) -> Response {
    match decode(&body) {
        Ok(body) => run(&router, Action::Update, context(params, query, body)).await,
        Err(problem) => problem.into_response(),
    }
}

async fn remove(
    State(router): State<SharedRouter>,
    Path(params): Path<Params>,
    Query(query): Query<Params>,
) -> Response {
    run(&router, Action::Delete, context(params, query, Value::Null)).await
}

async fn list_children(
    State(router): State<SharedRouter>,
    Path(params): Path<Params>,
    Query(query): Query<Params>,
) -> Response {
    if has_filter(&query) {
        debug!("{} rejected a filter on its parent scope", router.table().name());
        return scoped_filter(&RoutePaths::for_router(&router).collection).into_response();
    }
    run(&router, Action::Retrieve, context(params, query, Value::Null)).await
}

async fn create_child(
    State(router): State<SharedRouter>,
    Path(params): Path<Params>,
    Query(query): Query<Params>,
    body: Bytes,
) -> Response {
    match decode(&body) {
        Ok(body) => run(&router, Action::Create, context(params, query, body)).await,
        Err(problem) => problem.into_response(),
    }
}

async fn replace_children(
    State(router): State<SharedRouter>,
    Path(params): Path<Params>,
    Query(query): Query<Params>,
    body: Bytes,
) -> Response {
    match decode(&body) {
        Ok(body) => run(&router, Action::Replace, context(params, query, body)).await,
        Err(problem) => problem.into_response(),
    }
}

fn list_action(query: &Params) -> Action {
    if has_filter(query) {
        Action::RetrieveWhere
    } else {
        Action::Retrieve
    }
}

/// A non-blank `where` or `params` value
fn has_filter(query: &Params) -> bool {
    [WHERE_FIELD, PARAMS_FIELD]
        .iter()
        .filter_map(|key| query.get(*key))
        .any(|value| !value.trim().is_empty())
}

fn context(params: Params, query: Params, body: Value) -> RequestContext {
    RequestContext {
        body,
        params,
        query,
    }
}

/// Empty bodies decode to `null`
fn decode(body: &Bytes) -> Result<Value, Problem> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(malformed_body)
}

async fn run(router: &TableRouter, action: Action, ctx: RequestContext) -> Response {
    let mut responder = HttpResponder::new();
    let mut failure: Option<DataError> = None;

    let dispatched = router
        .dispatch(action, ctx, &mut responder, |e| failure = Some(e))
        .await;

    if let Err(usage) = dispatched {
        error!("{} {:?} misconfigured: {}", router.table().name(), action, usage);
        return Problem::from(usage).into_response();
    }

    match failure {
        Some(e) => {
            debug!("{} {:?} rejected: {}", router.table().name(), action, e);
            Problem::from(e).into_response()
        }
        None => responder.into_response(),
    }
}
