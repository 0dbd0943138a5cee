use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use serde_json::{Map, Value};
use tracing::debug;

use crate::dao::{RetrieveQuery, TableDao};
use crate::error::{DataError, DataResult, UsageError};
use crate::filter::{retag_condition_error, FilterInput};
use crate::guard::{CapabilityGuard, MissingOperationHook};
use crate::identifier;
use crate::operation::{Action, Operation};
use crate::reconcile::reconcile_body;
use crate::request::{Reply, RequestContext, Responder};
use crate::table::TableDescriptor;

/// Dispatches CRUD requests for one table (and optional parent) to its DAO.
///
/// Every operation runs the same pipeline: capability check, identifier
/// resolution / body reconciliation / filter validation where applicable, one
/// DAO call, then the reply or the error. A router never mutates itself after
/// construction, so clones can be shared freely between requests.
#[derive(Clone, Debug)]
pub struct Router {
    dao: Arc<dyn TableDao>,
    table: Arc<TableDescriptor>,
    parent: Option<Arc<TableDescriptor>>,
    on_missing: MissingOperationHook,
    reconcile_bodies: bool,
}

impl Router {
    pub fn new(dao: Arc<dyn TableDao>, table: Arc<TableDescriptor>) -> Self {
        Self {
            dao,
            table,
            parent: None,
            on_missing: MissingOperationHook::default(),
            reconcile_bodies: true,
        }
    }

    pub fn with_parent(mut self, parent: Arc<TableDescriptor>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_missing_operation_hook(mut self, hook: MissingOperationHook) -> Self {
        self.on_missing = hook;
        self
    }

    /// Toggle writing route identifiers into create/update bodies (on by default)
    pub fn with_body_reconciliation(mut self, enabled: bool) -> Self {
        self.reconcile_bodies = enabled;
        self
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    pub fn parent(&self) -> Option<&TableDescriptor> {
        self.parent.as_deref()
    }

    pub fn guard(&self) -> CapabilityGuard<'_> {
        CapabilityGuard::new(self.dao.as_ref())
    }

    fn ensure(&self, operation: Operation) -> DataResult<()> {
        let mut missing = None;
        self.guard()
            .verify(operation, |op| missing = Some(self.on_missing.error_for(op)));
        match missing {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn prepare_body(&self, ctx: &RequestContext, mut body: Value) -> Value {
        if self.reconcile_bodies {
            reconcile_body(&self.table, self.parent(), ctx, &mut body);
        }
        body
    }

    pub async fn create(&self, mut ctx: RequestContext) -> DataResult<Reply> {
        self.ensure(Operation::Create)?;
        debug!("Creating row in {}", self.table.name());

        let body = std::mem::take(&mut ctx.body);
        let body = self.prepare_body(&ctx, body);
        let created = self.dao.create(body).await?;
        Ok(Reply::created(created))
    }

    pub async fn retrieve(&self, ctx: RequestContext) -> DataResult<Reply> {
        self.ensure(Operation::Retrieve)?;

        let query = if self.parent.is_some() {
            RetrieveQuery::ByParent(identifier::parent_id(self.parent(), &ctx))
        } else {
            RetrieveQuery::All
        };
        debug!("Retrieving {} with {:?}", self.table.name(), query);

        let rows = self.dao.retrieve(query).await?;
        Ok(Reply::ok(rows))
    }

    pub async fn retrieve_by_id(&self, ctx: RequestContext) -> DataResult<Reply> {
        self.ensure(Operation::RetrieveById)?;

        let id = identifier::resource_id(&self.table, &ctx);
        debug!("Retrieving {} by id {:?}", self.table.name(), id);

        let row = self.dao.retrieve_by_id(id).await?;
        Ok(Reply::ok(row))
    }

    pub async fn retrieve_where(&self, ctx: RequestContext) -> DataResult<Reply> {
        self.ensure(Operation::Retrieve)?;

        let input = FilterInput::from_query(&ctx.query).map_err(DataError::Validation)?;
        debug!("Retrieving {} where {:?}", self.table.name(), input.condition);

        let rows = self
            .dao
            .retrieve(input.into_query())
            .await
            .map_err(retag_condition_error)?;
        Ok(Reply::ok(rows))
    }

    pub async fn update(&self, mut ctx: RequestContext) -> DataResult<Reply> {
        self.ensure(Operation::Update)?;
        debug!("Updating row in {}", self.table.name());

        let body = std::mem::take(&mut ctx.body);
        let body = self.prepare_body(&ctx, body);
        let updated = self.dao.update(body).await?;
        Ok(Reply::ok(updated))
    }

    pub async fn delete(&self, ctx: RequestContext) -> DataResult<Reply> {
        self.ensure(Operation::Delete)?;

        let id = identifier::resource_id(&self.table, &ctx);
        debug!("Deleting {} id {:?}", self.table.name(), id);

        let mut criteria = Map::new();
        criteria.insert(
            self.table.primary_key_alias().to_string(),
            id.map(Value::String).unwrap_or(Value::Null),
        );

        let deleted = self.dao.delete(Value::Object(criteria)).await?;
        Ok(Reply::ok(deleted))
    }

    /// Replace every child row of one parent.
    ///
    /// Fails synchronously, before any future exists, when the router has no
    /// parent table.
    pub fn replace(
        &self,
        ctx: RequestContext,
    ) -> Result<impl Future<Output = DataResult<Reply>> + Send + '_, UsageError> {
        let parent = self.parent.clone().ok_or(UsageError::ParentTableRequired)?;

        Ok(async move {
            self.ensure(Operation::Replace)?;

            let parent_id = identifier::parent_id(Some(&parent), &ctx);
            debug!(
                "Replacing {} rows of {} {:?}",
                self.table.name(),
                parent.name(),
                parent_id
            );

            let replaced = self
                .dao
                .replace(parent.name(), parent_id, ctx.body)
                .await?;
            Ok(Reply::created(replaced))
        })
    }

    pub async fn options(&self, _ctx: RequestContext) -> DataResult<Reply> {
        self.ensure(Operation::Options)?;

        let options = self.dao.options().await?;
        Ok(Reply::ok(options))
    }

    /// Callback form of the operations above: on success the responder gets
    /// `status(code)` (when not 200) then `json(value)`; on failure the error
    /// channel is called once. Exactly one of the two happens.
    ///
    /// The only error returned directly is a wiring mistake (replace without
    /// a parent table); in that case neither callback runs.
    pub async fn dispatch<R, E>(
        &self,
        action: Action,
        ctx: RequestContext,
        responder: &mut R,
        error_channel: E,
    ) -> Result<(), UsageError>
    where
        R: Responder + Send,
        E: FnOnce(DataError) + Send,
    {
        let result = match action {
            Action::Create => self.create(ctx).await,
            Action::Retrieve => self.retrieve(ctx).await,
            Action::RetrieveById => self.retrieve_by_id(ctx).await,
            Action::RetrieveWhere => self.retrieve_where(ctx).await,
            Action::Update => self.update(ctx).await,
            Action::Delete => self.delete(ctx).await,
            Action::Replace => self.replace(ctx)?.await,
            Action::Options => self.options(ctx).await,
        };

        match result {
            Ok(reply) if reply.status == StatusCode::OK => responder.json(reply.body),
            Ok(reply) => responder.status(reply.status).json(reply.body),
            Err(error) => {
                debug!("{} {:?} failed: {}", self.table.name(), action, error);
                error_channel(error)
            }
        }

        Ok(())
    }
}
