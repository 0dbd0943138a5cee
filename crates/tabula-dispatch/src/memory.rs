//! In-memory DAO.
//!
//! Rows live in a `Vec` behind a tokio `RwLock`, keyed by column alias. Useful
//! for tests, demos and fixtures; it implements every operation and enforces
//! the same filter rules a SQL-backed DAO would.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::condition::{
    ComparisonOperator, ConditionValidator, FilterCondition, Operand, ParameterMap,
};
use crate::dao::{RetrieveQuery, TableDao};
use crate::error::{DataError, DataResult};
use crate::operation::Operation;
use crate::table::TableDescriptor;

type Row = Map<String, Value>;

pub struct MemoryDao {
    table: Arc<TableDescriptor>,
    parent_key: Option<String>,
    operations: Vec<Operation>,
    validator: ConditionValidator,
    rows: RwLock<Vec<Row>>,
}

impl MemoryDao {
    pub fn new(table: Arc<TableDescriptor>) -> Self {
        let validator = ConditionValidator::new(table.filterable_columns());
        Self {
            table,
            parent_key: None,
            operations: Operation::ALL.to_vec(),
            validator,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Column (alias) in this table that holds the parent row's identifier
    pub fn with_parent_key(mut self, alias: impl Into<String>) -> Self {
        self.parent_key = Some(alias.into());
        self
    }

    /// Restrict the advertised operations; the rest report as missing
    pub fn with_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations = operations.into_iter().collect();
        self
    }

    /// Seed rows. Non-object values are skipped.
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Value>) -> Self {
        let seeded = self.rows.get_mut();
        for row in rows {
            if let Value::Object(row) = row {
                seeded.push(row);
            }
        }
        self
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn pk(&self) -> &str {
        self.table.primary_key_alias()
    }

    fn row_id(&self, row: &Row) -> Option<String> {
        row.get(self.pk()).and_then(key_of)
    }

    fn require_parent_key(&self) -> DataResult<&str> {
        self.parent_key.as_deref().ok_or_else(|| {
            DataError::InvalidQuery(format!("{} has no parent key", self.table.name()))
        })
    }

    fn not_found(&self, id: Option<&str>) -> DataError {
        DataError::not_found(format!(
            "{} {} not found",
            self.table.name(),
            id.unwrap_or("<none>")
        ))
    }

    /// Give the row an identifier when it has none
    fn assign_id(&self, row: &mut Row) {
        let missing = row.get(self.pk()).map_or(true, Value::is_null);
        if missing {
            row.insert(self.pk().to_string(), Value::String(Uuid::new_v4().to_string()));
        }
    }

    fn evaluate(&self, condition: &FilterCondition, row: &Row, params: &ParameterMap) -> bool {
        match condition {
            FilterCondition::And(children) => children.iter().all(|c| self.evaluate(c, row, params)),
            FilterCondition::Or(children) => children.iter().any(|c| self.evaluate(c, row, params)),
            FilterCondition::Comparison {
                operator,
                column,
                operand,
            } => {
                let left = self.column_value(column, row);
                let right = self.operand_value(operand, row, params);
                compare(*operator, &left, &right)
            }
            FilterCondition::In {
                negated,
                column,
                operands,
            } => {
                let left = self.column_value(column, row);
                let found = operands
                    .iter()
                    .any(|operand| loosely_equal(&left, &self.operand_value(operand, row, params)));
                found != *negated
            }
            FilterCondition::Null {
                negated,
                column,
                operand,
            } => {
                let left = self.column_value(column, row);
                let right = operand
                    .as_ref()
                    .map(|operand| self.operand_value(operand, row, params))
                    .unwrap_or(Value::Null);
                let is = if right.is_null() {
                    left.is_null()
                } else {
                    loosely_equal(&left, &right)
                };
                is != *negated
            }
        }
    }

    fn column_value(&self, qualified: &str, row: &Row) -> Value {
        self.table
            .column_by_qualified(qualified)
            .and_then(|column| row.get(&column.alias))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn operand_value(&self, operand: &Operand, row: &Row, params: &ParameterMap) -> Value {
        match operand {
            Operand::Parameter(name) => params.get(name).cloned().unwrap_or(Value::Null),
            Operand::Column(column) => self.column_value(column, row),
        }
    }
}

#[async_trait]
impl TableDao for MemoryDao {
    fn operations(&self) -> Vec<Operation> {
        self.operations.clone()
    }

    async fn create(&self, body: Value) -> DataResult<Value> {
        let mut row = into_row(body)?;
        self.assign_id(&mut row);
        let id = self.row_id(&row);

        let mut rows = self.rows.write().await;
        if rows.iter().any(|existing| self.row_id(existing) == id) {
            return Err(DataError::Conflict(format!(
                "{} {} already exists",
                self.table.name(),
                id.unwrap_or_default()
            )));
        }

        rows.push(row.clone());
        debug!("{} now holds {} rows", self.table.name(), rows.len());
        Ok(Value::Object(row))
    }

    async fn retrieve(&self, query: RetrieveQuery) -> DataResult<Value> {
        let rows = self.rows.read().await;

        let selected: Vec<Value> = match query {
            RetrieveQuery::All => rows.iter().cloned().map(Value::Object).collect(),
            RetrieveQuery::ByParent(parent_id) => {
                let parent_key = self.require_parent_key()?;
                rows.iter()
                    .filter(|row| row.get(parent_key).and_then(key_of) == parent_id)
                    .cloned()
                    .map(Value::Object)
                    .collect()
            }
            RetrieveQuery::Filtered { condition, params } => {
                self.validator.validate(&condition, &params)?;
                rows.iter()
                    .filter(|row| self.evaluate(&condition, row, &params))
                    .cloned()
                    .map(Value::Object)
                    .collect()
            }
        };

        Ok(Value::Array(selected))
    }

    async fn retrieve_by_id(&self, id: Option<String>) -> DataResult<Value> {
        let rows = self.rows.read().await;
        rows.iter()
            .find(|row| id.is_some() && self.row_id(row) == id)
            .cloned()
            .map(Value::Object)
            .ok_or_else(|| self.not_found(id.as_deref()))
    }

    async fn update(&self, body: Value) -> DataResult<Value> {
        let changes = into_row(body)?;
        let id = changes.get(self.pk()).and_then(key_of);

        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| id.is_some() && row.get(self.pk()).and_then(key_of) == id)
            .ok_or_else(|| self.not_found(id.as_deref()))?;

        for (key, value) in changes {
            row.insert(key, value);
        }
        Ok(Value::Object(row.clone()))
    }

    async fn delete(&self, criteria: Value) -> DataResult<Value> {
        let id = criteria.get(self.pk()).and_then(key_of);

        let mut rows = self.rows.write().await;
        let index = rows
            .iter()
            .position(|row| id.is_some() && self.row_id(row) == id)
            .ok_or_else(|| self.not_found(id.as_deref()))?;

        rows.remove(index);
        Ok(criteria)
    }

    async fn replace(
        &self,
        parent_table: &str,
        parent_id: Option<String>,
        body: Value,
    ) -> DataResult<Value> {
        let parent_key = self.require_parent_key()?.to_string();
        let Value::Array(items) = body else {
            return Err(DataError::InvalidQuery(format!(
                "Replacing {} of {} requires an array body",
                self.table.name(),
                parent_table
            )));
        };

        let parent_value = parent_id.clone().map(Value::String).unwrap_or(Value::Null);
        let mut replacements = Vec::with_capacity(items.len());
        for item in items {
            let mut row = into_row(item)?;
            row.insert(parent_key.clone(), parent_value.clone());
            self.assign_id(&mut row);
            replacements.push(row);
        }

        let mut rows = self.rows.write().await;
        rows.retain(|row| row.get(&parent_key).and_then(key_of) != parent_id);
        rows.extend(replacements.iter().cloned());
        debug!(
            "Replaced {} rows of {} under {} {:?}",
            replacements.len(),
            self.table.name(),
            parent_table,
            parent_id
        );

        Ok(Value::Array(replacements.into_iter().map(Value::Object).collect()))
    }

    async fn options(&self) -> DataResult<Value> {
        let filterable: Vec<String> = self.table.filterable_columns().collect();
        Ok(json!({
            "table": self.table.as_ref(),
            "filterable": filterable,
            "operations": self.operations(),
        }))
    }
}

fn into_row(value: Value) -> DataResult<Row> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(DataError::InvalidQuery(format!(
            "Expected a JSON object, got {}",
            other
        ))),
    }
}

/// Identifier form of a scalar value
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            ordering(a, b) == Some(Ordering::Equal)
        }
        _ => a == b,
    }
}

fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => as_f64(a)?.partial_cmp(&as_f64(b)?),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn compare(operator: ComparisonOperator, left: &Value, right: &Value) -> bool {
    if left.is_null() || right.is_null() {
        // SQL semantics: comparisons with NULL are never true
        return false;
    }

    match operator {
        ComparisonOperator::Eq => loosely_equal(left, right),
        ComparisonOperator::Neq => !loosely_equal(left, right),
        ComparisonOperator::Lt => ordering(left, right) == Some(Ordering::Less),
        ComparisonOperator::Lte => matches!(
            ordering(left, right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ComparisonOperator::Gt => ordering(left, right) == Some(Ordering::Greater),
        ComparisonOperator::Gte => matches!(
            ordering(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        ComparisonOperator::Like | ComparisonOperator::NotLike => {
            let matched = match (left.as_str(), right.as_str()) {
                (Some(value), Some(pattern)) => like(
                    &value.chars().collect::<Vec<_>>(),
                    &pattern.chars().collect::<Vec<_>>(),
                ),
                _ => false,
            };
            matched == (operator == ComparisonOperator::Like)
        }
    }
}

/// SQL LIKE: `%` matches any run, `_` one character.
///
/// Greedy scan that backs up to the last `%` on a mismatch, so the cost stays
/// within `value.len() * pattern.len()` steps.
fn like(value: &[char], pattern: &[char]) -> bool {
    let (mut v, mut p) = (0, 0);
    // (pattern index after the last `%`, value index it was tried at)
    let mut restart: Option<(usize, usize)> = None;

    while v < value.len() {
        match pattern.get(p) {
            Some('%') => {
                p += 1;
                restart = Some((p, v));
            }
            Some('_') => {
                p += 1;
                v += 1;
            }
            Some(c) if *c == value[v] => {
                p += 1;
                v += 1;
            }
            _ => match restart {
                Some((after_wildcard, tried_at)) => {
                    p = after_wildcard;
                    v = tried_at + 1;
                    restart = Some((after_wildcard, v));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}
