//! # Filter validation
//!
//! Turns the `where` and `params` query strings into a [`RetrieveQuery`].
//! Failures are reported as validation errors on the offending field before
//! the DAO is involved. Condition errors the DAO raises afterwards are
//! re-tagged onto the `where` field with [`retag_condition_error`].

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::condition::{FilterCondition, ParameterMap};
use crate::dao::RetrieveQuery;
use crate::error::{DataError, ValidationError, VAL_CONDITION, VAL_JSON};

pub const WHERE_FIELD: &str = "where";
pub const PARAMS_FIELD: &str = "params";

/// Parsed and structurally valid filter input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterInput {
    pub condition: Option<FilterCondition>,
    pub params: ParameterMap,
}

impl FilterInput {
    /// Read `where` and `params` from a query map. Absent or blank values mean
    /// "no filter" and "no parameters".
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let condition = match present(query, WHERE_FIELD) {
            Some(raw) => Some(parse_condition(raw)?),
            None => None,
        };

        let params = match present(query, PARAMS_FIELD) {
            Some(raw) => parse_params(raw)?,
            None => ParameterMap::new(),
        };

        Ok(Self { condition, params })
    }

    pub fn into_query(self) -> RetrieveQuery {
        match self.condition {
            Some(condition) => RetrieveQuery::Filtered {
                condition,
                params: self.params,
            },
            None => RetrieveQuery::All,
        }
    }
}

fn present<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query
        .get(key)
        .map(String::as_str)
        .filter(|raw| !raw.trim().is_empty())
}

fn parse_condition(raw: &str) -> Result<FilterCondition, ValidationError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        debug!("Rejected where clause: {}", e);
        ValidationError::new(VAL_JSON, e.to_string(), WHERE_FIELD)
    })?;

    FilterCondition::from_value(&value).map_err(|e| {
        debug!("Rejected condition structure: {}", e);
        ValidationError::new(VAL_CONDITION, e.message(), WHERE_FIELD)
    })
}

fn parse_params(raw: &str) -> Result<ParameterMap, ValidationError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        debug!("Rejected params: {}", e);
        ValidationError::new(VAL_JSON, e.to_string(), PARAMS_FIELD)
    })?;

    match value {
        Value::Object(params) => Ok(params),
        _ => Err(ValidationError::new(
            VAL_JSON,
            "params must be a JSON object",
            PARAMS_FIELD,
        )),
    }
}

/// Condition errors from the DAO become validation errors on `where`, keeping
/// code and message. Everything else passes through as-is.
pub fn retag_condition_error(error: DataError) -> DataError {
    match error {
        DataError::Condition { code, message } => {
            DataError::Validation(ValidationError::new(code, message, WHERE_FIELD))
        }
        other => other,
    }
}
