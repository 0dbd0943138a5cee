//! # Filter conditions
//!
//! Typed form of the JSON condition trees accepted by filtered retrieval:
//!
//! ```json
//! {"$and": [
//!     {"$eq": {"Users.name": ":name"}},
//!     {"$in": {"Users.id": [":a", ":b"]}},
//!     {"$is": {"Users.email": null}}
//! ]}
//! ```
//!
//! Parsing only checks structure. Whether a column may be filtered on and
//! whether every placeholder has a value is decided by the DAO, which can use
//! [`ConditionValidator`] for it.

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::DataError;

/// Placeholder name to literal value
pub type ParameterMap = Map<String, Value>;

/// Condition code for a column outside the filterable set
pub const COLUMN_NOT_FILTERABLE: &str = "COLUMN_NOT_FILTERABLE";

/// Condition code for a placeholder without a parameter value
pub const MISSING_PARAMETER: &str = "MISSING_PARAMETER";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ComparisonOperator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl ComparisonOperator {
    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "$eq" => ComparisonOperator::Eq,
            "$neq" => ComparisonOperator::Neq,
            "$lt" => ComparisonOperator::Lt,
            "$lte" => ComparisonOperator::Lte,
            "$gt" => ComparisonOperator::Gt,
            "$gte" => ComparisonOperator::Gte,
            "$like" => ComparisonOperator::Like,
            "$notLike" => ComparisonOperator::NotLike,
            _ => return None,
        })
    }
}

/// Right-hand side of a leaf
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Operand {
    /// `:name`, resolved from the parameter map (stored without the colon)
    Parameter(String),
    /// Another qualified column
    Column(String),
}

impl Operand {
    fn parse(raw: &str) -> Result<Self, ConditionParseError> {
        if let Some(name) = raw.strip_prefix(':') {
            if name.is_empty() {
                return Err(ConditionParseError::new("placeholder name is empty"));
            }
            return Ok(Operand::Parameter(name.to_string()));
        }
        if raw.is_empty() {
            return Err(ConditionParseError::new("operand is empty"));
        }
        Ok(Operand::Column(raw.to_string()))
    }
}

/// A parsed filter condition tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    And(Vec<FilterCondition>),
    Or(Vec<FilterCondition>),
    Comparison {
        operator: ComparisonOperator,
        column: String,
        operand: Operand,
    },
    In {
        negated: bool,
        column: String,
        operands: Vec<Operand>,
    },
    Null {
        negated: bool,
        column: String,
        /// `None` for a literal `null`
        operand: Option<Operand>,
    },
}

/// Structural problem in a condition tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConditionParseError {
    message: String,
}

impl ConditionParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl FilterCondition {
    /// Build a condition from decoded JSON
    pub fn from_value(value: &Value) -> Result<Self, ConditionParseError> {
        let (tag, body) = single_entry(value, "condition")?;

        match tag.as_str() {
            "$and" | "$or" => {
                let items = body.as_array().ok_or_else(|| {
                    ConditionParseError::new(format!("{} expects an array of conditions", tag))
                })?;
                if items.is_empty() {
                    return Err(ConditionParseError::new(format!(
                        "{} expects at least one condition",
                        tag
                    )));
                }
                let children = items
                    .iter()
                    .map(FilterCondition::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(if tag == "$and" {
                    FilterCondition::And(children)
                } else {
                    FilterCondition::Or(children)
                })
            }
            "$in" | "$notIn" => {
                let (column, operand) = single_entry(body, tag)?;
                let items = operand.as_array().ok_or_else(|| {
                    ConditionParseError::new(format!("{} expects an array of parameters", tag))
                })?;
                if items.is_empty() {
                    return Err(ConditionParseError::new(format!(
                        "{} expects at least one parameter",
                        tag
                    )));
                }
                let operands = items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .ok_or_else(|| {
                                ConditionParseError::new(format!("{} operands must be strings", tag))
                            })
                            .and_then(Operand::parse)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FilterCondition::In {
                    negated: tag == "$notIn",
                    column: column.clone(),
                    operands,
                })
            }
            "$is" | "$isnt" => {
                let (column, operand) = single_entry(body, tag)?;
                let operand = match operand {
                    Value::Null => None,
                    Value::String(raw) => match Operand::parse(raw)? {
                        parameter @ Operand::Parameter(_) => Some(parameter),
                        Operand::Column(_) => {
                            return Err(ConditionParseError::new(format!(
                                "{} expects null or a parameter",
                                tag
                            )))
                        }
                    },
                    _ => {
                        return Err(ConditionParseError::new(format!(
                            "{} expects null or a parameter",
                            tag
                        )))
                    }
                };
                Ok(FilterCondition::Null {
                    negated: tag == "$isnt",
                    column: column.clone(),
                    operand,
                })
            }
            other => {
                let operator = ComparisonOperator::from_tag(other).ok_or_else(|| {
                    ConditionParseError::new(format!("Unknown operator {}", other))
                })?;
                let (column, operand) = single_entry(body, other)?;
                let raw = operand.as_str().ok_or_else(|| {
                    ConditionParseError::new(format!(
                        "{} expects a parameter or column operand",
                        other
                    ))
                })?;
                Ok(FilterCondition::Comparison {
                    operator,
                    column: column.clone(),
                    operand: Operand::parse(raw)?,
                })
            }
        }
    }

    /// Columns referenced anywhere in the tree, in order of appearance,
    /// including column operands
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(&mut |leaf_column, operands| {
            out.push(leaf_column);
            for operand in operands {
                if let Operand::Column(column) = operand {
                    out.push(column.as_str());
                }
            }
        });
        out
    }

    /// Placeholder names referenced anywhere in the tree, in order of appearance
    pub fn placeholders(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(&mut |_, operands| {
            for operand in operands {
                if let Operand::Parameter(name) = operand {
                    out.push(name.as_str());
                }
            }
        });
        out
    }

    fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a str, Vec<&'a Operand>)) {
        match self {
            FilterCondition::And(children) | FilterCondition::Or(children) => {
                for child in children {
                    child.walk(visit);
                }
            }
            FilterCondition::Comparison {
                column, operand, ..
            } => visit(column.as_str(), vec![operand]),
            FilterCondition::In {
                column, operands, ..
            } => visit(column.as_str(), operands.iter().collect()),
            FilterCondition::Null {
                column, operand, ..
            } => visit(column.as_str(), operand.iter().collect()),
        }
    }
}

fn single_entry<'a>(
    value: &'a Value,
    context: &str,
) -> Result<(&'a String, &'a Value), ConditionParseError> {
    let object = value
        .as_object()
        .ok_or_else(|| ConditionParseError::new(format!("{} must be an object", context)))?;
    let mut entries = object.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(ConditionParseError::new(format!(
            "{} must have exactly one key",
            context
        ))),
    }
}

/// Semantic checks for a condition against a table's filterable columns and a
/// parameter map. Meant to be called by DAO implementations.
#[derive(Debug, Clone)]
pub struct ConditionValidator {
    filterable: HashSet<String>,
}

impl ConditionValidator {
    pub fn new(filterable: impl IntoIterator<Item = String>) -> Self {
        Self {
            filterable: filterable.into_iter().collect(),
        }
    }

    pub fn validate(
        &self,
        condition: &FilterCondition,
        params: &ParameterMap,
    ) -> Result<(), DataError> {
        if let Some(column) = condition
            .columns()
            .into_iter()
            .find(|column| !self.filterable.contains(*column))
        {
            return Err(DataError::condition(
                COLUMN_NOT_FILTERABLE,
                format!("The column \"{}\" is not available for filtering.", column),
            ));
        }

        if let Some(name) = condition
            .placeholders()
            .into_iter()
            .find(|name| !params.contains_key(*name))
        {
            return Err(DataError::condition(
                MISSING_PARAMETER,
                format!("Replacement value for parameter \"{}\" not present.", name),
            ));
        }

        Ok(())
    }
}
