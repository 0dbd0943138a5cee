use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations a DAO may implement. Which ones it does is a per-instance
/// capability set, checked on every call.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "create")]
    Create,
    #[serde(rename = "retrieve")]
    Retrieve,
    #[serde(rename = "retrieveByID")]
    RetrieveById,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "delete")]
    Delete,
    #[serde(rename = "replace")]
    Replace,
    #[serde(rename = "options")]
    Options,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Create,
        Operation::Retrieve,
        Operation::RetrieveById,
        Operation::Update,
        Operation::Delete,
        Operation::Replace,
        Operation::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Retrieve => "retrieve",
            Operation::RetrieveById => "retrieveByID",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Replace => "replace",
            Operation::Options => "options",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller asks the router to do. Filtered retrieval is its own action
/// but is backed by the DAO's `retrieve` operation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Action {
    Create,
    Retrieve,
    RetrieveById,
    RetrieveWhere,
    Update,
    Delete,
    Replace,
    Options,
}

impl Action {
    /// The DAO operation this action needs
    pub fn operation(&self) -> Operation {
        match self {
            Action::Create => Operation::Create,
            Action::Retrieve | Action::RetrieveWhere => Operation::Retrieve,
            Action::RetrieveById => Operation::RetrieveById,
            Action::Update => Operation::Update,
            Action::Delete => Operation::Delete,
            Action::Replace => Operation::Replace,
            Action::Options => Operation::Options,
        }
    }
}
