//! Caller-requested changes to the header of an exported file.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Renames and merges of output columns.
///
/// A rename is keyed by a single column name; renaming to `None` omits the column.
/// A merge is keyed by the list of columns it combines and adds one output column.
/// Columns that are merged are still exported on their own unless they are also
/// renamed to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderOverrides {
    pub renames: IndexMap<String, Option<String>>,
    pub merges: IndexMap<Vec<String>, Merge>,
}

impl HeaderOverrides {
    pub fn empty() -> Self {
        HeaderOverrides::default()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.merges.is_empty()
    }

    /// Export `column` under the header `name`.
    pub fn rename(mut self, column: impl Into<String>, name: impl Into<String>) -> Self {
        self.renames.insert(column.into(), Some(name.into()));
        self
    }

    /// Leave `column` out of the export.
    pub fn omit(mut self, column: impl Into<String>) -> Self {
        self.renames.insert(column.into(), None);
        self
    }

    /// Export `function(columns..)` under the header `name`.
    pub fn merge(
        mut self,
        columns: Vec<String>,
        function: MergeFunction,
        name: impl Into<String>,
    ) -> Self {
        self.merges.insert(
            columns,
            Merge {
                function,
                name: name.into(),
            },
        );
        self
    }
}

/// The output side of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    pub function: MergeFunction,
    pub name: String,
}

/// How merged columns are combined. Each column is cast to text first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "function", rename_all = "camelCase")]
pub enum MergeFunction {
    /// The first non-null column.
    Coalesce,
    /// The columns concatenated, optionally with a separator between them.
    Concat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        separator: Option<String>,
    },
    /// Any SQL function taking the columns as arguments.
    Custom { name: String },
}
