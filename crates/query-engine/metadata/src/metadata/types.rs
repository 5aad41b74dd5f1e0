//! Output column types.

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The type a property is exported as.
///
/// Every projected value is cast to its type, so that the members of a union agree
/// and so that numeric columns sort numerically rather than lexically.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Sequence,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    #[default]
    Text,
    Integer,
    Float,
    Boolean,
}

impl PropertyType {
    /// The database type this property is cast to.
    pub fn sql_type_name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "bigint",
            Self::Float => "double precision",
            Self::Boolean => "boolean",
        }
    }
}

/// A named output column of an export, with its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub r#type: PropertyType,
}

impl Field {
    pub fn new(name: impl Into<String>, r#type: PropertyType) -> Self {
        Field {
            name: name.into(),
            r#type,
        }
    }
}
