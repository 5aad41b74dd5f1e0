//! Errors for export translation.

use thiserror::Error;

/// A type for translation errors.
///
/// These are configuration errors: they are raised before any SQL is produced, and no
/// partial output should be executed when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Entity '{0}' is not declared in the schema.")]
    EntityNotFound(String),
    #[error("Relation '{relation}' references entity '{entity}', which is not declared in the schema.")]
    RelationEntityNotFound { relation: String, entity: String },
    #[error("Column '{0}' is not provided by any exported entity or relation.")]
    ColumnNotFound(String),
    #[error("'{name}' on '{owner}' clashes with a column every export provides.")]
    ReservedPropertyName { owner: String, name: String },
}
