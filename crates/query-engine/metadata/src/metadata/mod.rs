//! The relational schema we export as a graph, and the options that shape the export.

pub mod options;
pub mod overrides;
pub mod schema;
pub mod types;

// re-export without modules
pub use options::*;
pub use overrides::*;
pub use schema::*;
pub use types::*;

/// The discriminator column holding an entity's kind.
pub const KIND_COLUMN: &str = "kind";
/// The column holding an entity's primary key.
pub const PK_COLUMN: &str = "pk";
/// The column holding the node id a relationship starts from.
pub const START_COLUMN: &str = "start";
/// The column holding the node id a relationship ends at.
pub const END_COLUMN: &str = "end";
/// The column holding a relationship's type.
pub const TYPE_COLUMN: &str = "type";
