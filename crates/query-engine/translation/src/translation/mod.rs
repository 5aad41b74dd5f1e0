//! Compile a schema into the SQL statements that export it as a graph.

pub mod error;
pub mod helpers;
pub mod query;
