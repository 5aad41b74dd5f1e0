//! Options that shape an export, besides the schema itself.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::overrides::HeaderOverrides;

/// The encoding files are written in unless asked otherwise.
pub const DEFAULT_ENCODING: &str = "UTF8";
pub const DEFAULT_NODES_FILENAME: &str = "nodes.csv";
pub const DEFAULT_RELATIONSHIPS_FILENAME: &str = "rels.csv";

/// Whether an artifact is written to one file or to one file per entity or relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum OutputLayout {
    #[default]
    SingleFile,
    /// Files are named after the configured one, numbered from `0001`.
    MultipleFiles,
}

/// How node ids are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum MappingStrategy {
    /// One statement numbering the union of all entities ordered by `(kind, pk)`.
    ///
    /// Ids are dense, start at 1 and follow `(kind, pk)` order, so the same rows always
    /// get the same ids.
    #[default]
    GlobalOrdered,
    /// One insert per entity into a table with an auto-incrementing id.
    ///
    /// Entities are numbered one after the other in declaration order, each one
    /// contiguously by increasing primary key. Ids depend on the sequence state.
    PerEntityInsert,
}

impl MappingStrategy {
    /// Whether ids are a function of the exported rows alone.
    pub fn is_globally_ordered(self) -> bool {
        match self {
            MappingStrategy::GlobalOrdered => true,
            MappingStrategy::PerEntityInsert => false,
        }
    }

    /// The strategy that goes with a layout: exporting entities one by one also maps
    /// them one by one.
    pub fn for_layout(layout: OutputLayout) -> Self {
        match layout {
            OutputLayout::SingleFile => MappingStrategy::GlobalOrdered,
            OutputLayout::MultipleFiles => MappingStrategy::PerEntityInsert,
        }
    }
}

/// Everything that shapes an export besides the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Entity kinds to export, in any order. All of them when `None`.
    pub entities: Option<Vec<String>>,
    /// Fail on references that cannot be resolved instead of skipping them.
    pub strict: bool,
    /// Rows per entity. `Some(0)` means no limit.
    pub entity_limit: Option<u32>,
    pub nodes_filename: String,
    pub relationships_filename: String,
    pub encoding: String,
    pub layout: OutputLayout,
    pub mapping_strategy: MappingStrategy,
    pub nodes_header_overrides: HeaderOverrides,
    pub relationships_header_overrides: HeaderOverrides,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            entities: None,
            strict: true,
            entity_limit: None,
            nodes_filename: DEFAULT_NODES_FILENAME.to_string(),
            relationships_filename: DEFAULT_RELATIONSHIPS_FILENAME.to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            layout: OutputLayout::SingleFile,
            mapping_strategy: MappingStrategy::GlobalOrdered,
            nodes_header_overrides: HeaderOverrides::empty(),
            relationships_header_overrides: HeaderOverrides::empty(),
        }
    }
}

impl ExportOptions {
    /// The row limit per entity, if any.
    pub fn entity_limit(&self) -> Option<u32> {
        self.entity_limit.filter(|limit| *limit > 0)
    }
}
