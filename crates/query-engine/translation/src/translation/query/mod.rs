//! Translate a schema into the batch of statements exporting it as a graph.

pub mod copy;
pub mod fields;
pub mod fragments;
pub mod header_overrides;
pub mod mapping;
pub mod nodes;
pub mod relationships;
pub mod values;

use query_engine_metadata::metadata::{Field, Schema};
use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::Env;
pub use query_engine_metadata::metadata::{ExportOptions, MappingStrategy, OutputLayout};

/// Compiles one export of a schema.
///
/// Entity selections, relation endpoints and property names are checked when the
/// exporter is created.
#[derive(Debug)]
pub struct Exporter<'a> {
    env: Env<'a>,
    options: &'a ExportOptions,
}

impl<'a> Exporter<'a> {
    pub fn new(schema: &'a Schema, options: &'a ExportOptions) -> Result<Exporter<'a>, Error> {
        let env = Env::new(schema, options.entities.as_deref(), options.strict)?;
        Ok(Exporter { env, options })
    }

    /// The columns of the node export, in order.
    pub fn all_properties(&self) -> Vec<Field> {
        fields::fetch_all_fields(&self.env)
    }

    /// The columns of the relationship export, in order.
    pub fn all_relations_properties(&self) -> Vec<Field> {
        fields::fetch_all_relations_properties(&self.env)
    }

    pub fn create_mapping_table_query(&self) -> Result<Vec<sql::ast::Statement>, Error> {
        mapping::create_mapping_table(
            &self.env,
            self.options.mapping_strategy,
            self.options.entity_limit(),
        )
    }

    pub fn create_nodes_query(&self) -> Result<Vec<sql::ast::Statement>, Error> {
        nodes::create_nodes_query(&self.env, self.options)
    }

    pub fn create_relationships_query(&self) -> Result<Vec<sql::ast::Statement>, Error> {
        relationships::create_relationships_query(&self.env, self.options)
    }

    /// Compile the whole export. Nothing is returned unless every part compiles.
    pub fn plan(&self) -> Result<ExportPlan, Error> {
        Ok(ExportPlan {
            mapping: self.create_mapping_table_query()?,
            nodes: self.create_nodes_query()?,
            relationships: self.create_relationships_query()?,
        })
    }
}

/// The statements of an export, by artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    pub mapping: Vec<sql::ast::Statement>,
    pub nodes: Vec<sql::ast::Statement>,
    pub relationships: Vec<sql::ast::Statement>,
}

impl ExportPlan {
    /// All statements in the order they must run: the mapping table first, since the
    /// relationship export reads it.
    pub fn script(self) -> sql::ast::Script {
        sql::ast::Script(
            self.mapping
                .into_iter()
                .chain(self.nodes)
                .chain(self.relationships)
                .collect(),
        )
    }

    pub fn to_sql(&self) -> String {
        sql::convert::script_to_sql(&self.clone().script()).sql
    }
}

/// Compile the export of `schema`.
pub fn translate(schema: &Schema, options: &ExportOptions) -> Result<ExportPlan, Error> {
    let plan = Exporter::new(schema, options)?.plan()?;
    tracing::info!(
        mapping = plan.mapping.len(),
        nodes = plan.nodes.len(),
        relationships = plan.relationships.len(),
        "export compiled"
    );
    Ok(plan)
}
