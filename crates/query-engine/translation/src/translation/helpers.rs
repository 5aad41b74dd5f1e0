//! Helpers for processing the schema and building SQL.

use indexmap::IndexMap;

use crate::translation::error::Error;
use query_engine_metadata::metadata::{
    self, Entity, ForeignColumn, Relation, Schema, KIND_COLUMN, PK_COLUMN,
};
use query_engine_sql::sql;

/// Static information about an export: the schema, the entities being exported and
/// how strictly references are resolved.
#[derive(Debug)]
pub struct Env<'a> {
    schema: &'a Schema,
    /// Exported entities, in declaration order.
    entities: Vec<(&'a str, &'a Entity)>,
    strict: bool,
}

impl<'a> Env<'a> {
    /// Create a new Env over `schema`, exporting the entities named in `selection`
    /// (all of them when `None`).
    ///
    /// In strict mode, every name that cannot be resolved is an error. Otherwise it is
    /// logged and skipped.
    pub fn new(
        schema: &'a Schema,
        selection: Option<&[String]>,
        strict: bool,
    ) -> Result<Env<'a>, Error> {
        if let Some(selection) = selection {
            for kind in selection {
                if !schema.entities.contains_key(kind) {
                    if strict {
                        return Err(Error::EntityNotFound(kind.clone()));
                    }
                    tracing::warn!(entity = kind.as_str(), "skipping undeclared entity");
                }
            }
        }

        let entities = schema
            .entities
            .iter()
            .filter(|(kind, _)| selection.map_or(true, |selection| selection.contains(kind)))
            .map(|(kind, entity)| (kind.as_str(), entity))
            .collect();

        let env = Env {
            schema,
            entities,
            strict,
        };
        env.check_references()?;
        Ok(env)
    }

    /// Check relation endpoints and property names up front, so that failures happen
    /// before any query is built.
    fn check_references(&self) -> Result<(), Error> {
        for (kind, entity) in &self.entities {
            for name in entity.properties.keys() {
                if name == KIND_COLUMN || name == PK_COLUMN {
                    self.reject_or_warn(Error::ReservedPropertyName {
                        owner: (*kind).to_string(),
                        name: name.clone(),
                    })?;
                }
            }
        }
        for relation in &self.schema.relations {
            for entity in relation
                .start
                .entities()
                .iter()
                .chain(relation.end.entities())
            {
                if !self.is_declared(entity) {
                    self.reject_or_warn(Error::RelationEntityNotFound {
                        relation: relation.rel_type.clone(),
                        entity: entity.clone(),
                    })?;
                }
            }
            for name in relation.properties.keys() {
                if is_fixed_relationship_column(name) {
                    self.reject_or_warn(Error::ReservedPropertyName {
                        owner: relation.rel_type.clone(),
                        name: name.clone(),
                    })?;
                }
            }
        }
        Ok(())
    }

    fn reject_or_warn(&self, error: Error) -> Result<(), Error> {
        if self.strict {
            Err(error)
        } else {
            tracing::warn!("{error} Skipping it.");
            Ok(())
        }
    }

    /// The exported entities and their kinds, in declaration order.
    pub fn entities(&self) -> &[(&'a str, &'a Entity)] {
        &self.entities
    }

    pub fn relations(&self) -> &'a [Relation] {
        &self.schema.relations
    }

    pub fn is_declared(&self, kind: &str) -> bool {
        self.schema.entities.contains_key(kind)
    }

    pub fn is_exported(&self, kind: &str) -> bool {
        self.entities.iter().any(|(exported, _)| *exported == kind)
    }

    pub fn strict(&self) -> bool {
        self.strict
    }
}

/// Whether `name` is one of the columns every relationship export starts with.
pub fn is_fixed_relationship_column(name: &str) -> bool {
    name == metadata::START_COLUMN || name == metadata::END_COLUMN || name == metadata::TYPE_COLUMN
}

/// Mutable state while building the query for one entity or relation:
/// the joins we need, and a counter to give each joined table a unique alias.
#[derive(Debug, Default)]
pub struct State {
    unique_index: u64,
    joins: Vec<sql::ast::Join>,
    foreign_tables: IndexMap<ForeignTableKey, sql::ast::TableAlias>,
}

/// Foreign columns reached through the same key share a join.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ForeignTableKey {
    schema: Option<String>,
    table: String,
    via: String,
    key: String,
}

impl State {
    pub fn new() -> State {
        State::default()
    }

    /// Create a table alias with a unique suffix.
    pub fn make_table_alias(&mut self, name: &str) -> sql::ast::TableAlias {
        self.unique_index += 1;
        sql::ast::TableAlias {
            unique_index: Some(self.unique_index),
            name: name.to_string(),
        }
    }

    /// Add a join to the query being built.
    pub fn push_join(&mut self, join: sql::ast::Join) {
        self.joins.push(join);
    }

    /// The alias of the table holding `foreign_column`, joined from `owner`.
    /// The first request for a table and key adds a LEFT JOIN for it.
    pub fn foreign_table_alias(
        &mut self,
        owner: &sql::ast::TableAlias,
        foreign_column: &ForeignColumn,
    ) -> sql::ast::TableAlias {
        let key = ForeignTableKey {
            schema: foreign_column.schema.clone(),
            table: foreign_column.table.clone(),
            via: foreign_column.via.clone(),
            key: foreign_column.key.clone(),
        };
        if let Some(alias) = self.foreign_tables.get(&key) {
            return alias.clone();
        }

        let alias = self.make_table_alias(&foreign_column.table);
        self.joins.push(sql::ast::Join::LeftOuterJoin(sql::ast::TableJoin {
            reference: sql::helpers::make_db_table(
                foreign_column.schema.as_deref(),
                &foreign_column.table,
            ),
            alias: alias.clone(),
            on: sql::helpers::equals(
                sql::helpers::make_table_column(&alias, &foreign_column.key),
                sql::helpers::make_table_column(owner, &foreign_column.via),
            ),
        }));
        self.foreign_tables.insert(key, alias.clone());
        alias
    }

    /// The joins collected so far.
    pub fn into_joins(self) -> Vec<sql::ast::Join> {
        self.joins
    }
}
