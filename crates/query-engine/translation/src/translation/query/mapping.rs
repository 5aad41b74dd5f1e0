//! Assign node ids to (entity kind, primary key) pairs in a temporary mapping table.

use super::fields::{self, ENTITY_COLUMN, NODE_ID_COLUMN};
use super::fragments;
use crate::translation::error::Error;
use crate::translation::helpers::Env;
use query_engine_metadata::metadata::{
    Field, MappingStrategy, PropertyType, KIND_COLUMN, PK_COLUMN,
};
use query_engine_sql::sql;

/// The temporary table relationship exports look node ids up in.
pub const MAPPING_TABLE: &str = "entity_mapping";

const UNION_ALIAS: &str = "entity_union";

fn mapping_table() -> sql::ast::TableReference {
    sql::helpers::make_db_table(None, MAPPING_TABLE)
}

fn column_names(names: &[&str]) -> Vec<sql::ast::ColumnName> {
    names
        .iter()
        .map(|name| sql::ast::ColumnName((*name).to_string()))
        .collect()
}

/// The statements creating and indexing the mapping table, with every entity row bounded
/// by `limit` like the node export is.
///
/// Returns no statement at all when no entity can be read.
pub fn create_mapping_table(
    env: &Env,
    strategy: MappingStrategy,
    limit: Option<u32>,
) -> Result<Vec<sql::ast::Statement>, Error> {
    let key_fields = [
        Field::new(KIND_COLUMN, PropertyType::Text),
        Field::new(PK_COLUMN, PropertyType::Integer),
    ];
    let selects = fragments::build_fragments(
        fields::fetch_all(env, Some(key_fields.as_slice()))?,
        limit,
        Some(PK_COLUMN),
    );
    if selects.is_empty() {
        tracing::warn!("no entity to map, skipping the mapping table");
        return Ok(vec![]);
    }

    let mut statements = vec![
        sql::ast::Statement::Comment(
            "Create the mapping table\nbetween (entity, pk) tuples and incrementing node IDs"
                .to_string(),
        ),
        sql::ast::Statement::DropTableIfExists(mapping_table()),
    ];

    match strategy {
        MappingStrategy::GlobalOrdered => {
            let Some(union) = fragments::union_fragments(selects, &[]) else {
                return Ok(vec![]);
            };
            statements.push(sql::ast::Statement::CreateTemporaryTableAs {
                table: mapping_table(),
                query: numbered_union(union),
            });
        }
        MappingStrategy::PerEntityInsert => {
            statements.push(sql::ast::Statement::CreateTemporaryTable {
                table: mapping_table(),
                columns: vec![
                    column_definition(NODE_ID_COLUMN, "serial"),
                    column_definition(ENTITY_COLUMN, "text"),
                    column_definition(PK_COLUMN, "bigint"),
                ],
            });
            statements.extend(selects.into_iter().map(|select| {
                sql::ast::Statement::InsertSelect(sql::ast::InsertSelect {
                    table: mapping_table(),
                    columns: column_names(&[ENTITY_COLUMN, PK_COLUMN]),
                    select,
                })
            }));
        }
    }

    statements.push(sql::ast::Statement::CreateIndex {
        table: mapping_table(),
        columns: column_names(&[ENTITY_COLUMN, PK_COLUMN]),
    });
    statements.push(sql::ast::Statement::Analyze(mapping_table()));

    tracing::info!(?strategy, "mapping table created");
    Ok(statements)
}

fn column_definition(name: &str, r#type: &str) -> sql::ast::ColumnDefinition {
    sql::ast::ColumnDefinition {
        name: sql::ast::ColumnName(name.to_string()),
        r#type: sql::ast::ScalarType(r#type.to_string()),
    }
}

/// `SELECT kind AS entity, pk, row_number() OVER (ORDER BY kind, pk) AS node_id FROM (<union>)`
fn numbered_union(union: sql::ast::Query) -> sql::ast::Query {
    let alias = sql::helpers::make_table_alias(UNION_ALIAS.to_string());
    let kind = sql::helpers::make_aliased_column(&alias, KIND_COLUMN);
    let pk = sql::helpers::make_aliased_column(&alias, PK_COLUMN);

    let order_by = sql::ast::OrderBy {
        elements: [kind.clone(), pk.clone()]
            .into_iter()
            .map(|target| sql::ast::OrderByElement { target })
            .collect(),
    };

    sql::ast::Query::Select(Box::new(sql::helpers::select_from_subquery(
        vec![
            (
                sql::helpers::make_column_alias(ENTITY_COLUMN.to_string()),
                kind,
            ),
            (sql::helpers::make_column_alias(PK_COLUMN.to_string()), pk),
            (
                sql::helpers::make_column_alias(NODE_ID_COLUMN.to_string()),
                sql::ast::Expression::RowNumber { order_by },
            ),
        ],
        union,
        alias,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_metadata::metadata::{Entity, Property, Schema};
    use query_engine_sql::sql::convert::script_to_sql;

    fn schema() -> Schema {
        Schema::empty()
            .with_entity(
                "person",
                Entity::new("people", "id").with_property("name", Property::column("name")),
            )
            .with_entity(
                "company",
                Entity::new("companies", "id").with_property("name", Property::column("name")),
            )
    }

    fn render(statements: Vec<sql::ast::Statement>) -> String {
        script_to_sql(&sql::ast::Script(statements)).sql
    }

    #[test]
    fn global_ordered_mapping() {
        let schema = schema();
        let env = Env::new(&schema, None, true).unwrap();
        let statements = create_mapping_table(&env, MappingStrategy::GlobalOrdered, None).unwrap();
        similar_asserts::assert_eq!(
            render(statements),
            "-- Create the mapping table
-- between (entity, pk) tuples and incrementing node IDs

DROP TABLE IF EXISTS entity_mapping;

CREATE TEMPORARY TABLE entity_mapping AS
(
    SELECT
        entity_union.kind AS entity,
        entity_union.pk AS pk,
        row_number() OVER (ORDER BY entity_union.kind, entity_union.pk) AS node_id
    FROM (
        (
            SELECT
                CAST('person' AS text) AS kind,
                CAST(person.id AS bigint) AS pk
            FROM people AS person
            ORDER BY pk
        )
        UNION ALL
        (
            SELECT
                CAST('company' AS text) AS kind,
                CAST(company.id AS bigint) AS pk
            FROM companies AS company
            ORDER BY pk
        )
    ) AS entity_union
);

CREATE INDEX ON entity_mapping (entity, pk);

ANALYZE entity_mapping;
"
        );
    }

    #[test]
    fn per_entity_insert_mapping() {
        let schema = schema();
        let env = Env::new(&schema, None, true).unwrap();
        let statements =
            create_mapping_table(&env, MappingStrategy::PerEntityInsert, Some(10)).unwrap();
        let rendered = render(statements);

        assert!(rendered.contains(
            "CREATE TEMPORARY TABLE entity_mapping
(
    node_id serial,
    entity text,
    pk bigint
);"
        ));
        let person = rendered
            .find("INSERT INTO entity_mapping (entity, pk)\nSELECT\n    CAST('person' AS text)")
            .unwrap();
        let company = rendered
            .find("INSERT INTO entity_mapping (entity, pk)\nSELECT\n    CAST('company' AS text)")
            .unwrap();
        assert!(person < company);
        assert_eq!(rendered.matches("ORDER BY pk\nLIMIT 10;").count(), 2);
        assert!(rendered
            .ends_with("CREATE INDEX ON entity_mapping (entity, pk);\n\nANALYZE entity_mapping;\n"));
    }

    #[test]
    fn nothing_to_map() {
        let schema = Schema::empty().with_entity("ghost", Entity::new("", "id"));
        let env = Env::new(&schema, None, true).unwrap();
        assert!(create_mapping_table(&env, MappingStrategy::GlobalOrdered, None)
            .unwrap()
            .is_empty());
    }
}
