//! Resolve the schema into the columns and joins that project each entity and relation.

use indexmap::IndexMap;

use super::fragments::{Fragment, FragmentColumn, Source};
use super::mapping::MAPPING_TABLE;
use super::values;
use crate::translation::error::Error;
use crate::translation::helpers::{is_fixed_relationship_column, Env, State};
use query_engine_metadata::metadata::{
    Entity, Field, Property, PropertySource, PropertyType, Relation, END_COLUMN, KIND_COLUMN,
    PK_COLUMN, START_COLUMN, TYPE_COLUMN,
};
use query_engine_sql::sql;

/// The node id column of the mapping table.
pub const NODE_ID_COLUMN: &str = "node_id";
/// The entity kind column of the mapping table.
pub const ENTITY_COLUMN: &str = "entity";

const START_MAPPING_ALIAS: &str = "start_mapping";
const END_MAPPING_ALIAS: &str = "end_mapping";

/// The columns of a node export over every exported entity: `kind`, `pk`, then every
/// property in first-declaration order. The first declaration of a name fixes its type.
pub fn fetch_all_fields(env: &Env) -> Vec<Field> {
    let mut fields = IndexMap::new();
    fields.insert(KIND_COLUMN.to_string(), PropertyType::Text);
    fields.insert(PK_COLUMN.to_string(), PropertyType::Integer);
    for (_, entity) in env.entities() {
        for (name, property) in entity_properties(entity) {
            fields.entry(name.clone()).or_insert(property.r#type);
        }
    }
    fields
        .into_iter()
        .map(|(name, r#type)| Field { name, r#type })
        .collect()
}

/// The columns of a relationship export: `start`, `end`, `type`, then every property of the
/// relations that are exported, in first-declaration order.
pub fn fetch_all_relations_properties(env: &Env) -> Vec<Field> {
    let mut fields = IndexMap::new();
    fields.insert(START_COLUMN.to_string(), PropertyType::Integer);
    fields.insert(END_COLUMN.to_string(), PropertyType::Integer);
    fields.insert(TYPE_COLUMN.to_string(), PropertyType::Text);
    for relation in env.relations() {
        if endpoints(env, relation).is_empty() {
            continue;
        }
        for (name, property) in relation_properties(relation) {
            fields.entry(name.clone()).or_insert(property.r#type);
        }
    }
    fields
        .into_iter()
        .map(|(name, r#type)| Field { name, r#type })
        .collect()
}

/// One fragment per exported entity, in declaration order.
///
/// With `requested` columns, every fragment projects exactly those columns in that order,
/// padding the ones an entity lacks with typed `NULL`s so the fragments can be unioned.
/// An entity providing none of them gets a fragment without columns. Without `requested`
/// columns, each entity projects its own.
pub fn fetch_all(env: &Env, requested: Option<&[Field]>) -> Result<Vec<Fragment>, Error> {
    let requested = match requested {
        Some(requested) => Some(known_columns(env, requested, &fetch_all_fields(env))?),
        None => None,
    };

    Ok(env
        .entities()
        .iter()
        .map(|(kind, entity)| entity_fragment(kind, entity, requested.as_deref()))
        .collect())
}

/// The fragments of every relation, grouped by relation in declaration order.
///
/// A relation with several possible start or end kinds has one fragment per combination
/// of exported kinds, and a relation touching no exported kind has none.
pub fn fetch_all_relations(
    env: &Env,
    requested: Option<&[Field]>,
) -> Result<Vec<Vec<Fragment>>, Error> {
    let requested = match requested {
        Some(requested) => Some(known_columns(
            env,
            requested,
            &fetch_all_relations_properties(env),
        )?),
        None => None,
    };

    Ok(env
        .relations()
        .iter()
        .map(|relation| {
            let endpoints = endpoints(env, relation);
            if endpoints.is_empty() {
                tracing::debug!(
                    relation = %relation.rel_type,
                    "skipping relation without exported endpoints"
                );
            }
            endpoints
                .into_iter()
                .map(|(start, end)| relation_fragment(relation, start, end, requested.as_deref()))
                .collect()
        })
        .collect())
}

/// Keep the requested columns that something in the schema provides.
fn known_columns(env: &Env, requested: &[Field], known: &[Field]) -> Result<Vec<Field>, Error> {
    let mut columns = vec![];
    for field in requested {
        if known.iter().any(|known| known.name == field.name) {
            columns.push(field.clone());
        } else if env.strict() {
            return Err(Error::ColumnNotFound(field.name.clone()));
        } else {
            tracing::warn!(column = %field.name, "skipping unknown column");
        }
    }
    Ok(columns)
}

/// The (start kind, end kind) pairs of a relation whose kinds are both exported.
fn endpoints<'a>(env: &Env, relation: &'a Relation) -> Vec<(&'a str, &'a str)> {
    let exported = |kinds: &'a [String]| -> Vec<&'a str> {
        kinds
            .iter()
            .map(String::as_str)
            .filter(|kind| env.is_exported(kind))
            .collect()
    };
    let starts = exported(relation.start.entities());
    let ends = exported(relation.end.entities());
    starts
        .iter()
        .flat_map(|start| ends.iter().map(move |end| (*start, *end)))
        .collect()
}

/// Entity properties, leaving out the ones that would clash with the fixed columns.
fn entity_properties(entity: &Entity) -> impl Iterator<Item = (&String, &Property)> {
    entity
        .properties
        .iter()
        .filter(|(name, _)| name.as_str() != KIND_COLUMN && name.as_str() != PK_COLUMN)
}

fn relation_properties(relation: &Relation) -> impl Iterator<Item = (&String, &Property)> {
    relation
        .properties
        .iter()
        .filter(|(name, _)| !is_fixed_relationship_column(name))
}

fn entity_fragment(kind: &str, entity: &Entity, requested: Option<&[Field]>) -> Fragment {
    let mut state = State::new();
    let alias = sql::helpers::make_table_alias(entity.table_alias(kind).to_string());

    let fields: Vec<Field> = match requested {
        Some(requested) => requested.to_vec(),
        None => [
            Field::new(KIND_COLUMN, PropertyType::Text),
            Field::new(PK_COLUMN, PropertyType::Integer),
        ]
        .into_iter()
        .chain(
            entity_properties(entity)
                .map(|(name, property)| Field::new(name.as_str(), property.r#type)),
        )
        .collect(),
    };

    let mut provides_any = false;
    let mut columns = vec![];
    for field in fields {
        let expression = if field.name == KIND_COLUMN {
            provides_any = true;
            values::text_constant(kind)
        } else if field.name == PK_COLUMN {
            provides_any = true;
            values::typed(
                sql::helpers::make_table_column(&alias, &entity.pk),
                PropertyType::Integer,
            )
        } else {
            match entity_properties(entity).find(|(name, _)| **name == field.name) {
                Some((_, property)) => {
                    provides_any = true;
                    values::typed(
                        property_expression(&mut state, &alias, property),
                        field.r#type,
                    )
                }
                None => values::typed_null(field.r#type),
            }
        };
        columns.push(FragmentColumn { field, expression });
    }

    if !provides_any {
        tracing::debug!(entity = kind, "entity provides none of the requested columns");
        columns.clear();
    }

    let source = (!entity.table.is_empty()).then(|| Source {
        from: sql::ast::From::Table {
            reference: sql::helpers::make_db_table(entity.schema.as_deref(), &entity.table),
            alias,
        },
        joins: state.into_joins(),
    });

    Fragment {
        name: kind.to_string(),
        columns,
        source,
    }
}

fn relation_fragment(
    relation: &Relation,
    start: &str,
    end: &str,
    requested: Option<&[Field]>,
) -> Fragment {
    let mut state = State::new();
    let alias = sql::helpers::make_table_alias(relation.table_alias().to_string());

    let start_mapping = sql::helpers::make_table_alias(START_MAPPING_ALIAS.to_string());
    let end_mapping = sql::helpers::make_table_alias(END_MAPPING_ALIAS.to_string());
    state.push_join(mapping_join(&start_mapping, start, &alias, &relation.start.column));
    state.push_join(mapping_join(&end_mapping, end, &alias, &relation.end.column));

    let fields: Vec<Field> = match requested {
        Some(requested) => requested.to_vec(),
        None => [
            Field::new(START_COLUMN, PropertyType::Integer),
            Field::new(END_COLUMN, PropertyType::Integer),
            Field::new(TYPE_COLUMN, PropertyType::Text),
        ]
        .into_iter()
        .chain(
            relation_properties(relation)
                .map(|(name, property)| Field::new(name.as_str(), property.r#type)),
        )
        .collect(),
    };

    let columns = fields
        .into_iter()
        .map(|field| {
            let expression = match field.name.as_str() {
                START_COLUMN => sql::helpers::make_table_column(&start_mapping, NODE_ID_COLUMN),
                END_COLUMN => sql::helpers::make_table_column(&end_mapping, NODE_ID_COLUMN),
                TYPE_COLUMN => values::text_constant(&relation.rel_type),
                name => match relation_properties(relation).find(|(n, _)| n.as_str() == name) {
                    Some((_, property)) => values::typed(
                        property_expression(&mut state, &alias, property),
                        field.r#type,
                    ),
                    None => values::typed_null(field.r#type),
                },
            };
            FragmentColumn { field, expression }
        })
        .collect();

    let source = (!relation.table.is_empty()).then(|| Source {
        from: sql::ast::From::Table {
            reference: sql::helpers::make_db_table(relation.schema.as_deref(), &relation.table),
            alias,
        },
        joins: state.into_joins(),
    });

    Fragment {
        name: relation.rel_type.clone(),
        columns,
        source,
    }
}

/// `JOIN entity_mapping AS <mapping> ON <mapping>.entity = '<kind>' AND <mapping>.pk = <owner>.<column>`
fn mapping_join(
    mapping: &sql::ast::TableAlias,
    kind: &str,
    owner: &sql::ast::TableAlias,
    column: &str,
) -> sql::ast::Join {
    sql::ast::Join::InnerJoin(sql::ast::TableJoin {
        reference: sql::helpers::make_db_table(None, MAPPING_TABLE),
        alias: mapping.clone(),
        on: sql::helpers::and(
            sql::helpers::equals(
                sql::helpers::make_table_column(mapping, ENTITY_COLUMN),
                sql::helpers::string_literal(kind),
            ),
            sql::helpers::equals(
                sql::helpers::make_table_column(mapping, PK_COLUMN),
                sql::helpers::make_table_column(owner, column),
            ),
        ),
    })
}

/// The value of a property, read from `owner` or a table joined to it.
fn property_expression(
    state: &mut State,
    owner: &sql::ast::TableAlias,
    property: &Property,
) -> sql::ast::Expression {
    match &property.source {
        PropertySource::Column(column) => sql::helpers::make_table_column(owner, column),
        PropertySource::ForeignColumn(foreign_column) => {
            let table = state.foreign_table_alias(owner, foreign_column);
            sql::helpers::make_table_column(&table, &foreign_column.column)
        }
        PropertySource::Expression(expression) => sql::ast::Expression::RawSql(expression.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_metadata::metadata::{ForeignColumn, Reference, Schema};
    use query_engine_sql::sql::convert::query_to_sql;

    fn schema() -> Schema {
        Schema::empty()
            .with_entity(
                "person",
                Entity::new("people", "id")
                    .with_property("name", Property::column("full_name"))
                    .with_property(
                        "employer",
                        Property::foreign(ForeignColumn::new("companies", "name", "company_id")),
                    ),
            )
            .with_entity(
                "company",
                Entity::new("companies", "id")
                    .with_property("name", Property::column("name"))
                    .with_property("founded", Property::integer("founded")),
            )
            .with_relation(Relation::new(
                "WORKS_AT",
                "people",
                Reference::new("person", "id"),
                Reference::new("company", "company_id"),
            ))
    }

    fn render(fragment: Fragment) -> String {
        let select = super::super::fragments::build_fragment(fragment, None, None).unwrap();
        query_to_sql(&sql::ast::Query::Select(Box::new(select))).sql
    }

    #[test]
    fn all_fields_start_with_kind_and_pk() {
        let schema = schema();
        let env = Env::new(&schema, None, true).unwrap();
        let names: Vec<String> = fetch_all_fields(&env)
            .into_iter()
            .map(|field| field.name)
            .collect();
        assert_eq!(names, ["kind", "pk", "name", "employer", "founded"]);
    }

    #[test]
    fn selection_narrows_fields_and_relations() {
        let schema = schema();
        let selection = vec!["company".to_string()];
        let env = Env::new(&schema, Some(selection.as_slice()), true).unwrap();
        let names: Vec<String> = fetch_all_fields(&env)
            .into_iter()
            .map(|field| field.name)
            .collect();
        assert_eq!(names, ["kind", "pk", "name", "founded"]);
        assert_eq!(fetch_all_relations(&env, None).unwrap(), vec![vec![]]);
    }

    #[test]
    fn aligned_fragments_pad_missing_columns() {
        let schema = schema();
        let env = Env::new(&schema, None, true).unwrap();
        let fields = fetch_all_fields(&env);
        let fragments = fetch_all(&env, Some(fields.as_slice())).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].fields(), fields);
        assert_eq!(fragments[1].fields(), fields);

        similar_asserts::assert_eq!(
            render(fragments[0].clone()),
            "SELECT
    CAST('person' AS text) AS kind,
    CAST(person.id AS bigint) AS pk,
    CAST(person.full_name AS text) AS name,
    CAST(companies_1.name AS text) AS employer,
    CAST(NULL AS bigint) AS founded
FROM people AS person
LEFT JOIN companies AS companies_1 ON companies_1.id = person.company_id"
        );
    }

    #[test]
    fn own_columns_without_request() {
        let schema = schema();
        let env = Env::new(&schema, None, true).unwrap();
        let fragments = fetch_all(&env, None).unwrap();
        let names: Vec<String> = fragments[1]
            .fields()
            .into_iter()
            .map(|field| field.name)
            .collect();
        assert_eq!(names, ["kind", "pk", "name", "founded"]);
    }

    #[test]
    fn foreign_joins_only_when_projected() {
        let schema = schema();
        let env = Env::new(&schema, None, true).unwrap();
        let fragments = fetch_all(
            &env,
            Some(&[
                Field::new("kind", PropertyType::Text),
                Field::new("pk", PropertyType::Integer),
            ]),
        )
        .unwrap();
        assert!(!render(fragments[0].clone()).contains("JOIN"));
    }

    #[test]
    fn entity_without_requested_columns_is_empty() {
        let schema = schema();
        let env = Env::new(&schema, None, true).unwrap();
        let fragments =
            fetch_all(&env, Some(&[Field::new("founded", PropertyType::Integer)])).unwrap();
        assert!(fragments[0].is_empty());
        assert!(!fragments[1].is_empty());
    }

    #[test]
    fn unknown_requested_column() {
        let schema = schema();
        let requested = [Field::new("salary", PropertyType::Integer)];

        let strict = Env::new(&schema, None, true).unwrap();
        assert_eq!(
            fetch_all(&strict, Some(requested.as_slice())),
            Err(Error::ColumnNotFound("salary".to_string()))
        );

        let lax = Env::new(&schema, None, false).unwrap();
        let fragments = fetch_all(&lax, Some(requested.as_slice())).unwrap();
        assert!(fragments.iter().all(Fragment::is_empty));
    }

    #[test]
    fn relation_joins_the_mapping_table() {
        let schema = schema();
        let env = Env::new(&schema, None, true).unwrap();
        let mut relations = fetch_all_relations(&env, None).unwrap();
        assert_eq!(relations.len(), 1);
        let fragment = relations.remove(0).remove(0);

        similar_asserts::assert_eq!(
            render(fragment),
            "SELECT
    start_mapping.node_id AS start,
    end_mapping.node_id AS \"end\",
    CAST('WORKS_AT' AS text) AS type
FROM people AS people
JOIN entity_mapping AS start_mapping ON start_mapping.entity = 'person' AND start_mapping.pk = people.id
JOIN entity_mapping AS end_mapping ON end_mapping.entity = 'company' AND end_mapping.pk = people.company_id"
        );
    }

    #[test]
    fn multi_parent_relations_decompose() {
        let schema = schema().with_relation(
            Relation::new(
                "OWNS",
                "assets",
                Reference::any_of(vec!["person".to_string(), "company".to_string()], "owner_id"),
                Reference::new("company", "company_id"),
            )
            .with_property("since", Property::integer("since")),
        );
        let env = Env::new(&schema, None, true).unwrap();
        let relations = fetch_all_relations(&env, None).unwrap();
        assert_eq!(relations[1].len(), 2);

        let names: Vec<String> = fetch_all_relations_properties(&env)
            .into_iter()
            .map(|field| field.name)
            .collect();
        assert_eq!(names, ["start", "end", "type", "since"]);
    }
}
