//! Entities, properties and relations: the relational schema a graph is built from.

use indexmap::IndexMap;
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema as JsonSchemaObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::PropertyType;

/// The full definition of what to export.
///
/// Entities are keyed by their kind, which makes kinds unique. Declaration order
/// is significant: it is the default export order of entities and of property columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    #[serde(default)]
    pub entities: IndexMap<String, Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Schema {
    pub fn empty() -> Self {
        Schema::default()
    }

    pub fn with_entity(mut self, kind: impl Into<String>, entity: Entity) -> Self {
        self.entities.insert(kind.into(), entity);
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }
}

/// A table (or view) exported as graph nodes of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub table: String,
    /// The alias the table is given in queries. Defaults to the entity kind.
    /// Computed properties may refer to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// The primary key column. Must hold integers.
    pub pk: String,
    #[serde(default)]
    pub properties: IndexMap<String, Property>,
}

impl Entity {
    pub fn new(table: impl Into<String>, pk: impl Into<String>) -> Self {
        Entity {
            schema: None,
            table: table.into(),
            alias: None,
            pk: pk.into(),
            properties: IndexMap::new(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// The alias of the entity table in queries.
    pub fn table_alias<'a>(&'a self, kind: &'a str) -> &'a str {
        self.alias.as_deref().unwrap_or(kind)
    }
}

/// A semantic output column, bound to where its value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PropertyDefinition", into = "PropertyDefinition")]
pub struct Property {
    pub source: PropertySource,
    pub r#type: PropertyType,
}

/// A property as written in configuration files: one source key and an optional `type`.
#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PropertyDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    foreign_column: Option<ForeignColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
    #[serde(default, rename = "type")]
    r#type: PropertyType,
}

impl TryFrom<PropertyDefinition> for Property {
    type Error = String;

    fn try_from(definition: PropertyDefinition) -> Result<Self, Self::Error> {
        let source = match (
            definition.column,
            definition.foreign_column,
            definition.expression,
        ) {
            (Some(column), None, None) => PropertySource::Column(column),
            (None, Some(foreign_column), None) => PropertySource::ForeignColumn(foreign_column),
            (None, None, Some(expression)) => PropertySource::Expression(expression),
            _ => {
                return Err(
                    "a property needs exactly one of column, foreignColumn or expression"
                        .to_string(),
                )
            }
        };
        Ok(Property {
            source,
            r#type: definition.r#type,
        })
    }
}

impl From<Property> for PropertyDefinition {
    fn from(property: Property) -> Self {
        let mut definition = PropertyDefinition {
            column: None,
            foreign_column: None,
            expression: None,
            r#type: property.r#type,
        };
        match property.source {
            PropertySource::Column(column) => definition.column = Some(column),
            PropertySource::ForeignColumn(foreign_column) => {
                definition.foreign_column = Some(foreign_column);
            }
            PropertySource::Expression(expression) => definition.expression = Some(expression),
        }
        definition
    }
}

impl JsonSchema for Property {
    fn schema_name() -> String {
        "Property".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> JsonSchemaObject {
        PropertyDefinition::json_schema(gen)
    }
}

impl Property {
    /// A text property read from a column of the owning table.
    pub fn column(column: impl Into<String>) -> Self {
        Property {
            source: PropertySource::Column(column.into()),
            r#type: PropertyType::Text,
        }
    }

    /// An integer property read from a column of the owning table.
    pub fn integer(column: impl Into<String>) -> Self {
        Property::column(column).typed(PropertyType::Integer)
    }

    /// A property read from a table joined through a foreign key.
    pub fn foreign(foreign_column: ForeignColumn) -> Self {
        Property {
            source: PropertySource::ForeignColumn(foreign_column),
            r#type: PropertyType::Text,
        }
    }

    /// A property computed by a SQL expression.
    pub fn expression(expression: impl Into<String>) -> Self {
        Property {
            source: PropertySource::Expression(expression.into()),
            r#type: PropertyType::Text,
        }
    }

    pub fn typed(mut self, r#type: PropertyType) -> Self {
        self.r#type = r#type;
        self
    }
}

/// Where the value of a property comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySource {
    /// A column of the owning table.
    Column(String),
    /// A column of another table, reached through a foreign key of the owning table.
    ForeignColumn(ForeignColumn),
    /// A SQL expression, spliced verbatim into the query.
    Expression(String),
}

/// A column of a joined table: `LEFT JOIN table ON table.key = owner.via`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignColumn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub table: String,
    pub column: String,
    /// The foreign key column of the owning table.
    pub via: String,
    /// The key column of the joined table.
    #[serde(default = "default_foreign_key")]
    pub key: String,
}

impl ForeignColumn {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        via: impl Into<String>,
    ) -> Self {
        ForeignColumn {
            schema: None,
            table: table.into(),
            column: column.into(),
            via: via.into(),
            key: default_foreign_key(),
        }
    }
}

fn default_foreign_key() -> String {
    "id".to_string()
}

/// A typed edge between two entity kinds, read from a table holding both primary keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Relation {
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub table: String,
    /// The alias of the relation table in queries. Defaults to the table name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub start: Reference,
    pub end: Reference,
    #[serde(default)]
    pub properties: IndexMap<String, Property>,
}

impl Relation {
    pub fn new(
        rel_type: impl Into<String>,
        table: impl Into<String>,
        start: Reference,
        end: Reference,
    ) -> Self {
        Relation {
            rel_type: rel_type.into(),
            schema: None,
            table: table.into(),
            alias: None,
            start,
            end,
            properties: IndexMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// The alias of the relation table in queries.
    pub fn table_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// One side of a relation: a column of the relation table holding the primary key
/// of the referenced entity.
///
/// Listing several entity kinds describes a multi-parent edge: the column may point
/// at any of them, and the relation is exported once per combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Reference {
    pub entity: SingleOrList<String>,
    pub column: String,
}

impl Reference {
    pub fn new(entity: impl Into<String>, column: impl Into<String>) -> Self {
        Reference {
            entity: SingleOrList::Single(entity.into()),
            column: column.into(),
        }
    }

    pub fn any_of(entities: Vec<String>, column: impl Into<String>) -> Self {
        Reference {
            entity: SingleOrList::List(entities),
            column: column.into(),
        }
    }

    /// The referenced entity kinds.
    pub fn entities(&self) -> &[String] {
        self.entity.as_slice()
    }
}

/// Type that accept both a single value and a list of values. Allows for a simpler format when a
/// single value is the common case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SingleOrList<T> {
    Single(T),
    List(Vec<T>),
}

impl<T> SingleOrList<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            SingleOrList::Single(value) => std::slice::from_ref(value),
            SingleOrList::List(values) => values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_with_every_property_source() {
        let entity: Entity = serde_json::from_value(serde_json::json!({
            "table": "person",
            "pk": "id",
            "properties": {
                "name": { "column": "full_name" },
                "age": { "column": "age", "type": "integer" },
                "company": {
                    "foreignColumn": { "table": "company", "column": "name", "via": "company_id" }
                },
                "label": { "expression": "upper(person.full_name)" }
            }
        }))
        .unwrap();

        let expected = Entity::new("person", "id")
            .with_property("name", Property::column("full_name"))
            .with_property("age", Property::integer("age"))
            .with_property(
                "company",
                Property::foreign(ForeignColumn::new("company", "name", "company_id")),
            )
            .with_property("label", Property::expression("upper(person.full_name)"));

        assert_eq!(entity, expected);
        assert_eq!(
            entity.properties.keys().collect::<Vec<_>>(),
            vec!["name", "age", "company", "label"]
        );
    }

    #[test]
    fn test_property_keeps_its_type_next_to_its_source() {
        let property: Property =
            serde_json::from_str(r#"{ "expression": "age / 10", "type": "float" }"#).unwrap();
        assert_eq!(
            property,
            Property::expression("age / 10").typed(PropertyType::Float)
        );
        assert_eq!(
            serde_json::to_value(Property::integer("age")).unwrap(),
            serde_json::json!({ "column": "age", "type": "integer" })
        );
    }

    #[test]
    fn test_property_needs_exactly_one_source() {
        let both = serde_json::from_str::<Property>(r#"{ "column": "a", "expression": "b" }"#);
        assert!(both
            .unwrap_err()
            .to_string()
            .contains("exactly one of column, foreignColumn or expression"));
        assert!(serde_json::from_str::<Property>(r#"{ "type": "text" }"#).is_err());
    }

    #[test]
    fn test_parse_reference_single_or_list() {
        let single: Reference =
            serde_json::from_str(r#"{ "entity": "person", "column": "author_id" }"#).unwrap();
        let list: Reference = serde_json::from_str(
            r#"{ "entity": ["person", "company"], "column": "owner_id" }"#,
        )
        .unwrap();

        assert_eq!(single.entities(), ["person".to_string()]);
        assert_eq!(
            list.entities(),
            ["person".to_string(), "company".to_string()]
        );
    }

    #[test]
    fn test_table_aliases_default() {
        let entity = Entity::new("people", "id");
        assert_eq!(entity.table_alias("person"), "person");

        let relation = Relation::new(
            "KNOWS",
            "friendship",
            Reference::new("person", "a"),
            Reference::new("person", "b"),
        );
        assert_eq!(relation.table_alias(), "friendship");
    }
}
