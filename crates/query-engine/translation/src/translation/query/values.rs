//! Handle the translation of literal and typed values.

use query_engine_metadata::metadata::PropertyType;
use query_engine_sql::sql;

/// The database type of a property type.
pub fn scalar_type(r#type: PropertyType) -> sql::ast::ScalarType {
    sql::ast::ScalarType(r#type.sql_type_name().to_string())
}

/// Cast an expression to the type it is exported as.
pub fn typed(expression: sql::ast::Expression, r#type: PropertyType) -> sql::ast::Expression {
    sql::helpers::cast(expression, scalar_type(r#type))
}

/// A `NULL` of the given type, for columns a fragment does not provide.
pub fn typed_null(r#type: PropertyType) -> sql::ast::Expression {
    sql::helpers::typed_null(scalar_type(r#type))
}

/// A text constant, such as an entity kind or a relation type.
pub fn text_constant(value: &str) -> sql::ast::Expression {
    typed(sql::helpers::string_literal(value), PropertyType::Text)
}
