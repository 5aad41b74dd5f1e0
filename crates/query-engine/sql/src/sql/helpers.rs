//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;
use nonempty::NonEmpty;

// Empty clauses //

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// An empty `LIMIT` clause.
pub fn empty_limit() -> Limit {
    Limit { limit: None }
}

// Values //

/// A string literal.
pub fn string_literal(value: &str) -> Expression {
    Expression::Value(Value::String(value.to_string()))
}

/// A typed `NULL`, needed to keep the members of a union aligned.
pub fn typed_null(r#type: ScalarType) -> Expression {
    cast(Expression::Value(Value::Null), r#type)
}

/// Wrap an expression in a cast.
pub fn cast(expression: Expression, r#type: ScalarType) -> Expression {
    Expression::Cast {
        expression: Box::new(expression),
        r#type,
    }
}

/// `left = right`
pub fn equals(left: Expression, right: Expression) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(left),
        operator: BinaryOperator::Equals,
        right: Box::new(right),
    }
}

/// `left AND right`
pub fn and(left: Expression, right: Expression) -> Expression {
    Expression::And {
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// The `text` type name.
pub fn text_type_name() -> ScalarType {
    ScalarType("text".to_string())
}

// Aliasing //

/// Refer to a column of an aliased table.
pub fn make_table_column(table: &TableAlias, column: &str) -> Expression {
    Expression::ColumnReference(ColumnReference::TableColumn {
        table: TableReference::AliasedTable(table.clone()),
        name: ColumnName(column.to_string()),
    })
}

/// Refer to an output column of an aliased subquery.
pub fn make_aliased_column(table: &TableAlias, column: &str) -> Expression {
    Expression::ColumnReference(ColumnReference::AliasedColumn {
        table: TableReference::AliasedTable(table.clone()),
        column: make_column_alias(column.to_string()),
    })
}

/// Create column aliases using this function so we build everything in one place.
pub fn make_column_alias(name: String) -> ColumnAlias {
    ColumnAlias { name }
}

/// Create table aliases using this function so we build everything in one place.
pub fn make_table_alias(name: String) -> TableAlias {
    TableAlias {
        unique_index: None,
        name,
    }
}

/// A reference to a database table, optionally schema-qualified.
pub fn make_db_table(schema: Option<&str>, table: &str) -> TableReference {
    TableReference::DBTable {
        schema: schema.map(|schema| SchemaName(schema.to_string())),
        table: TableName(table.to_string()),
    }
}

// ORDER BY //

/// Ascending order over output columns, as used after a union.
pub fn order_by_output_columns(columns: &[&str]) -> OrderBy {
    OrderBy {
        elements: columns
            .iter()
            .map(|column| OrderByElement {
                target: Expression::ColumnReference(ColumnReference::OutputColumn(
                    make_column_alias((*column).to_string()),
                )),
            })
            .collect(),
    }
}

// SELECTs //

/// Build a simple select with a select list and the rest are empty.
pub fn simple_select(select_list: Vec<(ColumnAlias, Expression)>) -> Select {
    Select {
        select_list: SelectList(select_list),
        from: None,
        joins: vec![],
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Combine selects with UNION ALL, keeping duplicates.
/// Returns `None` when there is nothing to combine.
pub fn union_all(selects: Vec<Select>, order_by: OrderBy) -> Option<Query> {
    NonEmpty::from_vec(selects).map(|selects| Query::UnionAll { selects, order_by })
}

/// Wrap a query in an outer select over it: `SELECT <select_list> FROM (<query>) AS <alias>`.
pub fn select_from_subquery(
    select_list: Vec<(ColumnAlias, Expression)>,
    query: Query,
    alias: TableAlias,
) -> Select {
    let mut select = simple_select(select_list);
    select.from = Some(From::Select {
        query: Box::new(query),
        alias,
    });
    select
}
