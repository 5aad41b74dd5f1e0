//! Build the SELECT for one entity or relation, and union them.

use query_engine_metadata::metadata::Field;
use query_engine_sql::sql;

/// The projection of one entity or relation: its output columns and the tables
/// they are read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// The entity kind or relation type, for logging.
    pub name: String,
    pub columns: Vec<FragmentColumn>,
    /// `None` when there is nothing to read from.
    pub source: Option<Source>,
}

/// One output column of a fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentColumn {
    pub field: Field,
    pub expression: sql::ast::Expression,
}

/// The FROM and JOIN clauses of a fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub from: sql::ast::From,
    pub joins: Vec<sql::ast::Join>,
}

impl Fragment {
    /// The output columns, in order.
    pub fn fields(&self) -> Vec<Field> {
        self.columns.iter().map(|column| column.field.clone()).collect()
    }

    /// A fragment without columns or without a source cannot be queried.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.source.is_none()
    }
}

/// Build the SELECT of a fragment, optionally ordered by an output column and bounded
/// to `limit` rows.
///
/// Returns `None` for an empty fragment: callers skip it.
pub fn build_fragment(
    fragment: Fragment,
    limit: Option<u32>,
    order_by: Option<&str>,
) -> Option<sql::ast::Select> {
    if fragment.columns.is_empty() {
        tracing::debug!(fragment = %fragment.name, "skipping fragment without columns");
        return None;
    }
    let Some(source) = fragment.source else {
        tracing::debug!(fragment = %fragment.name, "skipping fragment without a source");
        return None;
    };

    let select_list = fragment
        .columns
        .into_iter()
        .map(|column| {
            (
                sql::helpers::make_column_alias(column.field.name),
                column.expression,
            )
        })
        .collect();

    let mut select = sql::helpers::simple_select(select_list);
    select.from = Some(source.from);
    select.joins = source.joins;
    if let Some(column) = order_by {
        select.order_by = sql::helpers::order_by_output_columns(&[column]);
    }
    select.limit.limit = limit;
    Some(select)
}

/// Build every non-empty fragment.
pub fn build_fragments(
    fragments: Vec<Fragment>,
    limit: Option<u32>,
    order_by: Option<&str>,
) -> Vec<sql::ast::Select> {
    fragments
        .into_iter()
        .filter_map(|fragment| build_fragment(fragment, limit, order_by))
        .collect()
}

/// Union fragments into one result set, keeping duplicates, ordered by `order_by`
/// output columns.
///
/// Returns `None` when there are no fragments: callers must not emit anything then.
pub fn union_fragments(
    fragments: Vec<sql::ast::Select>,
    order_by: &[&str],
) -> Option<sql::ast::Query> {
    sql::helpers::union_all(fragments, sql::helpers::order_by_output_columns(order_by))
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_metadata::metadata::PropertyType;
    use query_engine_sql::sql::convert::query_to_sql;

    fn fragment(name: &str, with_columns: bool, with_source: bool) -> Fragment {
        let alias = sql::helpers::make_table_alias(name.to_string());
        let columns = if with_columns {
            vec![FragmentColumn {
                field: Field::new("pk", PropertyType::Integer),
                expression: sql::helpers::make_table_column(&alias, "id"),
            }]
        } else {
            vec![]
        };
        let source = with_source.then(|| Source {
            from: sql::ast::From::Table {
                reference: sql::helpers::make_db_table(None, name),
                alias,
            },
            joins: vec![],
        });
        Fragment {
            name: name.to_string(),
            columns,
            source,
        }
    }

    #[test]
    fn empty_fragments_are_skipped() {
        assert!(build_fragment(fragment("a", false, true), None, None).is_none());
        assert!(build_fragment(fragment("a", true, false), None, None).is_none());
        assert!(fragment("a", false, true).is_empty());
        assert!(!fragment("a", true, true).is_empty());
    }

    #[test]
    fn fragment_with_limit_and_order() {
        let select = build_fragment(fragment("person", true, true), Some(5), Some("pk")).unwrap();
        assert_eq!(
            query_to_sql(&sql::ast::Query::Select(Box::new(select))).sql,
            "SELECT\n    person.id AS pk\nFROM person AS person\nORDER BY pk\nLIMIT 5"
        );
    }

    #[test]
    fn empty_fragments_never_reach_the_union() {
        let selects = build_fragments(
            vec![
                fragment("person", true, true),
                fragment("ghost", false, true),
                fragment("company", true, false),
            ],
            None,
            None,
        );
        assert_eq!(selects.len(), 1);

        let rendered = query_to_sql(&union_fragments(selects, &["pk"]).unwrap()).sql;
        assert!(rendered.contains("FROM person AS person"));
        assert!(!rendered.contains("ghost"));
        assert!(!rendered.contains("company"));
    }

    #[test]
    fn union_of_nothing_is_nothing() {
        assert!(union_fragments(vec![], &["kind", "pk"]).is_none());
    }
}
