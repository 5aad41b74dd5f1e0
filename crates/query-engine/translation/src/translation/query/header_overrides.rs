//! Reconcile requested header renames and merges with the columns an export really has,
//! and project the export through them.

use query_engine_metadata::metadata::{Field, HeaderOverrides, MergeFunction};
use query_engine_sql::sql;

/// The alias of the export query once it is wrapped in the header projection.
pub const WRAPPED_ALIAS: &str = "wrapped";

/// Header overrides that only refer to real columns, and what was left out to get there.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedHeaderOverrides {
    pub overrides: HeaderOverrides,
    pub dropped: Vec<DroppedOverride>,
}

/// An override, or part of one, that did not survive resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DroppedOverride {
    /// A rename of a column the export does not have.
    UnknownRename { column: String, name: String },
    /// Merged columns the export does not have. The merge keeps the other ones.
    UnknownMergeColumns { name: String, columns: Vec<String> },
    /// A merge none of whose columns exist. It is left out entirely.
    DegenerateMerge { name: String, columns: Vec<String> },
    /// A merge whose known columns are those of an earlier merge. The earlier one is kept.
    DuplicateMerge {
        name: String,
        columns: Vec<String>,
        kept: String,
    },
}

impl std::fmt::Display for DroppedOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DroppedOverride::UnknownRename { column, name } => {
                write!(f, "cannot rename unknown column '{column}' to '{name}'")
            }
            DroppedOverride::UnknownMergeColumns { name, columns } => write!(
                f,
                "merge '{name}' ignores unknown columns {}",
                columns.join(", ")
            ),
            DroppedOverride::DegenerateMerge { name, columns } => write!(
                f,
                "merge '{name}' has no known column among {}",
                columns.join(", ")
            ),
            DroppedOverride::DuplicateMerge {
                name,
                columns,
                kept,
            } => write!(
                f,
                "merge '{name}' of {} duplicates merge '{kept}'",
                columns.join(", ")
            ),
        }
    }
}

impl ResolvedHeaderOverrides {
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Keep the overrides that apply to `fields`.
///
/// Renames of unknown columns are dropped, except omissions, which are harmless.
/// Merges are narrowed to their known columns, and dropped when none is known or when
/// an earlier merge already narrowed to the same columns.
/// Resolving the result again changes nothing.
pub fn resolve_header_overrides(
    overrides: &HeaderOverrides,
    fields: &[Field],
) -> ResolvedHeaderOverrides {
    let is_real = |column: &str| fields.iter().any(|field| field.name == column);

    let mut resolved = ResolvedHeaderOverrides::default();

    for (column, target) in &overrides.renames {
        match target {
            Some(name) if !is_real(column) => {
                resolved.dropped.push(DroppedOverride::UnknownRename {
                    column: column.clone(),
                    name: name.clone(),
                });
            }
            _ => {
                resolved
                    .overrides
                    .renames
                    .insert(column.clone(), target.clone());
            }
        }
    }

    for (columns, merge) in &overrides.merges {
        let (known, unknown): (Vec<String>, Vec<String>) =
            columns.iter().cloned().partition(|column| is_real(column));
        if known.is_empty() {
            resolved.dropped.push(DroppedOverride::DegenerateMerge {
                name: merge.name.clone(),
                columns: columns.clone(),
            });
            continue;
        }
        if !unknown.is_empty() {
            resolved.dropped.push(DroppedOverride::UnknownMergeColumns {
                name: merge.name.clone(),
                columns: unknown,
            });
        }
        if let Some(kept) = resolved.overrides.merges.get(&known) {
            resolved.dropped.push(DroppedOverride::DuplicateMerge {
                name: merge.name.clone(),
                columns: columns.clone(),
                kept: kept.name.clone(),
            });
            continue;
        }
        resolved.overrides.merges.insert(known, merge.clone());
    }

    resolved
}

/// The select list of the header projection over an export with columns `fields`.
///
/// Every column keeps its place under its new name, omitted columns are left out, and
/// merges come last, in the order they were given.
pub fn header_projection(
    fields: &[Field],
    resolved: &ResolvedHeaderOverrides,
) -> Vec<(sql::ast::ColumnAlias, sql::ast::Expression)> {
    let wrapped = sql::helpers::make_table_alias(WRAPPED_ALIAS.to_string());
    let overrides = &resolved.overrides;

    let columns = fields.iter().filter_map(|field| {
        let name = match overrides.renames.get(&field.name) {
            Some(None) => return None,
            Some(Some(name)) => name.clone(),
            None => field.name.clone(),
        };
        Some((
            sql::helpers::make_column_alias(name),
            sql::helpers::make_aliased_column(&wrapped, &field.name),
        ))
    });

    let merges = overrides.merges.iter().map(|(columns, merge)| {
        let args = columns
            .iter()
            .map(|column| {
                sql::helpers::cast(
                    sql::helpers::make_aliased_column(&wrapped, column),
                    sql::helpers::text_type_name(),
                )
            })
            .collect();
        (
            sql::helpers::make_column_alias(merge.name.clone()),
            merge_call(&merge.function, args),
        )
    });

    columns.chain(merges).collect()
}

fn merge_call(
    function: &MergeFunction,
    mut args: Vec<sql::ast::Expression>,
) -> sql::ast::Expression {
    let function = match function {
        MergeFunction::Coalesce => sql::ast::Function::Coalesce,
        MergeFunction::Concat { separator: None } => sql::ast::Function::Concat,
        MergeFunction::Concat {
            separator: Some(separator),
        } => {
            args.insert(0, sql::helpers::string_literal(separator));
            sql::ast::Function::ConcatWs
        }
        MergeFunction::Custom { name } => sql::ast::Function::Unknown(name.clone()),
    };
    sql::ast::Expression::FunctionCall { function, args }
}

/// Wrap an export query in its header projection. Queries without overrides are kept as is.
pub fn apply_header_overrides(
    query: sql::ast::Query,
    fields: &[Field],
    resolved: &ResolvedHeaderOverrides,
) -> sql::ast::Query {
    if resolved.is_empty() {
        return query;
    }
    sql::ast::Query::Select(Box::new(sql::helpers::select_from_subquery(
        header_projection(fields, resolved),
        query,
        sql::helpers::make_table_alias(WRAPPED_ALIAS.to_string()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_metadata::metadata::PropertyType;
    use query_engine_sql::sql::convert::query_to_sql;

    fn fields() -> Vec<Field> {
        vec![
            Field::new("kind", PropertyType::Text),
            Field::new("pk", PropertyType::Integer),
            Field::new("name", PropertyType::Text),
            Field::new("nickname", PropertyType::Text),
        ]
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    fn overrides() -> HeaderOverrides {
        HeaderOverrides::empty()
            .rename("name", "display_name")
            .rename("salary", "pay")
            .omit("unknown")
            .omit("nickname")
            .merge(
                columns(&["nickname", "alias", "name"]),
                MergeFunction::Coalesce,
                "label",
            )
            .merge(
                columns(&["alias", "title"]),
                MergeFunction::Concat { separator: None },
                "nothing",
            )
    }

    #[test]
    fn unknown_renames_are_dropped() {
        let resolved = resolve_header_overrides(&overrides(), &fields());
        assert!(!resolved.overrides.renames.contains_key("salary"));
        assert_eq!(
            resolved.overrides.renames.get("name"),
            Some(&Some("display_name".to_string()))
        );
        assert_eq!(resolved.overrides.renames.get("unknown"), Some(&None));
        assert!(resolved.dropped.contains(&DroppedOverride::UnknownRename {
            column: "salary".to_string(),
            name: "pay".to_string(),
        }));
    }

    #[test]
    fn merges_are_narrowed_to_known_columns() {
        let resolved = resolve_header_overrides(&overrides(), &fields());
        let keys: Vec<&Vec<String>> = resolved.overrides.merges.keys().collect();
        assert_eq!(keys, vec![&columns(&["nickname", "name"])]);
        assert_eq!(
            resolved.dropped,
            vec![
                DroppedOverride::UnknownRename {
                    column: "salary".to_string(),
                    name: "pay".to_string(),
                },
                DroppedOverride::UnknownMergeColumns {
                    name: "label".to_string(),
                    columns: columns(&["alias"]),
                },
                DroppedOverride::DegenerateMerge {
                    name: "nothing".to_string(),
                    columns: columns(&["alias", "title"]),
                },
            ]
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let once = resolve_header_overrides(&overrides(), &fields());
        let twice = resolve_header_overrides(&once.overrides, &fields());
        assert_eq!(twice.overrides, once.overrides);
        assert!(twice.dropped.is_empty());
    }

    #[test]
    fn relationships_have_no_kind_to_merge() {
        let relationship_fields = vec![
            Field::new("start", PropertyType::Integer),
            Field::new("end", PropertyType::Integer),
            Field::new("type", PropertyType::Text),
        ];
        let resolved = resolve_header_overrides(
            &HeaderOverrides::empty()
                .rename("kind", "label")
                .merge(columns(&["kind", "type"]), MergeFunction::Coalesce, "label"),
            &relationship_fields,
        );
        assert!(resolved.overrides.renames.is_empty());
        assert_eq!(
            resolved.overrides.merges.keys().collect::<Vec<_>>(),
            vec![&columns(&["type"])]
        );
        assert_eq!(
            resolved.dropped,
            vec![
                DroppedOverride::UnknownRename {
                    column: "kind".to_string(),
                    name: "label".to_string(),
                },
                DroppedOverride::UnknownMergeColumns {
                    name: "label".to_string(),
                    columns: columns(&["kind"]),
                },
            ]
        );

        let (_, expression) = header_projection(&relationship_fields, &resolved)
            .pop()
            .unwrap();
        let mut rendered = sql::string::SQL::new();
        expression.to_sql(&mut rendered);
        assert_eq!(rendered.sql, "coalesce(CAST(wrapped.type AS text))");
    }

    #[test]
    fn merges_narrowed_to_the_same_columns_keep_the_first() {
        let resolved = resolve_header_overrides(
            &HeaderOverrides::empty()
                .merge(columns(&["name", "a"]), MergeFunction::Coalesce, "first")
                .merge(columns(&["name", "b"]), MergeFunction::Coalesce, "second"),
            &fields(),
        );
        assert_eq!(resolved.overrides.merges.len(), 1);
        assert_eq!(resolved.overrides.merges[&columns(&["name"])].name, "first");
        assert!(resolved.dropped.contains(&DroppedOverride::DuplicateMerge {
            name: "second".to_string(),
            columns: columns(&["name", "b"]),
            kept: "first".to_string(),
        }));
        assert_eq!(resolved.dropped.len(), 3);
    }

    #[test]
    fn projection_renames_omits_and_merges() {
        let resolved = resolve_header_overrides(&overrides(), &fields());
        let nodes = sql::helpers::make_table_alias("nodes".to_string());
        let mut select = sql::helpers::simple_select(vec![(
            sql::helpers::make_column_alias("name".to_string()),
            sql::helpers::make_table_column(&nodes, "name"),
        )]);
        select.from = Some(sql::ast::From::Table {
            reference: sql::helpers::make_db_table(None, "nodes"),
            alias: nodes,
        });
        let query = sql::ast::Query::Select(Box::new(select));
        let rendered = query_to_sql(&apply_header_overrides(query, &fields(), &resolved)).sql;
        similar_asserts::assert_eq!(
            rendered,
            "SELECT
    wrapped.kind AS kind,
    wrapped.pk AS pk,
    wrapped.name AS display_name,
    coalesce(CAST(wrapped.nickname AS text), CAST(wrapped.name AS text)) AS label
FROM (
    SELECT
        nodes.name AS name
    FROM nodes AS nodes
) AS wrapped"
        );
    }

    #[test]
    fn concat_with_separator() {
        let resolved = resolve_header_overrides(
            &HeaderOverrides::empty().merge(
                columns(&["name", "nickname"]),
                MergeFunction::Concat {
                    separator: Some(" ".to_string()),
                },
                "names",
            ),
            &fields(),
        );
        let (alias, expression) = header_projection(&fields(), &resolved).pop().unwrap();
        assert_eq!(alias.name, "names");
        let mut rendered = sql::string::SQL::new();
        expression.to_sql(&mut rendered);
        assert_eq!(
            rendered.sql,
            "concat_ws(' ', CAST(wrapped.name AS text), CAST(wrapped.nickname AS text))"
        );
    }

    #[test]
    fn no_overrides_no_projection() {
        let query = sql::ast::Query::Select(Box::new(sql::helpers::simple_select(vec![])));
        let resolved = resolve_header_overrides(&HeaderOverrides::empty(), &fields());
        assert_eq!(
            apply_header_overrides(query.clone(), &fields(), &resolved),
            query
        );
    }
}
