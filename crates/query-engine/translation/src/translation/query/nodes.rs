//! Export every exported entity row as a node.

use super::copy::FileExport;
use super::fields;
use super::{ExportOptions, OutputLayout};
use crate::translation::error::Error;
use crate::translation::helpers::Env;
use query_engine_metadata::metadata::{KIND_COLUMN, PK_COLUMN};
use query_engine_sql::sql;

/// The statements exporting nodes.
///
/// In a single file, nodes are ordered by `(kind, pk)` like their ids. In multiple files,
/// each entity gets its own file with its own columns, ordered by `pk`.
pub fn create_nodes_query(
    env: &Env,
    options: &ExportOptions,
) -> Result<Vec<sql::ast::Statement>, Error> {
    let export = FileExport {
        artifact: "nodes",
        filename: &options.nodes_filename,
        encoding: &options.encoding,
        header_overrides: &options.nodes_header_overrides,
        limit: options.entity_limit(),
        fragment_order_by: Some(PK_COLUMN),
    };
    let all_fields = fields::fetch_all_fields(env);

    Ok(match options.layout {
        OutputLayout::SingleFile => export.single_file(
            fields::fetch_all(env, Some(all_fields.as_slice()))?,
            &all_fields,
            &[KIND_COLUMN, PK_COLUMN],
        ),
        OutputLayout::MultipleFiles => {
            export.multiple_files(fields::fetch_all(env, None)?, &all_fields)
        }
    })
}
