//! Export every relation row whose endpoints are mapped as a relationship.

use super::copy::FileExport;
use super::fields;
use super::{ExportOptions, OutputLayout};
use crate::translation::error::Error;
use crate::translation::helpers::Env;
use query_engine_sql::sql;

/// The statements exporting relationships. They read the mapping table, which must
/// exist when they run.
pub fn create_relationships_query(
    env: &Env,
    options: &ExportOptions,
) -> Result<Vec<sql::ast::Statement>, Error> {
    let export = FileExport {
        artifact: "relationships",
        filename: &options.relationships_filename,
        encoding: &options.encoding,
        header_overrides: &options.relationships_header_overrides,
        limit: None,
        fragment_order_by: None,
    };
    let all_fields = fields::fetch_all_relations_properties(env);

    Ok(match options.layout {
        OutputLayout::SingleFile => export.single_file(
            fields::fetch_all_relations(env, Some(all_fields.as_slice()))?
                .into_iter()
                .flatten()
                .collect(),
            &all_fields,
            &[],
        ),
        OutputLayout::MultipleFiles => export.multiple_files(
            fields::fetch_all_relations(env, None)?
                .into_iter()
                .flatten()
                .collect(),
            &all_fields,
        ),
    })
}
