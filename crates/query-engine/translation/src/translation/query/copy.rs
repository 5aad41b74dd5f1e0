//! Bulk export of a query to a file on the database server.

use super::fragments::{self, Fragment};
use super::header_overrides::{apply_header_overrides, resolve_header_overrides};
use query_engine_metadata::metadata::{Field, HeaderOverrides};
use query_engine_sql::sql;

/// Where and how one artifact (nodes or relationships) is written.
#[derive(Debug, Clone, Copy)]
pub struct FileExport<'a> {
    /// `nodes` or `relationships`, for logging.
    pub artifact: &'a str,
    pub filename: &'a str,
    pub encoding: &'a str,
    pub header_overrides: &'a HeaderOverrides,
    /// Rows per fragment.
    pub limit: Option<u32>,
    /// The output column each fragment is ordered by.
    pub fragment_order_by: Option<&'a str>,
}

impl FileExport<'_> {
    /// Export the union of `fragments`, all projecting `fields`, into a single file.
    pub fn single_file(
        &self,
        fragments: Vec<Fragment>,
        fields: &[Field],
        order_by: &[&str],
    ) -> Vec<sql::ast::Statement> {
        let selects = fragments::build_fragments(fragments, self.limit, self.fragment_order_by);
        let Some(union) = fragments::union_fragments(selects, order_by) else {
            tracing::warn!(artifact = self.artifact, "nothing to export");
            return vec![];
        };

        let resolved = resolve_header_overrides(self.header_overrides, fields);
        for dropped in &resolved.dropped {
            tracing::warn!(artifact = self.artifact, "ignoring header override: {dropped}");
        }

        tracing::info!(
            artifact = self.artifact,
            filename = self.filename,
            "exporting to a single file"
        );
        vec![copy_to_file(
            apply_header_overrides(union, fields, &resolved),
            self.filename,
            self.encoding,
        )]
    }

    /// Export every fragment into its own numbered file. Header overrides are resolved
    /// against the columns of each fragment, and checked once against `all_fields`.
    pub fn multiple_files(
        &self,
        fragments: Vec<Fragment>,
        all_fields: &[Field],
    ) -> Vec<sql::ast::Statement> {
        for dropped in &resolve_header_overrides(self.header_overrides, all_fields).dropped {
            tracing::warn!(artifact = self.artifact, "ignoring header override: {dropped}");
        }

        let statements: Vec<sql::ast::Statement> = fragments
            .into_iter()
            .filter_map(|fragment| {
                let fields = fragment.fields();
                fragments::build_fragment(fragment, self.limit, self.fragment_order_by)
                    .map(|select| (fields, select))
            })
            .enumerate()
            .map(|(index, (fields, select))| {
                let filename = numbered_filename(self.filename, index + 1);
                let resolved = resolve_header_overrides(self.header_overrides, &fields);
                tracing::debug!(
                    artifact = self.artifact,
                    filename = %filename,
                    "exporting a fragment"
                );
                copy_to_file(
                    apply_header_overrides(
                        sql::ast::Query::Select(Box::new(select)),
                        &fields,
                        &resolved,
                    ),
                    &filename,
                    self.encoding,
                )
            })
            .collect();

        if statements.is_empty() {
            tracing::warn!(artifact = self.artifact, "nothing to export");
        } else {
            tracing::info!(
                artifact = self.artifact,
                files = statements.len(),
                "exporting to multiple files"
            );
        }
        statements
    }
}

/// `COPY(<query>) TO '<filename>'` as tab-delimited CSV with a header line.
pub fn copy_to_file(
    query: sql::ast::Query,
    filename: &str,
    encoding: &str,
) -> sql::ast::Statement {
    sql::ast::Statement::CopyTo(sql::ast::CopyTo {
        query,
        filename: filename.to_string(),
        options: sql::ast::CopyOptions {
            header: true,
            encoding: encoding.to_string(),
        },
    })
}

/// The name of the `index`th file of a multi-file export: `.{index:04}` goes before the
/// extension of the file name, or at its end when it has none.
pub fn numbered_filename(base: &str, index: usize) -> String {
    let name_start = base.rfind('/').map_or(0, |slash| slash + 1);
    match base[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, extension) = base.split_at(name_start + dot);
            format!("{stem}.{index:04}{extension}")
        }
        _ => format!("{base}.{index:04}"),
    }
}
