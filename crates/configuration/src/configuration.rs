//! Configuration for an export.

use query_engine_metadata::metadata;
use schemars::{gen::SchemaSettings, schema::RootSchema};

use crate::version1::ParsedConfiguration;

/// The 'Configuration' type collects all the information necessary to compile an export.
///
/// 'ParsedConfiguration' is the serialized format, and is responsible for interpreting
/// itself into the current 'Configuration'. Values of this type are produced from a
/// 'ParsedConfiguration' using 'make_runtime_configuration'.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub schema: metadata::Schema,
    pub options: metadata::ExportOptions,
}

/// The JSON Schema of the configuration file format.
pub fn generate_latest_schema() -> RootSchema {
    SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<ParsedConfiguration>()
}
