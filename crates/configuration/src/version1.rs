//! Version 1 of the configuration file format.

use std::path::{Path, PathBuf};

use query_engine_metadata::metadata::{
    self, MappingStrategy, MergeFunction, OutputLayout, Schema,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};

pub const CURRENT_VERSION: u32 = 1;
/// The file names looked for in a configuration directory, in order.
pub const CONFIGURATION_FILENAMES: [&str; 3] =
    ["configuration.json", "configuration.yaml", "configuration.yml"];
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";

/// The configuration file: the schema to export, and how to export it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    /// Which version of the configuration format are we using
    pub version: u32,
    #[serde(default)]
    pub schema: Schema,
    /// Entity kinds to export. All of them when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
    /// Fail on references that cannot be resolved instead of skipping them.
    #[serde(default = "default_strict")]
    pub strict: bool,
    /// Rows exported per entity. 0 means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_limit: Option<u32>,
    #[serde(default = "default_nodes_filename")]
    pub nodes_filename: String,
    #[serde(default = "default_relationships_filename")]
    pub relationships_filename: String,
    #[serde(default = "default_output_encoding")]
    pub output_encoding: String,
    #[serde(default)]
    pub layout: OutputLayout,
    /// Defaults to global ordering for a single file and per entity inserts otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_strategy: Option<MappingStrategy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes_header_overrides: Vec<HeaderOverride>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships_header_overrides: Vec<HeaderOverride>,
}

/// One change to the header of an exported file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum HeaderOverride {
    /// Add a column combining others.
    Merge {
        columns: Vec<String>,
        #[serde(flatten)]
        function: MergeFunction,
        #[serde(rename = "as")]
        name: String,
    },
    /// Give a column another name, or leave it out when `rename` is null.
    Rename {
        column: String,
        #[serde(default)]
        rename: Option<String>,
    },
}

fn default_strict() -> bool {
    true
}

fn default_nodes_filename() -> String {
    metadata::DEFAULT_NODES_FILENAME.to_string()
}

fn default_relationships_filename() -> String {
    metadata::DEFAULT_RELATIONSHIPS_FILENAME.to_string()
}

fn default_output_encoding() -> String {
    metadata::DEFAULT_ENCODING.to_string()
}

impl ParsedConfiguration {
    pub fn initial() -> Self {
        ParsedConfiguration::empty()
    }

    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            schema: Schema::empty(),
            entities: None,
            strict: default_strict(),
            entity_limit: None,
            nodes_filename: default_nodes_filename(),
            relationships_filename: default_relationships_filename(),
            output_encoding: default_output_encoding(),
            layout: OutputLayout::default(),
            mapping_strategy: None,
            nodes_header_overrides: vec![],
            relationships_header_overrides: vec![],
        }
    }
}

/// Find the configuration file: `path` itself, or the first known configuration file
/// name inside it when it is a directory.
async fn configuration_file(path: &Path) -> Result<PathBuf, ParseConfigurationError> {
    let is_dir = fs::metadata(path)
        .await
        .map_err(|err| {
            ParseConfigurationError::IoErrorButStringified(format!("{}: {}", path.display(), err))
        })?
        .is_dir();
    if !is_dir {
        return Ok(path.to_path_buf());
    }

    for filename in CONFIGURATION_FILENAMES {
        let candidate = path.join(filename);
        if fs::try_exists(&candidate).await.unwrap_or(false) {
            return Ok(candidate);
        }
    }
    Err(ParseConfigurationError::NoConfigurationFile(
        path.to_path_buf(),
    ))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|extension| extension.to_str()),
        Some("yaml" | "yml")
    )
}

/// Parse the configuration file at `path`, or in the directory `path`. YAML files are
/// recognised by their extension, everything else is read as JSON.
pub async fn parse_configuration(
    path: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_file(path.as_ref()).await?;

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parsed_config: ParsedConfiguration = if is_yaml(&configuration_file) {
        serde_yaml::from_str(&configuration_file_contents).map_err(|error| {
            let location = error.location();
            ParseConfigurationError::ParseError {
                file_path: configuration_file.clone(),
                line: location.as_ref().map_or(0, serde_yaml::Location::line),
                column: location.as_ref().map_or(0, serde_yaml::Location::column),
                message: error.to_string(),
            }
        })?
    } else {
        serde_json::from_str(&configuration_file_contents).map_err(|error| {
            ParseConfigurationError::ParseError {
                file_path: configuration_file.clone(),
                line: error.line(),
                column: error.column(),
                message: error.to_string(),
            }
        })?
    };

    tracing::debug!(
        file = %configuration_file.display(),
        entities = parsed_config.schema.entities.len(),
        relations = parsed_config.schema.relations.len(),
        "configuration parsed"
    );
    Ok(parsed_config)
}

/// Write the parsed configuration into a directory on disk, along with its JSON Schema.
pub async fn write_parsed_configuration(
    parsed_config: ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().to_owned().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(&parsed_config)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path = out_dir
        .as_ref()
        .to_owned()
        .join(CONFIGURATION_JSONSCHEMA_FILENAME);

    let output = schemars::schema_for!(ParsedConfiguration);
    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&output)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    Ok(())
}
