//! Convert a parsed configuration into the runtime configuration.

use query_engine_metadata::metadata::{self, HeaderOverrides, MappingStrategy};

use crate::configuration::Configuration;
use crate::error::InvalidConfigurationError;
use crate::version1::{HeaderOverride, ParsedConfiguration, CURRENT_VERSION};

/// Convert the parsed configuration into the runtime configuration, rejecting what can
/// never describe a valid export.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
) -> Result<Configuration, InvalidConfigurationError> {
    if parsed_config.version != CURRENT_VERSION {
        return Err(InvalidConfigurationError::UnsupportedVersion(
            parsed_config.version,
        ));
    }
    if parsed_config.nodes_filename.is_empty() {
        return Err(InvalidConfigurationError::EmptyFilename("nodes"));
    }
    if parsed_config.relationships_filename.is_empty() {
        return Err(InvalidConfigurationError::EmptyFilename("relationships"));
    }

    let options = metadata::ExportOptions {
        entities: parsed_config.entities,
        strict: parsed_config.strict,
        entity_limit: parsed_config.entity_limit,
        nodes_filename: parsed_config.nodes_filename,
        relationships_filename: parsed_config.relationships_filename,
        encoding: parsed_config.output_encoding,
        layout: parsed_config.layout,
        mapping_strategy: parsed_config
            .mapping_strategy
            .unwrap_or_else(|| MappingStrategy::for_layout(parsed_config.layout)),
        nodes_header_overrides: convert_header_overrides(parsed_config.nodes_header_overrides)?,
        relationships_header_overrides: convert_header_overrides(
            parsed_config.relationships_header_overrides,
        )?,
    };

    Ok(Configuration {
        schema: parsed_config.schema,
        options,
    })
}

/// Later entries for the same column, or the same merged columns, replace earlier ones.
fn convert_header_overrides(
    entries: Vec<HeaderOverride>,
) -> Result<HeaderOverrides, InvalidConfigurationError> {
    let mut overrides = HeaderOverrides::empty();
    for entry in entries {
        overrides = match entry {
            HeaderOverride::Rename {
                column,
                rename: Some(name),
            } => {
                if name.is_empty() {
                    return Err(InvalidConfigurationError::EmptyRename(column));
                }
                overrides.rename(column, name)
            }
            HeaderOverride::Rename { column, rename: None } => overrides.omit(column),
            HeaderOverride::Merge {
                columns,
                function,
                name,
            } => {
                if columns.is_empty() {
                    return Err(InvalidConfigurationError::MergeWithoutColumns(name));
                }
                if name.is_empty() {
                    return Err(InvalidConfigurationError::MergeWithoutName(columns));
                }
                overrides.merge(columns, function, name)
            }
        };
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_metadata::metadata::{MergeFunction, OutputLayout};

    #[test]
    fn mapping_strategy_follows_the_layout() {
        let mut parsed = ParsedConfiguration::empty();
        parsed.layout = OutputLayout::MultipleFiles;
        let configuration = make_runtime_configuration(parsed.clone()).unwrap();
        assert_eq!(
            configuration.options.mapping_strategy,
            MappingStrategy::PerEntityInsert
        );

        parsed.mapping_strategy = Some(MappingStrategy::GlobalOrdered);
        let configuration = make_runtime_configuration(parsed).unwrap();
        assert_eq!(
            configuration.options.mapping_strategy,
            MappingStrategy::GlobalOrdered
        );
    }

    #[test]
    fn header_overrides_are_collected() {
        let mut parsed = ParsedConfiguration::empty();
        parsed.nodes_header_overrides = vec![
            HeaderOverride::Rename {
                column: "name".to_string(),
                rename: Some("display_name".to_string()),
            },
            HeaderOverride::Rename {
                column: "secret".to_string(),
                rename: None,
            },
            HeaderOverride::Merge {
                columns: vec!["email".to_string(), "phone".to_string()],
                function: MergeFunction::Coalesce,
                name: "contact".to_string(),
            },
        ];
        let configuration = make_runtime_configuration(parsed).unwrap();
        assert_eq!(
            configuration.options.nodes_header_overrides,
            HeaderOverrides::empty()
                .rename("name", "display_name")
                .omit("secret")
                .merge(
                    vec!["email".to_string(), "phone".to_string()],
                    MergeFunction::Coalesce,
                    "contact"
                )
        );
        assert!(configuration.options.relationships_header_overrides.is_empty());
    }

    #[test]
    fn invalid_configurations() {
        let mut parsed = ParsedConfiguration::empty();
        parsed.version = 2;
        assert_eq!(
            make_runtime_configuration(parsed),
            Err(InvalidConfigurationError::UnsupportedVersion(2))
        );

        let mut parsed = ParsedConfiguration::empty();
        parsed.nodes_header_overrides = vec![HeaderOverride::Merge {
            columns: vec![],
            function: MergeFunction::Coalesce,
            name: "contact".to_string(),
        }];
        assert_eq!(
            make_runtime_configuration(parsed),
            Err(InvalidConfigurationError::MergeWithoutColumns(
                "contact".to_string()
            ))
        );

        let mut parsed = ParsedConfiguration::empty();
        parsed.relationships_header_overrides = vec![HeaderOverride::Rename {
            column: "since".to_string(),
            rename: Some(String::new()),
        }];
        assert_eq!(
            make_runtime_configuration(parsed),
            Err(InvalidConfigurationError::EmptyRename("since".to_string()))
        );

        let mut parsed = ParsedConfiguration::empty();
        parsed.nodes_filename = String::new();
        assert_eq!(
            make_runtime_configuration(parsed),
            Err(InvalidConfigurationError::EmptyFilename("nodes"))
        );
    }
}
