use std::path::PathBuf;

use query_engine_translation::translation;
use sql2graph_configuration::Configuration;

/// Load the configuration of a golden file test.
pub async fn load_configuration(testname: &str) -> anyhow::Result<Configuration> {
    let directory = PathBuf::from("tests/goldenfiles").join(testname);

    let parsed_configuration = sql2graph_configuration::parse_configuration(&directory).await?;
    Ok(sql2graph_configuration::make_runtime_configuration(
        parsed_configuration,
    )?)
}

/// Compile the export of a golden file configuration into its script.
pub async fn test_translation(testname: &str) -> anyhow::Result<String> {
    let configuration = load_configuration(testname).await?;
    let plan = translation::query::translate(&configuration.schema, &configuration.options)?;
    Ok(plan.to_sql())
}
