use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use query_engine_metadata::metadata::OutputLayout;
use query_engine_translation::translation;
use sql2graph_configuration as configuration;
use sql2graph_configuration::ParsedConfiguration;

/// Compile a relational schema into the SQL statements exporting it as a graph.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log more: -v for progress, -vv for every fragment. RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the export script for a configuration.
    Export(ExportArgs),
    /// Write an empty configuration and its JSON Schema into a directory.
    Initialize {
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },
    /// Print the JSON Schema of the configuration file.
    PrintSchema,
}

#[derive(Args)]
struct ExportArgs {
    /// A configuration file, or a directory holding one.
    #[arg(long, short, value_name = "PATH", env = "SQL2GRAPH_CONFIGURATION")]
    configuration: PathBuf,

    /// Entity kinds to export, comma separated.
    #[arg(long, value_delimiter = ',')]
    entities: Option<Vec<String>>,

    /// Rows exported per entity. 0 means no limit.
    #[arg(long)]
    limit: Option<u32>,

    /// The file the database server writes nodes to.
    #[arg(long)]
    nodes_file: Option<String>,

    /// The file the database server writes relationships to.
    #[arg(long)]
    rels_file: Option<String>,

    /// The encoding of the exported files.
    #[arg(long)]
    encoding: Option<String>,

    /// Export each entity and relation to its own numbered file.
    #[arg(long)]
    multiple: bool,

    /// Skip unresolvable references instead of failing.
    #[arg(long)]
    lenient: bool,

    /// Write the script to this file instead of the standard output.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    /// Flags given on the command line win over the configuration file. A mapping
    /// strategy the file leaves unset still follows the layout.
    fn apply(&self, parsed: &mut ParsedConfiguration) {
        if let Some(entities) = &self.entities {
            parsed.entities = Some(entities.clone());
        }
        if let Some(limit) = self.limit {
            parsed.entity_limit = Some(limit);
        }
        if let Some(nodes_file) = &self.nodes_file {
            parsed.nodes_filename.clone_from(nodes_file);
        }
        if let Some(rels_file) = &self.rels_file {
            parsed.relationships_filename.clone_from(rels_file);
        }
        if let Some(encoding) = &self.encoding {
            parsed.output_encoding.clone_from(encoding);
        }
        if self.multiple {
            parsed.layout = OutputLayout::MultipleFiles;
        }
        if self.lenient {
            parsed.strict = false;
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn export(args: ExportArgs) -> anyhow::Result<()> {
    let mut parsed = configuration::parse_configuration(&args.configuration).await?;
    args.apply(&mut parsed);
    let configuration = configuration::make_runtime_configuration(parsed)?;

    let script = translation::query::translate(&configuration.schema, &configuration.options)?
        .to_sql();

    match &args.output {
        Some(output) => {
            tokio::fs::write(output, script)
                .await
                .with_context(|| format!("writing {}", output.display()))?;
            tracing::info!(output = %output.display(), "script written");
        }
        None => print!("{script}"),
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Export(args) => export(args).await,
        Command::Initialize { out_dir } => {
            configuration::write_parsed_configuration(
                ParsedConfiguration::initial(),
                &out_dir,
            )
            .await?;
            tracing::info!(out_dir = %out_dir.display(), "configuration initialized");
            Ok(())
        }
        Command::PrintSchema => {
            let schema = configuration::generate_latest_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

#[tokio::main]
pub async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_metadata::metadata::MappingStrategy;

    fn export_args(args: &[&str]) -> ExportArgs {
        let cli = Cli::parse_from(["sql2graph", "export", "-c", "conf.yaml"].iter().chain(args));
        let Command::Export(args) = cli.command else {
            panic!("expected the export command");
        };
        args
    }

    #[test]
    fn command_line_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_the_configuration() {
        let args = export_args(&[
            "--entities",
            "person,company",
            "--limit",
            "10",
            "--rels-file",
            "/tmp/edges.csv",
            "--multiple",
            "--lenient",
        ]);

        let mut parsed = ParsedConfiguration::initial();
        args.apply(&mut parsed);
        let options = configuration::make_runtime_configuration(parsed)
            .unwrap()
            .options;
        assert_eq!(
            options.entities,
            Some(vec!["person".to_string(), "company".to_string()])
        );
        assert_eq!(options.entity_limit(), Some(10));
        assert_eq!(options.nodes_filename, "nodes.csv");
        assert_eq!(options.relationships_filename, "/tmp/edges.csv");
        assert_eq!(options.layout, OutputLayout::MultipleFiles);
        assert_eq!(options.mapping_strategy, MappingStrategy::PerEntityInsert);
        assert!(!options.strict);
    }

    #[test]
    fn multiple_keeps_a_configured_mapping_strategy() {
        let mut parsed = ParsedConfiguration::initial();
        parsed.mapping_strategy = Some(MappingStrategy::GlobalOrdered);
        export_args(&["--multiple"]).apply(&mut parsed);

        let options = configuration::make_runtime_configuration(parsed)
            .unwrap()
            .options;
        assert_eq!(options.layout, OutputLayout::MultipleFiles);
        assert_eq!(options.mapping_strategy, MappingStrategy::GlobalOrdered);
    }

    #[test]
    fn configuration_settings_stay_without_flags() {
        let mut parsed = ParsedConfiguration::initial();
        parsed.output_encoding = "LATIN1".to_string();
        export_args(&[]).apply(&mut parsed);

        let options = configuration::make_runtime_configuration(parsed)
            .unwrap()
            .options;
        assert_eq!(options.encoding, "LATIN1");
        assert!(options.strict);
        assert_eq!(options.layout, OutputLayout::SingleFile);
        assert_eq!(options.mapping_strategy, MappingStrategy::GlobalOrdered);
    }
}
