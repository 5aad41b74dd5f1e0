pub mod configuration;
pub mod error;
pub mod to_runtime_configuration;
pub mod version1;

pub use configuration::{generate_latest_schema, Configuration};
pub use version1::{
    parse_configuration, write_parsed_configuration, HeaderOverride, ParsedConfiguration,
};

pub use to_runtime_configuration::make_runtime_configuration;
