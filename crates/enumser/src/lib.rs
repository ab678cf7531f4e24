//! Go enum name lookup table generator

pub mod collect;
pub mod config;
pub mod emit;
pub mod errors;
pub mod logging;
pub mod spec;

pub use collect::{collect_all, collect_enum, DuplicateValue, EnumTable, EnumValueEntry};
pub use config::{Config, Output};
pub use emit::GeneratedFile;
pub use errors::RunError;
pub use spec::EnumSpec;

use gosrc::loader::Loader;

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub tables: Vec<EnumTable>,
    pub destination: Output,
}

/// Parse the lookups, load and check the input packages, collect every table
/// and write the generated file.
///
/// Nothing is written unless every table was collected.
pub fn run(config: &Config) -> Result<RunSummary, RunError> {
    let specs = spec::parse_lookups(&config.lookups)?;
    tracing::debug!(count = specs.len(), "parsed lookups");

    let program = Loader::new(config.base_dir.clone()).load(&config.inputs)?;
    tracing::debug!(
        packages = program.packages.len(),
        scanned = program.scanned().count(),
        "loaded packages"
    );

    let tables = collect::collect_all(&program, &specs, &config.package)?;

    let destination = config.destination();
    GeneratedFile::new(&config.package, &tables).write_to(&destination)?;

    Ok(RunSummary { tables, destination })
}
