//! CLI argument parsing

use clap::Parser;
use enumser::config::PartialConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "enum_serialize")]
#[command(version, about = "Generate name lookup tables for Go enum constants", long_about = None)]
#[command(after_help = "Example: enum_serialize -l Names[Color],Kinds[kinds.Kind] -o names_gen.go -p colors ./colors ./kinds")]
pub struct Cli {
    /// Comma-separated lookups, each Table[Type] or Table[pkg.Type]
    #[arg(short, long, value_name = "SPECS")]
    pub lookup: Option<String>,

    /// Output file, or '-' for stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Package name of the generated file
    #[arg(short, long = "pkg", value_name = "NAME")]
    pub pkg: Option<String>,

    /// TOML file with defaults for the options above
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the generated source instead of writing the output file
    #[arg(long)]
    pub dry_run: bool,

    /// Print a summary of each table to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Packages to scan: directories, dir/..., globs or import paths
    #[arg(value_name = "INPUTS")]
    pub inputs: Vec<String>,
}

impl Cli {
    /// Values given on the command line; flags left off do not override the config file
    pub fn overrides(&self) -> PartialConfig {
        PartialConfig {
            lookup: self.lookup.clone(),
            output: self.output.clone(),
            package: self.pkg.clone(),
            inputs: Some(self.inputs.clone()),
            dry_run: self.dry_run.then_some(true),
            verbose: self.verbose.then_some(true),
        }
    }
}
