//! Go enum lookup table generator CLI

use clap::error::ErrorKind;
use clap::Parser;
use colored::*;
use enumser::errors::{print_error, print_warning, RunError};
use enumser::{Config, Output, RunSummary};

mod cli;

use cli::Cli;

fn main() {
    enumser::logging::init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                e.exit();
            }
            // Usage errors share status 1 with missing required values
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let config = match Config::load(cli.config.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            let e = RunError::Config(e);
            print_error("Invalid configuration", &e);
            std::process::exit(e.exit_code());
        }
    };

    match enumser::run(&config) {
        Ok(summary) => {
            warn_duplicates(&summary);
            if config.dry_run {
                if let Output::File(path) = &config.output {
                    print_warning(&format!("Dry run, {} was not written", path.display()));
                }
            }
            if config.verbose {
                print_summary(&summary);
            }
        }
        Err(e) => {
            print_error("Failed to generate lookup tables", &e);
            std::process::exit(e.exit_code());
        }
    }
}

fn warn_duplicates(summary: &RunSummary) {
    for table in &summary.tables {
        for duplicate in table.duplicate_values() {
            print_warning(&format!(
                "{}: {} and {} share the value {}, so the generated map has duplicate keys",
                table.table, duplicate.first, duplicate.second, duplicate.value
            ));
        }
    }
}

fn print_summary(summary: &RunSummary) {
    for table in &summary.tables {
        eprintln!(
            "{} {} {} ({} entries)",
            "→".cyan(),
            table.table.bold(),
            table.canonical_type_name,
            table.entries.len()
        );
        for entry in &table.entries {
            eprintln!("    {} = {}", entry.qualified_reference, entry.value.to_string().dimmed());
        }
    }

    match &summary.destination {
        Output::File(path) => eprintln!("{} Wrote {}", "✓".green(), path.display()),
        Output::Stdout => {}
    }
}
