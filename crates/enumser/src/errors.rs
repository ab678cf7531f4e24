//! Error handling utilities

use crate::collect::CollectError;
use crate::emit::OutputError;
use crate::spec::SpecError;
use colored::*;
use gosrc::LoadError;

/// Any failure of a run, mapped to the process exit status
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] anyhow::Error),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Config(_) => 1,
            RunError::Spec(SpecError::TooManyQualifiers { .. }) => 3,
            RunError::Spec(_) => 2,
            RunError::Output(OutputError::Create { .. }) => 4,
            RunError::Output(_) => 5,
            RunError::Collect(CollectError::NoMatches { .. }) => 6,
            RunError::Collect(CollectError::Unresolved { .. } | CollectError::Check { .. }) | RunError::Load(_) => 7,
        }
    }
}

/// Print a formatted error message
pub fn print_error(context: &str, error: &(dyn std::error::Error + 'static)) {
    eprintln!("{} {}", "Error:".red().bold(), context);
    eprintln!("  {}", error.to_string().red());

    // Show chain of causes
    let mut current = error.source();
    while let Some(cause) = current {
        eprintln!("  {} {}", "Caused by:".dimmed(), cause.to_string().dimmed());
        current = cause.source();
    }
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}
