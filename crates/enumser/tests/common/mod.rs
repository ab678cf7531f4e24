// Test infrastructure and utilities for enumser tests

#![allow(dead_code)]

use enumser::collect::{self, CollectError, EnumTable};
use enumser::spec;
use gosrc::loader::{Loader, Program};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const MODULE: &str = "example.com/m";

/// A Go module in a temporary directory
pub struct GoModule {
    pub root: TempDir,
}

impl GoModule {
    /// Create a module whose `go.mod` declares `example.com/m`
    pub fn new() -> std::io::Result<Self> {
        let root = TempDir::new()?;
        fs::write(root.path().join("go.mod"), format!("module {}\n\ngo 1.22\n", MODULE))?;
        Ok(Self { root })
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Write a file relative to the module root
    pub fn file(&self, rel: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.root.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Add the `colors` package with Red, Green and Blue
    pub fn with_colors(self) -> std::io::Result<Self> {
        self.file("colors/colors.go", colors_source())?;
        Ok(self)
    }

    pub fn load(&self, patterns: &[&str]) -> Program {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        Loader::new(self.root.path()).load(&patterns).unwrap()
    }

    /// Load `patterns` and collect the tables for `lookups`
    pub fn collect(&self, patterns: &[&str], lookups: &str, package: &str) -> Result<Vec<EnumTable>, CollectError> {
        let program = self.load(patterns);
        let specs = spec::parse_lookups(lookups).unwrap();
        collect::collect_all(&program, &specs, package)
    }
}

pub fn colors_source() -> &'static str {
    "package colors\n\n\
     type Color int\n\n\
     const (\n\
     \tRed Color = iota\n\
     \tGreen\n\
     \tBlue\n\
     )\n"
}

/// Names of a table's entries, in order
pub fn names(table: &EnumTable) -> Vec<&str> {
    table.entries.iter().map(|e| e.name.as_str()).collect()
}

/// References of a table's entries, in order
pub fn references(table: &EnumTable) -> Vec<&str> {
    table.entries.iter().map(|e| e.qualified_reference.as_str()).collect()
}
