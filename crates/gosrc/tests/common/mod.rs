// Test infrastructure for gosrc tests

#![allow(dead_code)]

use gosrc::loader::{Loader, Program};
use gosrc::LoadError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const MODULE: &str = "example.com/m";

/// A Go module in a temporary directory
pub struct GoModule {
    pub root: TempDir,
}

impl GoModule {
    /// Create a module with a `go.mod` declaring `example.com/m`
    pub fn new() -> std::io::Result<Self> {
        let module = Self::bare()?;
        module.file("go.mod", &format!("module {}\n\ngo 1.22\n", MODULE))?;
        Ok(module)
    }

    /// A directory without a `go.mod`
    pub fn bare() -> std::io::Result<Self> {
        Ok(Self { root: TempDir::new()? })
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Write a file at a path relative to the module root
    pub fn file(&self, rel: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.root.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn load(&self, patterns: &[&str]) -> Result<Program, LoadError> {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        Loader::new(self.root.path()).load(&patterns)
    }
}

/// The standard colors package used across tests
pub fn colors_source() -> &'static str {
    "package colors\n\n\
     type Color int\n\n\
     const (\n\
     \tRed Color = iota\n\
     \tGreen\n\
     \tBlue\n\
     )\n"
}
