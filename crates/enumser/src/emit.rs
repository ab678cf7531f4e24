//! Rendering and writing of the generated Go file

use crate::collect::{self, EnumTable};
use crate::config::Output;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

pub const HEADER: &str = "// Code generated by enum_serialize. DO NOT EDIT.";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to render generated source")]
    Render(#[from] std::fmt::Error),

    #[error("Failed to write {target}: {source}")]
    Write {
        target: String,
        #[source]
        source: io::Error,
    },
}

/// The contents of one generated file
#[derive(Debug, Clone)]
pub struct GeneratedFile<'a> {
    pub package: &'a str,
    pub imports: BTreeSet<String>,
    pub tables: &'a [EnumTable],
}

impl<'a> GeneratedFile<'a> {
    pub fn new(package: &'a str, tables: &'a [EnumTable]) -> Self {
        Self { package, imports: collect::required_imports(tables), tables }
    }

    pub fn render(&self) -> Result<String, OutputError> {
        let mut out = String::new();

        writeln!(out, "{}", HEADER)?;
        writeln!(out)?;
        writeln!(out, "package {}", self.package)?;

        match self.imports.len() {
            0 => {}
            1 => {
                writeln!(out)?;
                for import in &self.imports {
                    writeln!(out, "import \"{}\"", import)?;
                }
            }
            _ => {
                writeln!(out)?;
                writeln!(out, "import (")?;
                for import in &self.imports {
                    writeln!(out, "\t\"{}\"", import)?;
                }
                writeln!(out, ")")?;
            }
        }

        for table in self.tables {
            writeln!(out)?;
            render_table(&mut out, table)?;
        }

        Ok(out)
    }

    /// Render and write to the configured destination
    pub fn write_to(&self, output: &Output) -> Result<(), OutputError> {
        let rendered = self.render()?;

        match output {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(rendered.as_bytes())
                    .and_then(|_| stdout.flush())
                    .map_err(|source| OutputError::Write { target: "stdout".to_string(), source })
            }
            Output::File(path) => {
                let mut file =
                    fs::File::create(path).map_err(|source| OutputError::Create { path: path.clone(), source })?;
                file.write_all(rendered.as_bytes())
                    .and_then(|_| file.flush())
                    .map_err(|source| OutputError::Write { target: path.display().to_string(), source })?;
                tracing::debug!(path = %path.display(), bytes = rendered.len(), "wrote generated file");
                Ok(())
            }
        }
    }
}

/// One `var` declaration, with values aligned the way gofmt aligns them
fn render_table(out: &mut String, table: &EnumTable) -> std::fmt::Result {
    let width = table.entries.iter().map(|e| e.qualified_reference.chars().count()).max().unwrap_or(0) + 1;

    writeln!(out, "var {} = map[{}]string{{", table.table, table.canonical_type_name)?;
    for entry in &table.entries {
        let key = format!("{}:", entry.qualified_reference);
        let padding = width - key.chars().count() + 1;
        writeln!(out, "\t{}{}\"{}\",", key, " ".repeat(padding), entry.name)?;
    }
    writeln!(out, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::EnumValueEntry;
    use gosrc::Value;
    use pretty_assertions::assert_eq;

    fn table(name: &str, typ: &str, imports: &[&str], entries: &[(&str, &str, i128)]) -> EnumTable {
        EnumTable {
            table: name.to_string(),
            canonical_type_name: typ.to_string(),
            required_imports: imports.iter().map(|s| s.to_string()).collect(),
            entries: entries
                .iter()
                .map(|(name, reference, value)| EnumValueEntry {
                    name: name.to_string(),
                    qualified_reference: reference.to_string(),
                    value: Value::Int(*value),
                })
                .collect(),
        }
    }

    #[test]
    fn test_render_single_import() {
        let tables = vec![table(
            "Names",
            "pkgname.Color",
            &["example.com/pkgname"],
            &[("Red", "Red", 0), ("Green", "Green", 1)],
        )];
        let rendered = GeneratedFile::new("pkgname", &tables).render().unwrap();
        assert_eq!(
            rendered,
            "// Code generated by enum_serialize. DO NOT EDIT.\n\
             \n\
             package pkgname\n\
             \n\
             import \"example.com/pkgname\"\n\
             \n\
             var Names = map[pkgname.Color]string{\n\
             \tRed:   \"Red\",\n\
             \tGreen: \"Green\",\n\
             }\n"
        );
    }

    #[test]
    fn test_render_import_block_is_sorted() {
        let tables = vec![
            table("A", "z.T", &["example.com/z"], &[("X", "z.X", 1)]),
            table("B", "a.T", &["example.com/a"], &[("Y", "a.Y", 2)]),
        ];
        let rendered = GeneratedFile::new("out", &tables).render().unwrap();
        assert!(rendered.contains("import (\n\t\"example.com/a\"\n\t\"example.com/z\"\n)\n"));
        let a = rendered.find("var A =").unwrap();
        let b = rendered.find("var B =").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_render_without_imports() {
        let tables = vec![table("T", "p.T", &[], &[("A", "A", 0)])];
        let rendered = GeneratedFile::new("p", &tables).render().unwrap();
        assert!(!rendered.contains("import"));
        assert!(rendered.contains("package p\n\nvar T = map[p.T]string{\n\tA: \"A\",\n}\n"));
    }
}
