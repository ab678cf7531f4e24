//! Locating, reading and checking Go packages
//!
//! Patterns name the packages to scan. Packages of the same module that those
//! packages import are loaded as dependencies so that constants referring to
//! them can be evaluated; dependencies are never scanned themselves.

use crate::ast::File;
use crate::check::{self, TypesInfo};
use crate::error::LoadError;
use crate::parser::Parser;
use crate::types::PackageRef;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A parsed source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub ast: File,
}

/// A loaded package
#[derive(Debug, Clone)]
pub struct Package {
    /// Name from the package clause
    pub name: String,
    /// Import path
    pub path: String,
    pub dir: PathBuf,
    /// Files sorted by file name
    pub files: Vec<SourceFile>,
    /// Whether the package was requested, as opposed to pulled in as a dependency
    pub scanned: bool,
    pub info: TypesInfo,
}

impl Package {
    pub fn package_ref(&self) -> PackageRef {
        PackageRef::new(self.name.clone(), self.path.clone())
    }
}

/// One translation unit: a source file of a scanned package
#[derive(Debug, Clone, Copy)]
pub struct Unit<'a> {
    pub package: &'a Package,
    /// Index of the file within its package, as used by `TypesInfo`
    pub file_index: usize,
    pub file: &'a SourceFile,
}

/// The result of loading: scanned packages in pattern order, then dependencies
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub packages: Vec<Package>,
}

impl Program {
    pub fn scanned(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().filter(|p| p.scanned)
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.path == path)
    }

    /// Every file of every scanned package, in scan order
    pub fn units(&self) -> Vec<Unit<'_>> {
        self.scanned()
            .flat_map(|package| {
                package.files.iter().enumerate().map(move |(file_index, file)| Unit {
                    package,
                    file_index,
                    file,
                })
            })
            .collect()
    }
}

/// The module a directory belongs to, from the nearest `go.mod`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub path: String,
    pub root: PathBuf,
}

/// Resolves package patterns relative to a base directory
pub struct Loader {
    base: PathBuf,
    modules: HashMap<PathBuf, Option<Module>>,
}

impl Loader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into(), modules: HashMap::new() }
    }

    /// Load and check the packages matched by `patterns`
    pub fn load(&mut self, patterns: &[String]) -> Result<Program, LoadError> {
        let mut packages: Vec<Package> = Vec::new();

        for pattern in patterns {
            let dirs = self.expand_pattern(pattern)?;
            if dirs.is_empty() {
                return Err(LoadError::NoPackages { pattern: pattern.clone() });
            }
            for dir in dirs {
                if packages.iter().any(|p| p.dir == dir) {
                    continue;
                }
                let package = self.read_package(&dir, true)?.ok_or_else(|| LoadError::NoGoFiles { dir: dir.clone() })?;
                tracing::debug!(path = %package.path, files = package.files.len(), "loaded package");
                packages.push(package);
            }
        }

        self.load_dependencies(&mut packages)?;

        let infos = check::check(&packages);
        for (package, info) in packages.iter_mut().zip(infos) {
            package.info = info;
        }

        Ok(Program { packages })
    }

    /// Pull in same-module packages imported by loaded packages, transitively
    fn load_dependencies(&mut self, packages: &mut Vec<Package>) -> Result<(), LoadError> {
        let mut next = 0;

        while next < packages.len() {
            let importer_dir = packages[next].dir.clone();
            let mut imports: Vec<String> = packages[next]
                .files
                .iter()
                .flat_map(|f| f.ast.imports.iter().map(|i| i.path.clone()))
                .collect();
            imports.sort();
            imports.dedup();
            next += 1;

            let Some(module) = self.module_for(&importer_dir)? else {
                continue;
            };

            for import in imports {
                if packages.iter().any(|p| p.path == import) {
                    continue;
                }
                let Some(dir) = module_dir(&module, &import) else {
                    tracing::trace!(%import, "import outside the module, not loaded");
                    continue;
                };
                if !dir.is_dir() {
                    continue;
                }
                match self.read_package(&dir, false) {
                    Ok(Some(package)) => {
                        tracing::debug!(path = %package.path, "loaded dependency");
                        packages.push(package);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(%import, error = %e, "skipping dependency that failed to load"),
                }
            }
        }

        Ok(())
    }

    /// Directories matched by one pattern
    fn expand_pattern(&mut self, pattern: &str) -> Result<Vec<PathBuf>, LoadError> {
        if pattern == "..." || pattern.ends_with("/...") {
            let prefix = pattern.trim_end_matches("...").trim_end_matches('/');
            let prefix = if prefix.is_empty() { "." } else { prefix };
            let Some(root) = self.resolve_dir(prefix)? else {
                return Ok(Vec::new());
            };
            return self.walk_packages(&root);
        }

        if pattern.contains(['*', '?', '[']) {
            let full = self.base.join(pattern);
            let entries = glob::glob(&full.to_string_lossy())
                .map_err(|source| LoadError::InvalidPattern { pattern: pattern.to_string(), source })?;
            let mut dirs = Vec::new();
            for entry in entries.flatten() {
                if entry.is_dir() && has_go_files(&entry)? {
                    dirs.push(canonical(&entry)?);
                }
            }
            dirs.sort();
            return Ok(dirs);
        }

        Ok(self.resolve_dir(pattern)?.into_iter().collect())
    }

    /// A directory path, or an import path inside the base directory's module
    fn resolve_dir(&mut self, text: &str) -> Result<Option<PathBuf>, LoadError> {
        let candidate = self.base.join(text);
        if candidate.is_dir() {
            return canonical(&candidate).map(Some);
        }

        let base = self.base.clone();
        if let Some(module) = self.module_for(&base)? {
            if let Some(dir) = module_dir(&module, text) {
                if dir.is_dir() {
                    return canonical(&dir).map(Some);
                }
            }
        }

        Ok(None)
    }

    fn walk_packages(&self, root: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let mut dirs = Vec::new();

        let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_type().is_dir() || !is_ignored_dir(entry.file_name().to_string_lossy().as_ref())
        });

        for entry in walker {
            let entry = entry.map_err(|e| LoadError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
                source: e.into(),
            })?;
            if entry.file_type().is_dir() && has_go_files(entry.path())? {
                dirs.push(entry.into_path());
            }
        }

        Ok(dirs)
    }

    /// Read and parse one package directory; `None` when it holds no Go files
    fn read_package(&mut self, dir: &Path, scanned: bool) -> Result<Option<Package>, LoadError> {
        let paths = go_files(dir)?;
        if paths.is_empty() {
            return Ok(None);
        }

        let mut files = Vec::new();
        let mut name: Option<String> = None;

        for path in paths {
            let source =
                fs::read_to_string(&path).map_err(|source| LoadError::Io { path: path.clone(), source })?;
            if is_build_ignored(&source) {
                tracing::trace!(path = %path.display(), "skipping file excluded by build constraint");
                continue;
            }

            let ast = Parser::parse_str(&source).map_err(|source| LoadError::Parse { path: path.clone(), source })?;

            match &name {
                None => name = Some(ast.package.name.clone()),
                Some(first) if *first != ast.package.name => {
                    return Err(LoadError::MixedPackages {
                        dir: dir.to_path_buf(),
                        first: first.clone(),
                        second: ast.package.name.clone(),
                    });
                }
                Some(_) => {}
            }

            files.push(SourceFile { path, ast });
        }

        let Some(name) = name else {
            return Ok(None);
        };
        let path = self.import_path(dir)?;

        Ok(Some(Package { name, path, dir: dir.to_path_buf(), files, scanned, info: TypesInfo::default() }))
    }

    fn import_path(&mut self, dir: &Path) -> Result<String, LoadError> {
        if let Some(module) = self.module_for(dir)? {
            let rel = dir.strip_prefix(&module.root).unwrap_or(Path::new(""));
            let rel = slash_path(rel);
            return Ok(if rel.is_empty() { module.path } else { format!("{}/{}", module.path, rel) });
        }

        let rel = dir.strip_prefix(canonical(&self.base)?).unwrap_or(dir);
        let rel = slash_path(rel);
        Ok(if rel.is_empty() { ".".to_string() } else { rel })
    }

    /// The module enclosing `dir`, if any
    fn module_for(&mut self, dir: &Path) -> Result<Option<Module>, LoadError> {
        let dir = canonical(dir)?;
        if let Some(cached) = self.modules.get(&dir) {
            return Ok(cached.clone());
        }

        let mut found = None;
        for ancestor in dir.ancestors() {
            let go_mod = ancestor.join("go.mod");
            if go_mod.is_file() {
                let contents =
                    fs::read_to_string(&go_mod).map_err(|source| LoadError::Io { path: go_mod.clone(), source })?;
                found = module_path(&contents).map(|path| Module { path, root: ancestor.to_path_buf() });
                break;
            }
        }

        self.modules.insert(dir, found.clone());
        Ok(found)
    }
}

/// Load packages relative to the current directory
pub fn load(patterns: &[String]) -> Result<Program, LoadError> {
    let base = std::env::current_dir().map_err(|source| LoadError::Io { path: PathBuf::from("."), source })?;
    Loader::new(base).load(patterns)
}

/// The `module` directive of a `go.mod` file
pub fn module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then(|| path.to_string())
    })
}

fn module_dir(module: &Module, import: &str) -> Option<PathBuf> {
    if import == module.path {
        return Some(module.root.clone());
    }
    let rest = import.strip_prefix(&module.path)?.strip_prefix('/')?;
    Some(rest.split('/').fold(module.root.clone(), |dir, segment| dir.join(segment)))
}

fn go_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_file() && name.ends_with(".go") && !name.ends_with("_test.go") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn has_go_files(dir: &Path) -> Result<bool, LoadError> {
    Ok(!go_files(dir)?.is_empty())
}

fn is_ignored_dir(name: &str) -> bool {
    name == "testdata" || name == "vendor" || name.starts_with('.') || name.starts_with('_')
}

/// Whether the file's header carries a `//go:build ignore` constraint
fn is_build_ignored(source: &str) -> bool {
    for line in source.lines() {
        let line = line.trim();
        if line.starts_with("package ") {
            return false;
        }
        if line == "//go:build ignore" || line == "// +build ignore" {
            return true;
        }
    }
    false
}

fn canonical(path: &Path) -> Result<PathBuf, LoadError> {
    fs::canonicalize(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })
}

fn slash_path(path: &Path) -> String {
    path.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_path() {
        assert_eq!(module_path("module example.com/m\n\ngo 1.22\n"), Some("example.com/m".to_string()));
        assert_eq!(module_path("// comment\nmodule \"quoted/m\" // trailing\n"), Some("quoted/m".to_string()));
        assert_eq!(module_path("go 1.22\n"), None);
        assert_eq!(module_path("modulex foo\n"), None);
    }

    #[test]
    fn test_module_dir() {
        let module = Module { path: "example.com/m".to_string(), root: PathBuf::from("/src/m") };
        assert_eq!(module_dir(&module, "example.com/m"), Some(PathBuf::from("/src/m")));
        assert_eq!(module_dir(&module, "example.com/m/a/b"), Some(PathBuf::from("/src/m/a/b")));
        assert_eq!(module_dir(&module, "example.com/mx"), None);
        assert_eq!(module_dir(&module, "fmt"), None);
    }

    #[test]
    fn test_build_ignore_header() {
        assert!(is_build_ignored("//go:build ignore\n\npackage main\n"));
        assert!(!is_build_ignored("package main\n//go:build ignore\n"));
        assert!(!is_build_ignored("//go:build linux\npackage main\n"));
    }

    #[test]
    fn test_ignored_dirs() {
        assert!(is_ignored_dir("testdata"));
        assert!(is_ignored_dir(".git"));
        assert!(is_ignored_dir("_old"));
        assert!(!is_ignored_dir("colors"));
    }
}
