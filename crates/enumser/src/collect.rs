//! Discovery of the constants belonging to an enum type
//!
//! Every top-level constant of the scanned packages is matched against the
//! requested type by the resolved identity of its declared type, so aliased
//! imports and type aliases land on the same canonical type as a direct
//! reference would. Constants without a written or repeated type never match,
//! even when their value has the enum type.

use crate::spec::EnumSpec;
use gosrc::error::{CheckError, Position};
use gosrc::loader::{Program, Unit};
use gosrc::{Type, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// One constant of an enum type
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueEntry {
    /// Declared constant name
    pub name: String,
    /// How the generated file refers to the constant: `name` or `pkg.name`
    pub qualified_reference: String,
    pub value: Value,
}

/// A lookup table ready to be rendered
#[derive(Debug, Clone, PartialEq)]
pub struct EnumTable {
    pub table: String,
    /// Map key type as written in the generated file, e.g. `colors.Color`
    pub canonical_type_name: String,
    /// Import paths the generated file needs for this table
    pub required_imports: BTreeSet<String>,
    /// Entries in scan order
    pub entries: Vec<EnumValueEntry>,
}

/// Two entries of one table holding the same value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateValue {
    pub value: String,
    pub first: String,
    pub second: String,
}

impl EnumTable {
    /// Entries whose values collide with an earlier entry.
    ///
    /// Each one becomes a duplicate key in the generated map literal.
    pub fn duplicate_values(&self) -> Vec<DuplicateValue> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        let mut duplicates = Vec::new();
        for entry in &self.entries {
            let value = entry.value.to_string();
            match seen.get(value.as_str()) {
                Some(first) => duplicates.push(DuplicateValue {
                    value,
                    first: first.to_string(),
                    second: entry.qualified_reference.clone(),
                }),
                None => {
                    seen.insert(value, &entry.qualified_reference);
                }
            }
        }
        duplicates
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("No constants of type {type_name} found for lookup '{spec}'")]
    NoMatches { spec: String, type_name: String },

    #[error("Constant {name} at {}:{}:{} was not resolved", file.display(), pos.line, pos.column)]
    Unresolved { name: String, file: PathBuf, pos: Position },

    #[error("Constant {name} of type {type_name} could not be evaluated")]
    Check {
        name: String,
        type_name: String,
        #[source]
        source: CheckError,
    },
}

/// Collect the table for a single lookup
pub fn collect_enum(units: &[Unit<'_>], spec: &EnumSpec, output_package: &str) -> Result<EnumTable, CollectError> {
    let target_package = spec.target_package(output_package);

    let mut canonical_type_name: Option<String> = None;
    let mut required_imports = BTreeSet::new();
    let mut entries = Vec::new();

    for unit in units {
        let info = &unit.package.info;

        for decl in unit.file.ast.const_decls() {
            for const_spec in &decl.specs {
                for ident in const_spec.names.iter().filter(|ident| !ident.is_blank()) {
                    let (declared, resolved) = match info.def(unit.file_index, ident) {
                        Some(constant) => (constant.declared.as_ref(), Ok(constant)),
                        None => {
                            let failure = info.failure(unit.file_index, ident).ok_or_else(|| {
                                CollectError::Unresolved {
                                    name: ident.name.clone(),
                                    file: unit.file.path.clone(),
                                    pos: ident.pos,
                                }
                            })?;
                            (failure.declared.as_ref(), Err(&failure.error))
                        }
                    };

                    let Some(named) = declared.and_then(Type::as_named) else {
                        continue;
                    };
                    if named.package.name != target_package || named.name != spec.type_name {
                        continue;
                    }

                    let constant = resolved.map_err(|error| CollectError::Check {
                        name: ident.name.clone(),
                        type_name: named.canonical_name(),
                        source: error.clone(),
                    })?;

                    let owner = &constant.package;
                    let qualified_reference = if owner.name != output_package {
                        required_imports.insert(owner.path.clone());
                        format!("{}.{}", owner.name, constant.name)
                    } else {
                        constant.name.clone()
                    };

                    canonical_type_name.get_or_insert_with(|| named.canonical_name());
                    required_imports.insert(named.package.path.clone());

                    tracing::trace!(
                        table = %spec.table,
                        name = %constant.name,
                        value = %constant.value,
                        "matched constant"
                    );
                    entries.push(EnumValueEntry {
                        name: constant.name.clone(),
                        qualified_reference,
                        value: constant.value.clone(),
                    });
                }
            }
        }
    }

    let Some(canonical_type_name) = canonical_type_name else {
        return Err(CollectError::NoMatches {
            spec: spec.to_string(),
            type_name: format!("{}.{}", target_package, spec.type_name),
        });
    };

    let table = EnumTable { table: spec.table.clone(), canonical_type_name, required_imports, entries };
    for duplicate in table.duplicate_values() {
        tracing::warn!(
            table = %table.table,
            value = %duplicate.value,
            first = %duplicate.first,
            second = %duplicate.second,
            "constants share a value"
        );
    }
    tracing::debug!(
        table = %table.table,
        typ = %table.canonical_type_name,
        entries = table.entries.len(),
        "collected table"
    );

    Ok(table)
}

/// Collect one table per lookup, in lookup order
pub fn collect_all(program: &Program, specs: &[EnumSpec], output_package: &str) -> Result<Vec<EnumTable>, CollectError> {
    let units = program.units();
    specs.iter().map(|spec| collect_enum(&units, spec, output_package)).collect()
}

/// Union of the imports required by all tables, sorted
pub fn required_imports(tables: &[EnumTable]) -> BTreeSet<String> {
    tables.iter().flat_map(|t| t.required_imports.iter().cloned()).collect()
}
