//! Lookup table specifications of the form `Table[Type]` or `Table[pkg.Type]`

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

static LOOKUP_RE: OnceLock<Regex> = OnceLock::new();

/// One requested lookup table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumSpec {
    /// Name of the generated map variable
    pub table: String,
    /// Package declaring the enum type; `None` means the output package
    pub package: Option<String>,
    pub type_name: String,
}

impl EnumSpec {
    /// The package the enum type must be declared in
    pub fn target_package<'a>(&'a self, output_package: &'a str) -> &'a str {
        self.package.as_deref().unwrap_or(output_package)
    }
}

impl fmt::Display for EnumSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(package) => write!(f, "{}[{}.{}]", self.table, package, self.type_name),
            None => write!(f, "{}[{}]", self.table, self.type_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error("Malformed lookup '{spec}': expected Table[Type] or Table[pkg.Type]")]
    Malformed { spec: String },

    #[error("Lookup '{spec}' has too many qualifiers in its type reference")]
    TooManyQualifiers { spec: String },

    #[error("Table '{table}' is requested for both {first} and {second}")]
    DuplicateTable { table: String, first: String, second: String },
}

/// Parse a single specification
pub fn parse(text: &str) -> Result<EnumSpec, SpecError> {
    let text = text.trim();
    let re = LOOKUP_RE.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_]*)\[([A-Za-z0-9_.]*)\]$").unwrap());
    let malformed = || SpecError::Malformed { spec: text.to_string() };

    let caps = re.captures(text).ok_or_else(malformed)?;
    let table = caps[1].to_string();
    let reference = &caps[2];

    let segments: Vec<&str> = reference.split('.').collect();
    if segments.len() > 2 {
        return Err(SpecError::TooManyQualifiers { spec: text.to_string() });
    }
    if !segments.iter().all(|s| is_identifier(s)) {
        return Err(malformed());
    }

    let (package, type_name) = match segments.as_slice() {
        [type_name] => (None, type_name.to_string()),
        [package, type_name] => (Some(package.to_string()), type_name.to_string()),
        _ => return Err(malformed()),
    };

    Ok(EnumSpec { table, package, type_name })
}

/// Parse a comma-separated list of specifications.
///
/// Identical specifications collapse into one; distinct specifications
/// sharing a table name are rejected.
pub fn parse_lookups(text: &str) -> Result<Vec<EnumSpec>, SpecError> {
    let mut specs: Vec<EnumSpec> = Vec::new();

    for item in text.split(',') {
        let spec = parse(item)?;
        match specs.iter().find(|s| s.table == spec.table) {
            Some(existing) if *existing == spec => continue,
            Some(existing) => {
                return Err(SpecError::DuplicateTable {
                    table: spec.table.clone(),
                    first: existing.to_string(),
                    second: spec.to_string(),
                });
            }
            None => specs.push(spec),
        }
    }

    Ok(specs)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
