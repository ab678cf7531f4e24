use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where the generated source goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    /// `-` selects stdout
    pub fn parse(text: &str) -> Self {
        if text == "-" {
            Output::Stdout
        } else {
            Output::File(PathBuf::from(text))
        }
    }
}

/// Run configuration, fixed once loaded
#[derive(Debug, Clone)]
pub struct Config {
    /// Comma-separated lookup specifications
    pub lookups: String,
    pub output: Output,
    /// Package clause of the generated file
    pub package: String,
    /// Package patterns to scan
    pub inputs: Vec<String>,
    /// Directory patterns are resolved against
    pub base_dir: PathBuf,
    /// Print to stdout instead of writing the output file
    pub dry_run: bool,
    pub verbose: bool,
}

impl Config {
    /// Merge the optional config file with command line values, which take
    /// precedence, and check that every required value is present
    pub fn load(config_file: Option<&Path>, overrides: PartialConfig) -> Result<Self> {
        let mut merged = match config_file {
            Some(path) => Self::load_from_file(path)?,
            None => PartialConfig::default(),
        };
        merged.merge(overrides);

        let base_dir = std::env::current_dir().context("Failed to determine the current directory")?;
        Self::from_partial(merged, base_dir)
    }

    fn load_from_file(path: &Path) -> Result<PartialConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: PartialConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    fn from_partial(partial: PartialConfig, base_dir: PathBuf) -> Result<Self> {
        let lookups = required(partial.lookup, "lookup")?;
        let output = required(partial.output, "output")?;
        let package = required(partial.package, "pkg")?;

        let inputs: Vec<String> = partial.inputs.unwrap_or_default().into_iter().filter(|s| !s.trim().is_empty()).collect();
        if inputs.is_empty() {
            bail!("At least one input package is required");
        }

        Ok(Self {
            lookups,
            output: Output::parse(&output),
            package,
            inputs,
            base_dir,
            dry_run: partial.dry_run.unwrap_or(false),
            verbose: partial.verbose.unwrap_or(false),
        })
    }

    /// The destination the generated source is actually written to
    pub fn destination(&self) -> Output {
        if self.dry_run {
            Output::Stdout
        } else {
            self.output.clone()
        }
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => bail!("Missing required value '{}'", name),
    }
}

/// Configuration with every field optional, as read from TOML or the
/// command line
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub lookup: Option<String>,
    pub output: Option<String>,
    pub package: Option<String>,
    pub inputs: Option<Vec<String>>,
    pub dry_run: Option<bool>,
    pub verbose: Option<bool>,
}

impl PartialConfig {
    /// Values present in `other` replace ours
    fn merge(&mut self, other: PartialConfig) {
        if let Some(val) = other.lookup {
            self.lookup = Some(val);
        }
        if let Some(val) = other.output {
            self.output = Some(val);
        }
        if let Some(val) = other.package {
            self.package = Some(val);
        }
        if let Some(val) = other.inputs.filter(|v| !v.is_empty()) {
            self.inputs = Some(val);
        }
        if let Some(val) = other.dry_run {
            self.dry_run = Some(val);
        }
        if let Some(val) = other.verbose {
            self.verbose = Some(val);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn cli(lookup: &str, output: &str, package: &str, inputs: &[&str]) -> PartialConfig {
        PartialConfig {
            lookup: Some(lookup.to_string()),
            output: Some(output.to_string()),
            package: Some(package.to_string()),
            inputs: Some(inputs.iter().map(|s| s.to_string()).collect()),
            ..PartialConfig::default()
        }
    }

    #[test]
    fn test_load_from_cli_only() {
        let config = Config::load(None, cli("Names[Color]", "out.go", "colors", &["./colors"])).unwrap();
        assert_eq!(config.lookups, "Names[Color]");
        assert_eq!(config.output, Output::File(PathBuf::from("out.go")));
        assert_eq!(config.package, "colors");
        assert_eq!(config.inputs, vec!["./colors"]);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_missing_required_value() {
        let mut partial = cli("Names[Color]", "out.go", "colors", &["./colors"]);
        partial.package = Some("  ".to_string());
        let err = Config::load(None, partial).unwrap_err();
        assert!(err.to_string().contains("pkg"));
    }

    #[test]
    fn test_missing_inputs() {
        let err = Config::load(None, cli("Names[Color]", "out.go", "colors", &[])).unwrap_err();
        assert!(err.to_string().contains("input"));
    }

    #[test]
    fn test_file_supplies_defaults_and_cli_wins() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("enum_serialize.toml");
        fs::write(
            &path,
            "lookup = \"Names[Color]\"\noutput = \"names.go\"\npackage = \"colors\"\ninputs = [\"./colors\"]\nverbose = true\n",
        )
        .unwrap();

        let overrides = PartialConfig { output: Some("-".to_string()), ..PartialConfig::default() };
        let config = Config::load(Some(&path), overrides).unwrap();
        assert_eq!(config.lookups, "Names[Color]");
        assert_eq!(config.output, Output::Stdout);
        assert_eq!(config.inputs, vec!["./colors"]);
        assert!(config.verbose);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        fs::write(&path, "lookups = \"Names[Color]\"\n").unwrap();

        let err = Config::load(Some(&path), PartialConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::load(Some(Path::new("/nonexistent/enum_serialize.toml")), PartialConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_dry_run_writes_to_stdout() {
        let mut partial = cli("Names[Color]", "out.go", "colors", &["./colors"]);
        partial.dry_run = Some(true);
        let config = Config::load(None, partial).unwrap();
        assert_eq!(config.destination(), Output::Stdout);
    }
}
