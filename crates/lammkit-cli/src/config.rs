use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use lammkit::core::models::atom::AtomStyle;

use crate::error::{CliError, Result};

/// Option defaults read from `--config`. Command-line flags take precedence
/// over the file, which takes precedence over the built-in defaults.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub thermo: ThermoSection,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DataSection {
    /// Atom style used to read an `Atoms` section.
    pub atom_style: Option<String>,
    /// Write the coefficient sections when re-serializing.
    pub coeffs: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ThermoSection {
    /// Only read the given 1-based run.
    pub run: Option<usize>,
}

impl FileConfig {
    /// Loads the file when a path was given, an all-defaults configuration
    /// otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => return Ok(Self::default()),
        };
        debug!("reading configuration from {}", path.display());
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| CliError::Config(e.to_string()))
    }

    /// Atom style for reading a data file.
    pub fn atom_style(&self, flag: Option<&str>) -> Result<AtomStyle> {
        match flag.or(self.data.atom_style.as_deref()) {
            Some(name) => name
                .parse()
                .map_err(|e| CliError::Argument(format!("{}", e))),
            None => Ok(AtomStyle::default()),
        }
    }

    /// Whether to write the coefficient sections.
    pub fn coeffs(&self, flag: bool) -> bool {
        flag || self.data.coeffs.unwrap_or(false)
    }

    /// Run selection for the thermo reader, `None` meaning every run.
    pub fn thermo_run(&self, flag: Option<usize>) -> Result<Option<NonZeroUsize>> {
        match flag.or(self.thermo.run) {
            Some(run) => NonZeroUsize::new(run)
                .map(Some)
                .ok_or_else(|| CliError::Argument("run numbers start at 1".to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CONFIG_TEXT: &str = "\
[data]
atom-style = \"pqeq\"
coeffs = true

[thermo]
run = 2
";

    fn create_config() -> FileConfig {
        toml::from_str(CONFIG_TEXT).unwrap()
    }

    #[test]
    fn a_missing_config_file_argument_means_defaults() {
        let config = FileConfig::load(None).unwrap();
        assert_eq!(config.atom_style(None).unwrap(), AtomStyle::Full);
        assert!(!config.coeffs(false));
        assert_eq!(config.thermo_run(None).unwrap(), None);
    }

    #[test]
    fn the_file_overrides_the_built_in_defaults() {
        let config = create_config();
        assert_eq!(config.atom_style(None).unwrap(), AtomStyle::Pqeq);
        assert!(config.coeffs(false));
        assert_eq!(
            config.thermo_run(None).unwrap(),
            Some(NonZeroUsize::new(2).unwrap())
        );
    }

    #[test]
    fn a_flag_overrides_the_file() {
        let config = create_config();
        assert_eq!(
            config.atom_style(Some("molecular")).unwrap(),
            AtomStyle::Molecular
        );
        assert_eq!(
            config.thermo_run(Some(5)).unwrap(),
            Some(NonZeroUsize::new(5).unwrap())
        );
    }

    #[test]
    fn an_unknown_atom_style_is_an_argument_error() {
        let config = FileConfig::default();
        let error = config.atom_style(Some("angle")).unwrap_err();
        assert!(matches!(error, CliError::Argument(_)));
    }

    #[test]
    fn run_zero_is_rejected() {
        let config = FileConfig::default();
        let error = config.thermo_run(Some(0)).unwrap_err();
        assert!(matches!(error, CliError::Argument(_)));
    }

    #[test]
    fn an_unknown_key_is_a_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[data]\natomstyle = \"full\"\n").unwrap();
        let error = FileConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(error, CliError::Config(_)));
    }

    #[test]
    fn a_config_file_is_loaded_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", CONFIG_TEXT).unwrap();
        let config = FileConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.data.atom_style.as_deref(), Some("pqeq"));
        assert_eq!(config.thermo.run, Some(2));
    }
}
