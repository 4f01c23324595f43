//! @ai:module:intent Configuration for a generation run, loaded from TOML
//! @ai:module:layer infrastructure
//! @ai:module:public_api Config
//! @ai:module:depends_on aggregator, language, output, error

use crate::aggregator::{AggregateOptions, ServicePolicy};
use crate::error::{Error, Result};
use crate::language::Language;
use crate::output::OutputFormat;
use crate::source::{CommentAdapter, DEFAULT_EXCLUDES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// @ai:intent Main configuration for a generation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub include: Vec<PathBuf>,
    pub languages: Vec<String>,
    pub exclude: Vec<String>,
    pub formats: Vec<OutputFormat>,
    pub stdout: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    pub service_policy: ServicePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: vec![PathBuf::from(".")],
            languages: vec![Language::Go.name().to_string()],
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            formats: vec![OutputFormat::Yaml],
            stdout: false,
            output_dir: None,
            service_policy: ServicePolicy::default(),
        }
    }
}

impl Config {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// @ai:intent Resolve the configured language names
    /// @ai:effects pure
    pub fn resolve_languages(&self) -> Result<Vec<Language>> {
        let mut languages = Vec::new();
        for name in &self.languages {
            let language: Language = name.parse()?;
            if !languages.contains(&language) {
                languages.push(language);
            }
        }
        Ok(languages)
    }

    /// @ai:intent Build the source adapter described by this configuration
    pub fn adapter(&self) -> Result<CommentAdapter> {
        Ok(CommentAdapter::new(self.resolve_languages()?).with_excludes(self.exclude.clone()))
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            service_policy: self.service_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.include, vec![PathBuf::from(".")]);
        assert_eq!(config.resolve_languages().unwrap(), vec![Language::Go]);
        assert_eq!(config.formats, vec![OutputFormat::Yaml]);
        assert_eq!(config.service_policy, ServicePolicy::LastWriteWins);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
include = ["cmd", "internal"]
languages = ["golang", "python", "go"]
exclude = ["testdata"]
formats = ["yaml", "json"]
stdout = true
output_dir = "out"
service_policy = "reject-conflicts"
"#,
        )
        .unwrap();

        assert_eq!(config.include, vec![PathBuf::from("cmd"), PathBuf::from("internal")]);
        assert_eq!(
            config.resolve_languages().unwrap(),
            vec![Language::Go, Language::Python]
        );
        assert_eq!(config.formats, vec![OutputFormat::Yaml, OutputFormat::Json]);
        assert!(config.stdout);
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
        assert_eq!(config.service_policy, ServicePolicy::RejectConflicts);
    }

    #[test]
    fn test_unknown_language_is_an_error() {
        let config = Config {
            languages: vec!["cobol".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_languages(),
            Err(Error::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_load_reports_path_on_invalid_toml() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "formats = [\"xml\"]").unwrap();

        match Config::load(temp.path()) {
            Err(Error::Config { path, .. }) => assert_eq!(path, temp.path()),
            other => panic!("expected a config error, got {:?}", other),
        }
    }
}
