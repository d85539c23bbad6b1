//! Configuration file handling for pixel-markup.
//!
//! Loads configuration from `<config dir>/pixel-markup/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bitmap::Quality;
use crate::render::{CharIndexing, HtmlOptions};

/// Text used when neither the command line nor the config file sets one.
pub const DEFAULT_TEXT: &str = " ";

/// Configuration file structure for pixel-markup.
#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub html: HtmlConfig,
    #[serde(default)]
    pub save: SaveConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct RenderConfig {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub indexing: Option<CharIndexing>,
}

#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct HtmlConfig {
    #[serde(default)]
    pub cell_size: Option<u32>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct SaveConfig {
    #[serde(default)]
    pub quality: Option<Quality>,
    #[serde(default)]
    pub progressive: bool,
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Render text, preferring `cli` over the file over [`DEFAULT_TEXT`].
    pub fn text(&self, cli: Option<&str>) -> String {
        cli.or(self.render.text.as_deref())
            .unwrap_or(DEFAULT_TEXT)
            .to_string()
    }

    pub fn indexing(&self, cli: Option<CharIndexing>) -> CharIndexing {
        cli.or(self.render.indexing).unwrap_or_default()
    }

    pub fn quality(&self, cli: Option<Quality>) -> Quality {
        cli.or(self.save.quality).unwrap_or_default()
    }

    /// HTML options with every unset field at its default.
    pub fn html_options(&self) -> HtmlOptions {
        let defaults = HtmlOptions::default();
        HtmlOptions {
            cell_size: self.html.cell_size.unwrap_or(defaults.cell_size),
            font_family: self
                .html
                .font_family
                .clone()
                .unwrap_or(defaults.font_family),
            font_size: self.html.font_size.unwrap_or(defaults.font_size),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("pixel-markup").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/pixel-markup/config.toml")
        })
}

/// Contents written by `pixel-markup config init`.
pub const DEFAULT_CONFIG: &str = r#"# pixel-markup configuration

[render]
# Characters cycled over the pixels (spaces render as non-breaking spaces)
text = " "
# Character indexing: legacy (first pixel takes the last character) or direct
indexing = "legacy"

[html]
# Edge length of one pixel cell, in CSS pixels
cell_size = 16
font_family = "Helvetica"
font_size = 12

[save]
# JPEG quality: superb, good, normal, average, bad
quality = "good"
# Progressive JPEG
progressive = false
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.text(None), " ");
        assert_eq!(config.indexing(None), CharIndexing::Legacy);
        assert_eq!(config.quality(None), Quality::Good);
        assert_eq!(config.html_options(), HtmlOptions::default());
    }

    #[test]
    fn test_default_config_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.render.text.as_deref(), Some(" "));
        assert_eq!(config.render.indexing, Some(CharIndexing::Legacy));
        assert_eq!(config.html.cell_size, Some(16));
        assert_eq!(config.save.quality, Some(Quality::Good));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[render]\ntext = \"file\"\nindexing = \"direct\"\n[save]\nquality = \"bad\""
        )
        .unwrap();
        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.text(None), "file");
        assert_eq!(config.text(Some("cli")), "cli");
        assert_eq!(config.indexing(None), CharIndexing::Direct);
        assert_eq!(
            config.indexing(Some(CharIndexing::Legacy)),
            CharIndexing::Legacy
        );
        assert_eq!(config.quality(None), Quality::Bad);
        assert_eq!(config.quality(Some(Quality::Superb)), Quality::Superb);
    }

    #[test]
    fn test_partial_html_section() {
        let config: Config = toml::from_str("[html]\ncell_size = 8").unwrap();
        let options = config.html_options();
        assert_eq!(options.cell_size, 8);
        assert_eq!(options.font_family, "Helvetica");
        assert_eq!(options.font_size, 12);
    }

    #[test]
    fn test_unparsable_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[render\ntext = ").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        assert!(default_path().ends_with("pixel-markup/config.toml"));
    }
}
