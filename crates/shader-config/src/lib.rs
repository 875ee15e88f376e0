use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which build path shader programs should take.
///
/// `Auto` defers to whatever the active driver reports it supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    #[default]
    Auto,
    Source,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShaderConfig {
    pub version: u32,
    #[serde(default)]
    pub mode: ModeSetting,
    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoaderConfig {
    #[serde(default = "default_search_root")]
    pub search_root: PathBuf,
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    #[serde(default)]
    pub binary_root: PathBuf,
    #[serde(default = "default_binary_extension")]
    pub binary_extension: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            version: 1,
            mode: ModeSetting::Auto,
            loader: LoaderConfig::default(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_root: default_search_root(),
            source_extension: default_source_extension(),
            binary_root: PathBuf::new(),
            binary_extension: default_binary_extension(),
        }
    }
}

fn default_search_root() -> PathBuf {
    PathBuf::from("../res/glsl")
}

fn default_source_extension() -> String {
    "glsl".to_string()
}

fn default_binary_extension() -> String {
    "shbin".to_string()
}

impl ShaderConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ShaderConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        validate_extension("loader.source_extension", &self.loader.source_extension)?;
        validate_extension("loader.binary_extension", &self.loader.binary_extension)?;

        if self.loader.source_extension == self.loader.binary_extension {
            return Err(ConfigError::Invalid(format!(
                "loader.source_extension and loader.binary_extension must differ (both '{}')",
                self.loader.source_extension
            )));
        }

        Ok(())
    }
}

fn validate_extension(field: &str, extension: &str) -> Result<(), ConfigError> {
    if extension.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} may not be empty")));
    }

    if extension.starts_with('.') {
        return Err(ConfigError::Invalid(format!(
            "{field} '{extension}' must not start with '.'"
        )));
    }

    if extension.contains(['/', '\\']) {
        return Err(ConfigError::Invalid(format!(
            "{field} '{extension}' must not contain path separators"
        )));
    }

    Ok(())
}

impl LoaderConfig {
    /// Path of the source-text file for `name`: `<search_root>/<name>.<source_extension>`.
    pub fn source_path(&self, name: &str) -> PathBuf {
        with_extension(&self.search_root, name, &self.source_extension)
    }

    /// Path of the precompiled binary for `name`: `<binary_root>/<name>.<binary_extension>`.
    pub fn binary_path(&self, name: &str) -> PathBuf {
        with_extension(&self.binary_root, name, &self.binary_extension)
    }
}

// Appends rather than replaces, so names like `lighting.v` keep their inner dot.
fn with_extension(root: &Path, name: &str, extension: &str) -> PathBuf {
    root.join(format!("{name}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1
mode = "binary"

[loader]
search_root = "romfs:/shaders"
source_extension = "vsh"
binary_root = "romfs:/bin"
binary_extension = "shbin"
"#;

    #[test]
    fn parses_sample_config() {
        let config = ShaderConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert_eq!(config.mode, ModeSetting::Binary);
        assert_eq!(config.loader.source_extension, "vsh");
        assert_eq!(config.loader.binary_root, PathBuf::from("romfs:/bin"));
    }

    #[test]
    fn fills_defaults_for_missing_sections() {
        let config = ShaderConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config, ShaderConfig::default());
        assert_eq!(config.loader.search_root, PathBuf::from("../res/glsl"));
    }

    #[test]
    fn resolves_file_naming_convention() {
        let loader = LoaderConfig::default();
        assert_eq!(
            loader.source_path("sprite"),
            PathBuf::from("../res/glsl/sprite.glsl")
        );
        assert_eq!(loader.binary_path("sprite"), PathBuf::from("sprite.shbin"));
        assert_eq!(
            loader.binary_path("lighting.v"),
            PathBuf::from("lighting.v.shbin")
        );
    }

    #[test]
    fn rejects_unknown_version() {
        let err = ShaderConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_dotted_extension() {
        let config = r#"
version = 1

[loader]
source_extension = ".glsl"
"#;
        let err = ShaderConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_identical_extensions() {
        let config = r#"
version = 1

[loader]
source_extension = "bin"
binary_extension = "bin"
"#;
        let err = ShaderConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = ShaderConfig::from_toml_str("version = 1\nmode = \"spirv\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
