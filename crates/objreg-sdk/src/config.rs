use std::collections::HashSet;
use std::path::Path;

use objreg_types::{validate_object_name, Recipe};
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// A named object created at workspace start and after every clear.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefaultEntry {
    pub name: String,
    /// Type name of the creator to use.
    pub kind: String,
    #[serde(default)]
    pub recipe: Recipe,
}

impl DefaultEntry {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, recipe: Recipe) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            recipe,
        }
    }
}

/// Configuration for a [`Workspace`](crate::Workspace).
///
/// ```toml
/// reseed_defaults = true
///
/// [[defaults]]
/// name = "zero"
/// kind = "scalar"
/// recipe = { value = 0.0 }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Recreate `defaults` after every clear.
    #[serde(default = "default_true")]
    pub reseed_defaults: bool,

    /// Objects created at start, in order. Later entries may depend on
    /// earlier ones.
    #[serde(default)]
    pub defaults: Vec<DefaultEntry>,

    /// Register the `scalar`, `vector`, `sum` and `buffer` kinds.
    #[serde(default = "default_true")]
    pub include_builtin_creators: bool,

    /// Walk and write dependencies when saving.
    #[serde(default = "default_true")]
    pub save_dependencies: bool,
}

fn default_true() -> bool {
    true
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            reseed_defaults: true,
            defaults: Vec::new(),
            include_builtin_creators: true,
            save_dependencies: true,
        }
    }
}

impl WorkspaceConfig {
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check default entries: valid, unique names and a non-blank kind.
    pub fn validate(&self) -> SdkResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.defaults {
            validate_object_name(&entry.name)?;
            if entry.kind.trim().is_empty() {
                return Err(SdkError::InvalidConfig(format!(
                    "default {:?} has no kind",
                    entry.name
                )));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(SdkError::InvalidConfig(format!(
                    "default {:?} is listed twice",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    pub fn with_default(mut self, entry: DefaultEntry) -> Self {
        self.defaults.push(entry);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = WorkspaceConfig::from_toml_str("").unwrap();
        assert_eq!(config, WorkspaceConfig::default());
        assert!(config.reseed_defaults);
        assert!(config.include_builtin_creators);
        assert!(config.save_dependencies);
    }

    #[test]
    fn parses_default_entries_with_recipes() {
        let text = r#"
            reseed_defaults = false

            [[defaults]]
            name = "zero"
            kind = "scalar"
            recipe = { value = 0.0 }

            [[defaults]]
            name = "axis"
            kind = "vector"
            [defaults.recipe]
            values = [1.0, 0.0]
        "#;
        let config = WorkspaceConfig::from_toml_str(text).unwrap();
        assert!(!config.reseed_defaults);
        assert_eq!(config.defaults.len(), 2);
        assert_eq!(config.defaults[0].name, "zero");
        assert_eq!(config.defaults[0].recipe.get("value"), Some(&json!(0.0)));
        assert_eq!(
            config.defaults[1].recipe.get("values"),
            Some(&json!([1.0, 0.0]))
        );
    }

    #[test]
    fn duplicate_default_names_rejected() {
        let text = r#"
            [[defaults]]
            name = "a"
            kind = "scalar"
            [[defaults]]
            name = "a"
            kind = "vector"
        "#;
        let err = WorkspaceConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, SdkError::InvalidConfig(_)));
    }

    #[test]
    fn invalid_default_name_rejected() {
        let text = r#"
            [[defaults]]
            name = " padded"
            kind = "scalar"
        "#;
        let err = WorkspaceConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, SdkError::Type(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = WorkspaceConfig::from_toml_str("reseed_defaults = ").unwrap_err();
        assert!(matches!(err, SdkError::ConfigParse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("objreg.toml");
        std::fs::write(&path, "save_dependencies = false\n").unwrap();

        let config = WorkspaceConfig::load(&path).unwrap();
        assert!(!config.save_dependencies);
        assert!(config.reseed_defaults);
    }
}
