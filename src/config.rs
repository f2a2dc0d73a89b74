use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::loader::{DEFAULT_EXTENSION, SearchRoot};
use crate::registry::DomainRegistry;

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRootConfig {
    pub path: PathBuf,
    #[serde(default = "default_extension")]
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConfig {
    pub name: String,
    pub root_culture: String,
    pub search_roots: Vec<SearchRootConfig>,
}

impl PackageConfig {
    pub fn search_roots(&self) -> Vec<SearchRoot> {
        self.search_roots
            .iter()
            .map(|root| SearchRoot::new(&root.path, &root.extension))
            .collect()
    }
}

/// Declarative description of the packages to register.
///
/// ```json
/// {
///     "culture": "fr-FR",
///     "packages": [
///         {
///             "name": "com.example.ui",
///             "root_culture": "en",
///             "search_roots": [{ "path": "/opt/app/locale", "extension": ".mo" }]
///         }
///     ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub culture: Option<String>,
    #[serde(default)]
    pub packages: Vec<PackageConfig>,
}

impl RegistryConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    pub fn package(&self, name: &str) -> Option<&PackageConfig> {
        self.packages.iter().find(|package| package.name == name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for package in &self.packages {
            if package.name.trim().is_empty() {
                return Err(ConfigError::Invalid("package name must not be empty".to_string()));
            }
            if !seen.insert(package.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "package '{}' is declared more than once",
                    package.name
                )));
            }
            if package.root_culture.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "package '{}' has no root culture",
                    package.name
                )));
            }
            if package.search_roots.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "package '{}' has no search roots",
                    package.name
                )));
            }
        }
        Ok(())
    }

    /// Register every package with `registry` and select the configured culture.
    pub fn apply(&self, registry: &DomainRegistry) {
        for package in &self.packages {
            registry.register(&package.name, &package.root_culture, package.search_roots());
        }
        if let Some(culture) = &self.culture {
            registry.set_culture(culture);
        }
    }
}

impl FromStr for RegistryConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: RegistryConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
