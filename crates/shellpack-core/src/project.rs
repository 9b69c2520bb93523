//! Read-only access to the web app's project settings.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// The only routing mode that works from a filesystem-served shell.
pub const LOCATION_TYPE_HASH: &str = "hash";

/// Settings of the bundled web app that affect packaging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Client-side routing strategy (`hash`, `history`, `auto`, ...).
    pub location_type: String,
}

impl AppConfig {
    pub fn new(location_type: impl Into<String>) -> Self {
        Self {
            location_type: location_type.into(),
        }
    }

    pub fn uses_hash_routing(&self) -> bool {
        self.location_type == LOCATION_TYPE_HASH
    }
}

/// Accessor for the owning project's configuration.
pub trait ProjectConfig {
    fn config(&self) -> Result<AppConfig, BuildError>;
}

/// [`ProjectConfig`] over an already-loaded value.
#[derive(Debug, Clone)]
pub struct StaticProjectConfig(pub AppConfig);

impl ProjectConfig for StaticProjectConfig {
    fn config(&self) -> Result<AppConfig, BuildError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_hash_counts() {
        assert!(AppConfig::new("hash").uses_hash_routing());
        assert!(!AppConfig::new("auto").uses_hash_routing());
        assert!(!AppConfig::new("Hash").uses_hash_routing());
        assert!(!AppConfig::new("").uses_hash_routing());
    }

    #[test]
    fn deserializes_camel_case() {
        let config: AppConfig = serde_json::from_str(r#"{"locationType":"history"}"#).unwrap();
        assert_eq!(config.location_type, "history");
    }
}
