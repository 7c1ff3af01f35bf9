//! Server configuration: TOML file with CLI overrides

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use safewalk_core::Error;
use safewalk_core::risk::DangerPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub listen: SocketAddr,
    /// JSON graph file; the built-in demo graph is used when absent
    pub graph_path: Option<PathBuf>,
    /// Severity/danger-score combination policy for incident application
    pub danger_policy: DangerPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8000)),
            graph_path: None,
            danger_policy: DangerPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Reads a config file, e.g.:
    ///
    /// ```toml
    /// listen = "127.0.0.1:8000"
    /// graph_path = "city.json"
    ///
    /// [danger_policy]
    /// policy = "blend"
    /// retain = 0.6
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|err| Error::InvalidData(format!("config {}: {err}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_missing_keys() {
        let config: ServerConfig = toml::from_str("listen = \"127.0.0.1:9100\"").unwrap();
        assert_eq!(config.listen.port(), 9100);
        assert!(config.graph_path.is_none());
        assert_eq!(config.danger_policy, DangerPolicy::Max);
    }

    #[test]
    fn blend_policy_parses_with_retain_factor() {
        let config: ServerConfig = toml::from_str(
            "[danger_policy]\npolicy = \"blend\"\nretain = 0.6\n",
        )
        .unwrap();
        assert_eq!(config.danger_policy, DangerPolicy::Blend { retain: 0.6 });
    }
}
