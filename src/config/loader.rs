//! Configuration file discovery and parsing.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::Config;
use crate::error::{Result, SecretsEnvError};

pub const CONFIG_FILE_NAME: &str = "secrets-env.kdl";

impl Config {
    /// Get the explicit ~/.config/secrets-env/secrets-env.kdl path (XDG-style, cross-platform)
    fn xdg_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".config/secrets-env").join(CONFIG_FILE_NAME))
    }

    /// Config file search paths in priority order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];

        if let Some(xdg_path) = Self::xdg_config_path() {
            paths.push(xdg_path);
        }

        // Skip the platform directory when it is the XDG path (Linux)
        if let Some(config_dir) = dirs::config_dir() {
            let native_path = config_dir.join("secrets-env").join(CONFIG_FILE_NAME);
            if Self::xdg_config_path().as_ref() != Some(&native_path) {
                paths.push(native_path);
            }
        }

        paths
    }

    /// Parse KDL text.
    pub fn parse(source_name: &str, content: &str) -> Result<Self> {
        knuffel::parse::<Config>(source_name, content)
            .map_err(|e| SecretsEnvError::config(format!("failed to parse {}: {}", source_name, e)))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SecretsEnvError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "loading config file");
        Self::parse(&path.display().to_string(), &content)
    }

    /// Load an explicit config file, or the first one found on the search
    /// path. No file at all yields an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        match Self::search_paths().into_iter().find(|path| path.exists()) {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Config::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            "test.kdl",
            r#"
defaults verbosity="debug"
vault address="https://vault.local:8200" role="app" backend="token" token-path="/tmp/jwt" skip-verify=true timeout=5
aws region="eu-west-1" role-arn="arn:aws:iam::123456789012:role/reader"
gcp project="my-project"
"#,
        )
        .unwrap();

        assert_eq!(config.verbosity(), Some("debug"));
        let vault = config.vault();
        assert_eq!(vault.address.as_deref(), Some("https://vault.local:8200"));
        assert_eq!(vault.role.as_deref(), Some("app"));
        assert_eq!(vault.backend.as_deref(), Some("token"));
        assert_eq!(vault.token_path(), Some(PathBuf::from("/tmp/jwt")));
        assert_eq!(vault.skip_verify, Some(true));
        assert_eq!(vault.timeout, Some(5));
        assert_eq!(config.aws().region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.gcp().project.as_deref(), Some("my-project"));
    }

    #[test]
    fn test_parse_rejects_unknown_nodes() {
        let err = Config::parse("bad.kdl", "provider \"x\" kind=\"aws\"").unwrap_err();
        assert!(matches!(err, SecretsEnvError::Config(_)));
    }

    #[test]
    fn test_search_paths_start_with_working_directory() {
        assert_eq!(Config::search_paths()[0], PathBuf::from(CONFIG_FILE_NAME));
    }
}
