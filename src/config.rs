use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Process configuration, read from the environment at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Instance folder holding `config.json`, `trees/` and `indexes/`
    pub instance_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Upper bound on a single engine call, in seconds
    pub search_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instance_dir: PathBuf::from("./instance"),
            bind_addr: "127.0.0.1:8000".to_string(),
            search_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("TREE_BROWSE_INSTANCE_DIR") {
            config.instance_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("TREE_BROWSE_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("TREE_BROWSE_SEARCH_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.search_timeout_secs = v.min(300); // Cap at 5 minutes
            }
        }

        config
    }

    pub fn instance_config_path(&self) -> PathBuf {
        self.instance_dir.join("config.json")
    }
}

/// Site-wide settings written next to the rendered trees by the build step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// URL prefix the site is mounted under, without a trailing slash
    #[serde(default)]
    pub www_root: String,
    /// Tree names; the first one is the default tree
    pub trees: Vec<String>,
    /// Opaque parameters handed to every rendered view
    #[serde(default)]
    pub template_parameters: serde_json::Map<String, serde_json::Value>,
    /// When the instance was generated. Defaults to load time.
    #[serde(default)]
    pub generated_date: Option<String>,
    /// File served for a directory listing
    #[serde(default = "default_directory_index")]
    pub directory_index: String,
    /// Suffix appended to a file path to find its rendered page
    #[serde(default = "default_artifact_suffix")]
    pub artifact_suffix: String,
}

fn default_directory_index() -> String {
    "index.html".to_string()
}

fn default_artifact_suffix() -> String {
    ".html".to_string()
}

impl InstanceConfig {
    /// Read and validate `config.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read instance config {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse instance config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            bail!("Instance config lists no trees");
        }
        for (i, name) in self.trees.iter().enumerate() {
            if name.is_empty() || name.contains('/') {
                bail!("Invalid tree name: {name:?}");
            }
            if self.trees[..i].contains(name) {
                bail!("Duplicate tree name: {name}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("config.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_instance_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{"trees": ["central"]}"#);
        let config = InstanceConfig::load(&path).unwrap();
        assert_eq!(config.www_root, "");
        assert_eq!(config.directory_index, "index.html");
        assert_eq!(config.artifact_suffix, ".html");
        assert!(config.generated_date.is_none());
        assert!(config.template_parameters.is_empty());
    }

    #[test]
    fn test_instance_config_rejects_empty_tree_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{"trees": []}"#);
        assert!(InstanceConfig::load(&path).is_err());
    }

    #[test]
    fn test_instance_config_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{"trees": ["a", "b", "a"]}"#);
        let err = InstanceConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_instance_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InstanceConfig::load(&dir.path().join("config.json")).is_err());
    }
}
