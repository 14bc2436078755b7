//! Read-only, process-wide site state: the tree registry plus the settings
//! every handler needs. Built once at startup and shared behind an `Arc`.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::InstanceConfig;

/// One browsable tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeConfig {
    pub name: String,
    /// Folder holding the tree's rendered artifacts
    pub root: PathBuf,
}

/// Ordered list of valid trees. The first entry is the default tree.
#[derive(Debug, Clone, Default)]
pub struct TreeRegistry {
    trees: Vec<TreeConfig>,
}

impl TreeRegistry {
    pub fn new(trees: Vec<TreeConfig>) -> Self {
        Self { trees }
    }

    /// Registry for an instance folder laid out as `<instance>/trees/<name>`.
    pub fn from_instance(instance_dir: &Path, names: &[String]) -> Self {
        let trees = names
            .iter()
            .map(|name| TreeConfig {
                name: name.clone(),
                root: instance_dir.join("trees").join(name),
            })
            .collect();
        Self::new(trees)
    }

    pub fn get(&self, name: &str) -> Option<&TreeConfig> {
        self.trees.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn default_tree(&self) -> Option<&TreeConfig> {
        self.trees.first()
    }

    pub fn names(&self) -> Vec<String> {
        self.trees.iter().map(|t| t.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

/// Everything about the deployment that does not change per request.
#[derive(Debug, Clone)]
pub struct Site {
    pub instance_dir: PathBuf,
    /// URL prefix without a trailing slash ("" when mounted at the host root)
    pub www_root: String,
    pub registry: TreeRegistry,
    pub template_parameters: serde_json::Map<String, serde_json::Value>,
    pub generated_date: String,
    pub directory_index: String,
    pub artifact_suffix: String,
}

impl Site {
    pub fn from_instance_config(instance_dir: &Path, config: InstanceConfig) -> Self {
        let registry = TreeRegistry::from_instance(instance_dir, &config.trees);
        let generated_date = config
            .generated_date
            .unwrap_or_else(|| chrono::Utc::now().to_rfc2822());

        Self {
            instance_dir: instance_dir.to_path_buf(),
            www_root: config.www_root.trim_end_matches('/').to_string(),
            registry,
            template_parameters: config.template_parameters,
            generated_date,
            directory_index: config.directory_index,
            artifact_suffix: config.artifact_suffix,
        }
    }

    /// Load `<instance>/config.json` and build the site from it.
    pub fn load(instance_dir: &Path) -> Result<Self> {
        let config = InstanceConfig::load(&instance_dir.join("config.json"))?;
        Ok(Self::from_instance_config(instance_dir, config))
    }

    /// Browse URL of a path inside a tree. An empty path is the tree's root.
    /// Each segment is percent-encoded.
    pub fn browse_url(&self, tree: &str, path: &str) -> String {
        let path = path
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}/source/{}", self.www_root, tree, path)
    }

    /// Shareable search URL for a query.
    pub fn search_url(&self, tree: &str, query: &str, redirect: bool) -> String {
        format!(
            "{}/{}/search?q={}&redirect={}",
            self.www_root,
            tree,
            urlencoding::encode(query),
            redirect
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(www_root: &str) -> Site {
        let config: InstanceConfig = serde_json::from_value(serde_json::json!({
            "www_root": www_root,
            "trees": ["central", "beta"],
            "generated_date": "Mon, 1 Jan 2024 00:00:00 +0000",
        }))
        .unwrap();
        Site::from_instance_config(Path::new("/srv/instance"), config)
    }

    #[test]
    fn test_registry_layout_and_default() {
        let site = site("");
        assert_eq!(site.registry.len(), 2);
        assert_eq!(site.registry.default_tree().unwrap().name, "central");
        assert_eq!(
            site.registry.get("beta").unwrap().root,
            PathBuf::from("/srv/instance/trees/beta")
        );
        assert!(!site.registry.contains("gamma"));
        assert_eq!(site.registry.names(), vec!["central", "beta"]);
    }

    #[test]
    fn test_www_root_trailing_slash_is_trimmed() {
        let site = site("/dxr/");
        assert_eq!(site.www_root, "/dxr");
        assert_eq!(site.browse_url("central", ""), "/dxr/central/source/");
        assert_eq!(
            site.browse_url("central", "lib/a.rs"),
            "/dxr/central/source/lib/a.rs"
        );
    }

    #[test]
    fn test_browse_url_encodes_segments() {
        let site = site("/dxr");
        assert_eq!(
            site.browse_url("central", "docs/a b#1?.md"),
            "/dxr/central/source/docs/a%20b%231%3F.md"
        );
        assert_eq!(site.browse_url("central", "src/"), "/dxr/central/source/src/");
    }

    #[test]
    fn test_registry_from_explicit_trees() {
        let registry = TreeRegistry::new(vec![TreeConfig {
            name: "solo".to_string(),
            root: PathBuf::from("/data/solo"),
        }]);
        assert_eq!(registry.default_tree().unwrap().name, "solo");
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_search_url_encodes_query() {
        let site = site("");
        assert_eq!(
            site.search_url("central", "foo bar&x", false),
            "/central/search?q=foo%20bar%26x&redirect=false"
        );
    }

    #[test]
    fn test_generated_date_from_config() {
        assert_eq!(site("").generated_date, "Mon, 1 Jan 2024 00:00:00 +0000");
    }
}
