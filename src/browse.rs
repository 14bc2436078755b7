//! Mapping browse URLs onto the pre-rendered artifacts on disk, and picking
//! the landing page when switching to another tree.

use std::path::{Component, Path, PathBuf};

use crate::site::{Site, TreeConfig};

/// On-disk path, relative to `tree_root`, of the artifact served for `url_path`.
///
/// Directories get the directory index appended, anything else gets the
/// artifact suffix. Nothing checks that the result exists.
pub fn artifact_path(
    tree_root: &Path,
    url_path: &str,
    directory_index: &str,
    artifact_suffix: &str,
) -> PathBuf {
    if tree_root.join(url_path).is_dir() {
        Path::new(url_path).join(directory_index)
    } else {
        PathBuf::from(format!("{url_path}{artifact_suffix}"))
    }
}

/// True when `url_path` stays inside whatever folder it is joined to.
pub fn is_contained(url_path: &str) -> bool {
    Path::new(url_path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Absolute on-disk artifact for a browse request, or `None` for paths that
/// would escape the tree.
pub fn resolve(site: &Site, tree: &TreeConfig, url_path: &str) -> Option<PathBuf> {
    if !is_contained(url_path) {
        return None;
    }
    let relative = artifact_path(
        &tree.root,
        url_path,
        &site.directory_index,
        &site.artifact_suffix,
    );
    Some(tree.root.join(relative))
}

/// Where to send someone who switches to `target` while looking at `url_path`:
/// the same path in `target` when it was rendered there, else `target`'s root.
pub fn parallel_url(site: &Site, target: &TreeConfig, url_path: &str) -> String {
    let exists = resolve(site, target, url_path).is_some_and(|p| p.is_file());
    if exists {
        site.browse_url(&target.name, url_path)
    } else {
        tracing::debug!("No parallel of {url_path:?} in {}", target.name);
        site.browse_url(&target.name, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstanceConfig;

    fn site_with_trees(instance: &Path) -> Site {
        let config: InstanceConfig = serde_json::from_value(serde_json::json!({
            "www_root": "/code",
            "trees": ["central", "beta"],
        }))
        .unwrap();
        Site::from_instance_config(instance, config)
    }

    #[test]
    fn test_directory_gets_index_file() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("lib")).unwrap();

        assert_eq!(
            artifact_path(root.path(), "lib", "index.html", ".html"),
            PathBuf::from("lib/index.html")
        );
        assert_eq!(
            artifact_path(root.path(), "lib/", "index.html", ".html"),
            PathBuf::from("lib/index.html")
        );
    }

    #[test]
    fn test_file_gets_suffix() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(
            artifact_path(root.path(), "lib.cpp", "index.html", ".html"),
            PathBuf::from("lib.cpp.html")
        );
    }

    #[test]
    fn test_empty_path_is_tree_root_index() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(
            artifact_path(root.path(), "", "index.html", ".html"),
            PathBuf::from("index.html")
        );
    }

    #[test]
    fn test_missing_directory_is_treated_as_file() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(
            artifact_path(root.path(), "nope/", "index.html", ".html"),
            PathBuf::from("nope/.html")
        );
    }

    #[test]
    fn test_is_contained() {
        assert!(is_contained(""));
        assert!(is_contained("a/b.rs"));
        assert!(is_contained("./a"));
        assert!(!is_contained("../secret"));
        assert!(!is_contained("a/../../b"));
        assert!(!is_contained("/etc/passwd"));
    }

    #[test]
    fn test_parallel_keeps_path_when_rendered_in_target() {
        let instance = tempfile::tempdir().unwrap();
        let site = site_with_trees(instance.path());
        let beta = site.registry.get("beta").unwrap().clone();
        std::fs::create_dir_all(beta.root.join("src")).unwrap();
        std::fs::write(beta.root.join("src/main.rs.html"), "<html/>").unwrap();

        assert_eq!(
            parallel_url(&site, &beta, "src/main.rs"),
            "/code/beta/source/src/main.rs"
        );
    }

    #[test]
    fn test_parallel_directory_with_index() {
        let instance = tempfile::tempdir().unwrap();
        let site = site_with_trees(instance.path());
        let beta = site.registry.get("beta").unwrap().clone();
        std::fs::create_dir_all(beta.root.join("src")).unwrap();
        std::fs::write(beta.root.join("src/index.html"), "<html/>").unwrap();

        assert_eq!(parallel_url(&site, &beta, "src"), "/code/beta/source/src");
    }

    #[test]
    fn test_parallel_falls_back_to_root() {
        let instance = tempfile::tempdir().unwrap();
        let site = site_with_trees(instance.path());
        let beta = site.registry.get("beta").unwrap().clone();
        std::fs::create_dir_all(&beta.root).unwrap();

        assert_eq!(parallel_url(&site, &beta, "src/gone.rs"), "/code/beta/source/");
        assert_eq!(parallel_url(&site, &beta, "../escape"), "/code/beta/source/");
    }
}
