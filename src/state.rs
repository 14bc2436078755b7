use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, InstanceConfig};
use crate::engine::index::TantivyBackend;
use crate::engine::SearchBackend;
use crate::render::{HtmlRenderer, PageRenderer};
use crate::site::Site;

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub site: Arc<Site>,
    pub backend: Arc<dyn SearchBackend>,
    pub renderer: Arc<dyn PageRenderer>,
    /// Upper bound on one engine call
    pub search_timeout: Duration,
}

impl AppState {
    /// Load the instance named by `config` with the bundled backend and renderer.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let instance = InstanceConfig::load(&config.instance_config_path())?;
        let site = Site::from_instance_config(&config.instance_dir, instance);
        Ok(Self::with_parts(
            site,
            Arc::new(TantivyBackend),
            Arc::new(HtmlRenderer),
            Duration::from_secs(config.search_timeout_secs),
        ))
    }

    pub fn with_parts(
        site: Site,
        backend: Arc<dyn SearchBackend>,
        renderer: Arc<dyn PageRenderer>,
        search_timeout: Duration,
    ) -> Self {
        Self {
            site: Arc::new(site),
            backend,
            renderer,
            search_timeout,
        }
    }
}
