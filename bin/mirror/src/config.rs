//! Routing table configuration file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr};
use mirror_routing::{MemoryRouter, Peer, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Contents of the routes file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RoutesConfig {
    /// This node's own identity.
    pub(crate) self_peer: Peer,
    /// Keys this node serves itself.
    #[serde(default)]
    pub(crate) advertise: Vec<String>,
    /// Peers learned from the cluster, per key.
    #[serde(default)]
    pub(crate) routes: HashMap<String, Vec<Peer>>,
}

impl RoutesConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read routes file {}", path.display()))?;
        toml::from_str(&raw)
            .wrap_err_with(|| format!("failed to parse routes file {}", path.display()))
    }

    /// Builds a router from the table and advertises this node's keys.
    pub(crate) async fn into_router(self) -> Result<MemoryRouter> {
        let keys = self.routes.len();
        let router = MemoryRouter::new(self.routes, self.self_peer);
        router.advertise(&self.advertise).await?;
        info!(keys, advertised = self.advertise.len(), "routing table loaded");
        Ok(router)
    }
}
