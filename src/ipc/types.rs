use std::path::Path;

use serde::Deserialize;

use crate::config::Config;
use crate::store::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub store: Store,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = Store::new(config.data_dir.clone());
        AppState { config, store }
    }

    /// Re-points the daemon at another workspace folder.
    pub fn select_workspace(&mut self, workspace: &Path, roster: Option<&Path>) -> anyhow::Result<()> {
        let mut config = Config::for_workspace(workspace);
        if let Some(r) = roster {
            config.roster_path = r.to_path_buf();
        }
        let store = Store::new(config.data_dir.clone());
        store.ensure_data_dir()?;
        self.config = config;
        self.store = store;
        Ok(())
    }
}
