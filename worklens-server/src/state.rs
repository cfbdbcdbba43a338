//! Shared server state

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use worklens_core::WorklensContext;

/// Application state handed to every handler
pub struct AppState {
    pub ctx: WorklensContext,
}

impl AppState {
    /// Build the state: load config, open the database, run migrations
    pub fn new(data_dir: &Path, port_override: Option<u16>) -> Result<Arc<Self>> {
        std::fs::create_dir_all(data_dir)?;

        let mut ctx = WorklensContext::new(data_dir)?;
        if let Some(port) = port_override {
            ctx.config.port = port;
        }

        Ok(Arc::new(Self { ctx }))
    }
}
