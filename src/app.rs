//! Wires the sync engine to its concrete collaborators.

use crate::config::AppConfig;
use crate::library::JsonLibrary;
use crate::settings::JsonSettingsStore;
use anyhow::{anyhow, Context, Result};
use log::info;
use pgk_core::{RemoteStore, SyncResult, SyncSettings};
use pgk_sync::{BroadcastNotifier, SyncCollaborators, SyncEngine, SyncScheduler};
use pgk_webdav::WebDavTransport;
use std::sync::Arc;

pub struct App {
    pub config: AppConfig,
    pub engine: Arc<SyncEngine>,
    pub settings: Arc<JsonSettingsStore>,
    pub library: Arc<JsonLibrary>,
    pub notifier: Arc<BroadcastNotifier>,
}

impl App {
    /// Build with the WebDAV transport.
    pub fn build(config: AppConfig) -> Result<Self> {
        let transport = WebDavTransport::new(config.request_timeout())
            .map_err(|e| anyhow!("Failed to create WebDAV client: {}", e))?;
        Ok(Self::with_remote(config, Arc::new(transport)))
    }

    pub fn with_remote(config: AppConfig, remote: Arc<dyn RemoteStore>) -> Self {
        let settings = Arc::new(JsonSettingsStore::new(config.settings_path()));
        let library = Arc::new(JsonLibrary::new(config.library_path()));
        let notifier = Arc::new(BroadcastNotifier::default());
        let engine = SyncEngine::new(
            config.engine_config(),
            SyncCollaborators {
                remote,
                library: library.clone(),
                settings: settings.clone(),
                notifier: notifier.clone(),
            },
        );
        Self {
            config,
            engine: Arc::new(engine),
            settings,
            library,
            notifier,
        }
    }

    /// Start periodic syncing, unless the interval is 0.
    pub fn start_scheduler(&self) -> Option<SyncScheduler> {
        let config = self.config.scheduler_config()?;
        Some(SyncScheduler::spawn(self.engine.clone(), config))
    }

    /// Save new sync settings. Saving enabled settings triggers an immediate
    /// forced sync, whose result is returned.
    pub async fn configure(&self, settings: SyncSettings) -> Result<Option<SyncResult>> {
        self.settings
            .save_sync_settings(&settings)
            .await
            .context("Failed to save sync settings")?;
        info!("sync settings saved (enabled: {})", settings.enabled);
        if !settings.enabled {
            return Ok(None);
        }
        Ok(Some(self.engine.perform_sync(true).await))
    }
}
