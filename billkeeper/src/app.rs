//! Application state and initialization
//!
//! Opens the configured snapshot storage, restores the store and hands
//! it to the host as `AppState`. Consumers receive the state explicitly.

use crate::config::{AppConfig, StorageBackend};
use crate::error::Result;
use crate::services::{AuthService, KeyringCredentials};
use crate::storage::{JsonFileStorage, SqliteKvStorage};
use crate::store::AppStore;
use std::path::PathBuf;

/// Central application state
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub store: AppStore,
}

impl AppState {
    pub fn new(app_data_dir: PathBuf, store: AppStore) -> Self {
        Self {
            app_data_dir,
            store,
        }
    }

    /// Auth flows backed by the OS credential manager
    pub fn auth(&self) -> AuthService<KeyringCredentials> {
        AuthService::new(KeyringCredentials::new())
    }

    /// Wait for pending writes before the host exits
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Flushing application state");
        self.store.flush().await
    }
}

/// Application setup - called once on startup
pub async fn setup(config: &AppConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", config.data_dir);

    tokio::fs::create_dir_all(&config.data_dir).await?;

    let store = match config.backend {
        StorageBackend::Sqlite => {
            AppStore::open(SqliteKvStorage::open(&config.database_path()).await?).await?
        }
        StorageBackend::JsonFile => {
            AppStore::open(JsonFileStorage::new(config.snapshot_path())).await?
        }
    };

    tracing::info!("Application initialized successfully");

    Ok(AppState::new(config.data_dir.clone(), store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Theme;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_setup_restores_state_for_each_backend() {
        for backend in [StorageBackend::Sqlite, StorageBackend::JsonFile] {
            let temp_dir = TempDir::new().unwrap();
            let config = AppConfig::new(temp_dir.path().join("data"), backend);

            {
                let mut state = setup(&config).await.unwrap();
                assert_eq!(state.store.theme(), Theme::System);
                state.store.set_theme(Theme::Dark);
                state.shutdown().await.unwrap();
            }

            let state = setup(&config).await.unwrap();
            assert_eq!(state.store.theme(), Theme::Dark, "backend {:?}", backend);
        }
    }
}
