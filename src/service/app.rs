//! Main application state and service coordination
//!
//! This module contains the AppState that wires configuration, the store,
//! the rating engine and metrics together, and owns the background tasks.

use crate::config::AppConfig;
use crate::metrics::MetricsCollector;
use crate::rating::{EloRatingEngine, RatingEngine};
use crate::service::rankings::RankingService;
use crate::store::{CategoryStore, InMemoryStore, MatchStore};
use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Categories, competitors and match history
    store: Arc<InMemoryStore>,

    /// Ranking computations over the store
    rankings: Arc<RankingService>,

    /// Metrics collector shared with the HTTP layer
    metrics: Arc<MetricsCollector>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application, loading the snapshot file if one is configured
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing {} service", config.service.name);

        let store = match &config.storage.data_file {
            Some(path) if path.exists() => {
                InMemoryStore::load_snapshot(path).map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to load data file: {}", e),
                })?
            }
            Some(path) => {
                info!(
                    "Data file {} does not exist yet, starting with an empty store",
                    path.display()
                );
                InMemoryStore::new()
            }
            None => {
                info!("No data file configured, starting with an empty store");
                InMemoryStore::new()
            }
        };

        Self::with_store(config, Arc::new(store))
    }

    /// Build the application around an existing store
    pub fn with_store(config: AppConfig, store: Arc<InMemoryStore>) -> Result<Self, ServiceError> {
        let metrics =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let engine = EloRatingEngine::new(config.rating.engine_config()).map_err(|e| {
            ServiceError::Configuration {
                message: format!("Failed to initialize rating engine: {}", e),
            }
        })?;
        info!(
            "Rating engine: Elo K={} initial={}",
            engine.settings().k_factor(),
            engine.initial_rating()
        );

        let rankings = Arc::new(RankingService::with_metrics(
            Arc::new(engine),
            store.clone(),
            metrics.clone(),
        ));

        let state = Self {
            config,
            store,
            rankings,
            metrics,
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        };
        state.refresh_store_metrics();

        Ok(state)
    }

    /// Mark the service as running and start background tasks
    pub async fn start(&self) -> Result<(), ServiceError> {
        info!("Starting {} service", self.config.service.name);

        *self.is_running.write().await = true;
        self.start_background_tasks().await;

        info!("✅ {} service started successfully", self.config.service.name);
        Ok(())
    }

    /// Stop background tasks and write the snapshot back if configured
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of {}", self.config.service.name);

        *self.is_running.write().await = false;
        self.stop_background_tasks().await;

        if self.config.storage.persist_on_shutdown {
            self.persist()?;
        }

        info!("✅ {} shutdown completed", self.config.service.name);
        Ok(())
    }

    /// Write the current store contents to the configured data file
    pub fn persist(&self) -> Result<(), ServiceError> {
        let Some(path) = &self.config.storage.data_file else {
            return Err(ServiceError::Configuration {
                message: "No data file configured".to_string(),
            });
        };

        self.store
            .save_snapshot(path)
            .map_err(|e| ServiceError::Persistence {
                message: format!("Failed to write data file: {}", e),
            })
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the store
    pub fn store(&self) -> Arc<InMemoryStore> {
        self.store.clone()
    }

    /// Get the ranking service
    pub fn rankings(&self) -> Arc<RankingService> {
        self.rankings.clone()
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Time since the state was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Update store size gauges from the current store contents
    pub fn refresh_store_metrics(&self) {
        refresh_store_metrics(&self.store, &self.metrics);
    }

    /// Start background maintenance tasks
    async fn start_background_tasks(&self) {
        info!("Starting metrics update task (30s interval)...");
        let metrics_task = {
            let store = self.store.clone();
            let metrics = self.metrics.clone();
            let is_running = self.is_running.clone();
            let started_at = self.started_at;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(30));
                info!("Metrics update task started");

                while *is_running.read().await {
                    interval.tick().await;

                    let uptime_seconds = started_at.elapsed().as_secs() as i64;
                    metrics.service().uptime_seconds.set(uptime_seconds);
                    refresh_store_metrics(&store, &metrics);

                    debug!("Updated service metrics - uptime: {}s", uptime_seconds);
                }

                info!("Metrics update task stopped");
            })
        };

        self.background_tasks.lock().await.push(metrics_task);
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&self) {
        let mut tasks = self.background_tasks.lock().await;
        let task_count = tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);
        for (i, task) in tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}

fn store_counts(store: &InMemoryStore) -> Result<(usize, usize, usize)> {
    Ok((
        store.list_categories()?.len(),
        store.competitor_count()?,
        store.match_count()?,
    ))
}

fn refresh_store_metrics(store: &InMemoryStore, metrics: &MetricsCollector) {
    match store_counts(store) {
        Ok((categories, competitors, matches)) => {
            metrics.update_store_counts(categories, competitors, matches);
            metrics.update_component_health("store", true);
        }
        Err(e) => {
            error!("Failed to read store counts: {}", e);
            metrics.update_component_health("store", false);
        }
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        if let Ok(tasks) = self.background_tasks.try_lock() {
            if !tasks.is_empty() {
                warn!("AppState dropped with {} background tasks running", tasks.len());
                for task in tasks.iter() {
                    task.abort();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CompetitorStore;
    use crate::types::NewCompetitor;

    fn test_config() -> AppConfig {
        AppConfig::default()
    }

    #[tokio::test]
    async fn test_empty_state() {
        let state = AppState::new(test_config()).await.unwrap();
        assert!(!state.is_running().await);
        assert_eq!(state.store().match_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let state = AppState::new(test_config()).await.unwrap();

        state.start().await.unwrap();
        assert!(state.is_running().await);

        state.shutdown().await.unwrap();
        assert!(!state.is_running().await);
    }

    #[tokio::test]
    async fn test_rejects_invalid_engine_config() {
        let mut config = test_config();
        config.rating.k_factor = -1.0;
        assert!(matches!(
            AppState::new(config).await,
            Err(ServiceError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_persist_on_shutdown_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ladder.json");

        let mut config = test_config();
        config.storage.data_file = Some(path.clone());
        config.storage.persist_on_shutdown = true;

        let state = AppState::new(config.clone()).await.unwrap();
        state.store().add_category("Melee").unwrap();
        state
            .store()
            .add_competitor(NewCompetitor {
                nickname: "Mango".to_string(),
                ..Default::default()
            })
            .unwrap();
        state.start().await.unwrap();
        state.shutdown().await.unwrap();
        assert!(path.exists());

        let reloaded = AppState::new(config).await.unwrap();
        assert_eq!(reloaded.store().list_categories().unwrap().len(), 1);
        assert_eq!(reloaded.store().competitor_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persist_without_data_file() {
        let state = AppState::new(test_config()).await.unwrap();
        assert!(state.persist().is_err());
    }
}
