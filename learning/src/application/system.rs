// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Learning System - wiring for the store, tracker, selector and sharing bus
//!
//! Every component shares one [`PersistentStore`] and one [`EventBus`], so
//! all writes for an agent go through the same per-agent lock.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::selector::StrategySelectionEngine;
use crate::application::sharing::KnowledgeSharingBus;
use crate::application::store::PersistentStore;
use crate::application::sweeper::TrackingSweeper;
use crate::application::tracker::{PerformanceTracker, SharedTokenCounter};
use crate::domain::config::LearningConfig;
use crate::domain::errors::Result;
use crate::domain::repository::LearningRepository;
use crate::infrastructure::atomic_write::AtomicWriter;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::file_repository::FileLearningRepository;

pub struct LearningSystem {
    pub config: LearningConfig,
    pub store: Arc<PersistentStore>,
    pub tracker: Arc<PerformanceTracker>,
    pub selector: Arc<StrategySelectionEngine>,
    pub sharing: Arc<KnowledgeSharingBus>,
    pub event_bus: EventBus,
    tokens: SharedTokenCounter,
}

impl LearningSystem {
    /// File-backed system rooted at `config.storage.root_dir`
    pub fn from_config(config: &LearningConfig) -> Result<Self> {
        let repository = Arc::new(FileLearningRepository::from_config(&config.storage));
        Self::with_repository(config, repository)
    }

    pub fn with_repository(config: &LearningConfig, repository: Arc<dyn LearningRepository>) -> Result<Self> {
        let event_bus = EventBus::with_default_capacity();
        let tokens = SharedTokenCounter::new();

        let store = Arc::new(
            PersistentStore::new(repository)
                .with_writer(AtomicWriter::from_config(&config.storage))
                .with_event_bus(event_bus.clone()),
        );

        let tracker = Arc::new(
            PerformanceTracker::new(store.clone(), Arc::new(tokens.clone())).with_event_bus(event_bus.clone()),
        );

        let selector = Arc::new(
            StrategySelectionEngine::new(store.clone())
                .with_confidence_threshold(config.selection.confidence_threshold)?,
        );

        let sharing = Arc::new(
            KnowledgeSharingBus::new(store.clone())
                .with_sharing_threshold(config.sharing.threshold)?
                .with_subscriber_timeout(config.sharing.subscriber_timeout())
                .with_event_bus(event_bus.clone()),
        );

        info!(
            root_dir = %config.storage.root_dir.display(),
            selection_threshold = config.selection.confidence_threshold,
            sharing_threshold = config.sharing.threshold,
            "Learning system initialized"
        );

        Ok(Self {
            config: config.clone(),
            store,
            tracker,
            selector,
            sharing,
            event_bus,
            tokens,
        })
    }

    /// Counter the investigation runner bumps as it spends tokens
    pub fn token_counter(&self) -> SharedTokenCounter {
        self.tokens.clone()
    }

    /// Start the stale-record sweeper. Cancel the returned token to stop it.
    pub fn spawn_sweeper(&self) -> (CancellationToken, JoinHandle<()>) {
        let sweeper = Arc::new(TrackingSweeper::new(self.tracker.clone(), self.config.tracking.clone()));
        let shutdown = sweeper.shutdown_token();
        (shutdown, sweeper.start())
    }
}
