// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PersistentStore
//!
//! Application service over a [`LearningRepository`]. Adds the behaviour the
//! repositories deliberately leave out:
//!
//! - `load` never fails; first use and unreadable data both yield an empty
//!   structure
//! - `save` refreshes the metadata totals before writing
//! - one exclusive lock per agent, held by `save` and by the whole
//!   load→mutate→save cycle of [`PersistentStore::update`]
//! - export/import through a single ordered document
//! - confirmation-gated clear
//!
//! ## Concurrency
//!
//! The tracker and the sharing bus only write through `update`, so two of
//! them touching the same agent never lose each other's changes. A caller
//! that does its own `load` followed by `save` can still overwrite a
//! concurrent `update`; the lock only covers what happens inside the store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::agent::AgentId;
use crate::domain::config::StorageConfig;
use crate::domain::errors::{LearningError, Result};
use crate::domain::events::LearningEvent;
use crate::domain::learning_data::LearningData;
use crate::domain::repository::LearningRepository;
use crate::infrastructure::atomic_write::AtomicWriter;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::export::ExportDocument;

/// The only token `clear` accepts
pub const CLEAR_CONFIRMATION_TOKEN: &str = "CONFIRM_CLEAR_LEARNING_DATA";

/// Summary of one agent's learning data for maintenance tooling
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub agent_id: AgentId,
    pub patterns: usize,
    pub strategies: usize,
    pub errors: usize,
    pub total_investigations: u64,
    pub successful_investigations: u64,
    pub failed_investigations: u64,
    pub average_strategy_confidence: f64,
    pub top_strategy: Option<String>,
    pub last_updated: DateTime<Utc>,
}

pub struct PersistentStore {
    repository: Arc<dyn LearningRepository>,
    writer: AtomicWriter,
    event_bus: EventBus,
    locks: [Mutex<()>; AgentId::COUNT],
}

impl PersistentStore {
    pub fn new(repository: Arc<dyn LearningRepository>) -> Self {
        Self {
            repository,
            writer: AtomicWriter::from_config(&StorageConfig::default()),
            event_bus: EventBus::default(),
            locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    /// Writer used for export files
    pub fn with_writer(mut self, writer: AtomicWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn repository(&self) -> &Arc<dyn LearningRepository> {
        &self.repository
    }

    fn lock_for(&self, agent: AgentId) -> &Mutex<()> {
        &self.locks[agent as usize]
    }

    /// The agent's learning data, or an empty structure when there is none
    /// or it cannot be read.
    pub async fn load(&self, agent: AgentId) -> LearningData {
        match self.repository.load(agent).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!(agent = %agent, "No learning data yet, starting empty");
                LearningData::empty(agent)
            }
            Err(e) => {
                warn!(agent = %agent, error = %e, "Failed to load learning data, starting empty");
                LearningData::empty(agent)
            }
        }
    }

    /// Refresh the metadata totals of `data` and persist it.
    pub async fn save(&self, agent: AgentId, data: &mut LearningData) -> Result<()> {
        let _guard = self.lock_for(agent).lock().await;
        self.write(agent, data).await
    }

    async fn write(&self, agent: AgentId, data: &mut LearningData) -> Result<()> {
        data.metadata.agent_id = agent;
        data.refresh_metadata();
        self.repository.save(agent, data).await.map_err(|e| {
            warn!(agent = %agent, error = %e, "Failed to save learning data");
            e
        })
    }

    /// Load, apply `mutate`, save; all under the agent's lock.
    ///
    /// If the save fails the mutation is lost and the error is returned.
    pub async fn update<R, F>(&self, agent: AgentId, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut LearningData) -> R + Send,
        R: Send,
    {
        let _guard = self.lock_for(agent).lock().await;
        let mut data = self.load(agent).await;
        let outcome = mutate(&mut data);
        self.write(agent, &mut data).await?;
        Ok(outcome)
    }

    /// Write one agent's (or every agent's) collections to a single file.
    ///
    /// Without an explicit agent only agents that have stored data are
    /// included. Returns the exported agents.
    pub async fn export(&self, path: &Path, agent: Option<AgentId>) -> Result<Vec<AgentId>> {
        let mut document = ExportDocument::new();

        match agent {
            Some(agent) => {
                let data = self.load(agent).await;
                document.insert(agent, &data);
            }
            None => {
                for agent in AgentId::ALL {
                    match self.repository.load(agent).await {
                        Ok(Some(data)) => document.insert(agent, &data),
                        Ok(None) => {}
                        Err(e) => {
                            warn!(agent = %agent, error = %e, "Skipping unreadable agent in export");
                        }
                    }
                }
            }
        }

        self.writer.write_json(path, &document).await?;

        let agents = document.agents();
        info!(path = %path.display(), agents = agents.len(), "Exported learning data");
        Ok(agents)
    }

    /// Read an export file and save every agent found in it.
    pub async fn import(&self, path: &Path) -> Result<Vec<AgentId>> {
        let document = ExportDocument::read_from(path).await?;

        let mut imported = Vec::with_capacity(document.len());
        for (agent, mut data) in document.into_learning_data() {
            self.save(agent, &mut data).await?;
            imported.push(agent);
        }

        info!(path = %path.display(), agents = imported.len(), "Imported learning data");
        Ok(imported)
    }

    /// Delete everything stored for `agent`. Nothing is touched unless
    /// `confirmation` is exactly [`CLEAR_CONFIRMATION_TOKEN`].
    pub async fn clear(&self, agent: AgentId, confirmation: &str) -> Result<()> {
        if confirmation != CLEAR_CONFIRMATION_TOKEN {
            warn!(agent = %agent, "Refusing to clear learning data without confirmation");
            return Err(LearningError::validation(format!(
                "clearing learning data for {} requires the confirmation token {}",
                agent, CLEAR_CONFIRMATION_TOKEN
            )));
        }

        let _guard = self.lock_for(agent).lock().await;
        self.repository.delete(agent).await?;

        info!(agent = %agent, "Cleared learning data");
        self.event_bus.publish(LearningEvent::LearningDataCleared {
            agent_id: agent,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    pub async fn stats(&self, agent: AgentId) -> LearningStats {
        let data = self.load(agent).await;

        let average_strategy_confidence = if data.strategies.is_empty() {
            0.0
        } else {
            data.strategies.values().map(|s| s.confidence).sum::<f64>() / data.strategies.len() as f64
        };

        let top_strategy = data
            .strategies
            .values()
            .max_by(|a, b| {
                a.confidence
                    .total_cmp(&b.confidence)
                    .then_with(|| b.strategy_id.cmp(&a.strategy_id))
            })
            .map(|s| s.strategy_id.clone());

        LearningStats {
            agent_id: agent,
            patterns: data.patterns.len(),
            strategies: data.strategies.len(),
            errors: data.errors.len(),
            total_investigations: data.metadata.total_investigations,
            successful_investigations: data.metadata.successful_investigations,
            failed_investigations: data.metadata.failed_investigations,
            average_strategy_confidence,
            top_strategy,
            last_updated: data.metadata.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::StrategyPerformance;
    use crate::infrastructure::memory_repository::InMemoryLearningRepository;
    use tokio_test::{assert_err, assert_ok};

    fn store() -> PersistentStore {
        PersistentStore::new(Arc::new(InMemoryLearningRepository::new()))
    }

    #[tokio::test]
    async fn test_load_unknown_agent_is_empty() {
        let data = store().load(AgentId::Ino).await;
        assert!(data.is_empty());
        assert_eq!(data.metadata.version, "1.0.0");
        assert_eq!(data.metadata.total_investigations, 0);
        assert_eq!(data.agent_id(), AgentId::Ino);
    }

    #[test]
    fn test_stats_for_unknown_agent() {
        let stats = tokio_test::block_on(store().stats(AgentId::Aj));
        assert_eq!(stats.patterns, 0);
        assert_eq!(stats.average_strategy_confidence, 0.0);
        assert!(stats.top_strategy.is_none());
    }

    #[tokio::test]
    async fn test_save_refreshes_totals() {
        let store = store();
        let mut data = LearningData::empty(AgentId::Tan);
        data.upsert_strategy(StrategyPerformance::new("a", "A", AgentId::Tan));
        data.upsert_strategy(StrategyPerformance::new("b", "B", AgentId::Tan));

        store.save(AgentId::Tan, &mut data).await.unwrap();

        let loaded = store.load(AgentId::Tan).await;
        assert_eq!(loaded.metadata.total_strategies, 2);
        assert_eq!(loaded.metadata.total_patterns, 0);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(store());

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update(AgentId::Juno, |data| data.metadata.record_investigation(true))
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let data = store.load(AgentId::Juno).await;
        assert_eq!(data.metadata.total_investigations, 20);
        assert_eq!(data.metadata.successful_investigations, 20);
    }

    #[tokio::test]
    async fn test_clear_requires_exact_token() {
        let store = store();
        store
            .update(AgentId::Zen, |data| {
                data.upsert_strategy(StrategyPerformance::new("s", "S", AgentId::Zen))
            })
            .await
            .unwrap();

        let err = assert_err!(store.clear(AgentId::Zen, "confirm_clear_learning_data").await);
        assert!(err.is_validation());
        assert_eq!(store.load(AgentId::Zen).await.strategies.len(), 1);

        assert_ok!(store.clear(AgentId::Zen, CLEAR_CONFIRMATION_TOKEN).await);
        assert!(store.load(AgentId::Zen).await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_publishes_event() {
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let store = store().with_event_bus(bus);

        store.clear(AgentId::Aj, CLEAR_CONFIRMATION_TOKEN).await.unwrap();

        match events.try_recv().unwrap() {
            LearningEvent::LearningDataCleared { agent_id, .. } => assert_eq!(agent_id, AgentId::Aj),
            other => panic!("unexpected event {}", other.event_type()),
        }
    }

    #[tokio::test]
    async fn test_stats() {
        let store = store();
        store
            .update(AgentId::Tan, |data| {
                let mut strong = StrategyPerformance::new("strong", "Strong", AgentId::Tan);
                for i in 0..9 {
                    strong.record_outcome(&format!("inv-{}", i), true, 100.0, 10.0);
                }
                let mut weak = StrategyPerformance::new("weak", "Weak", AgentId::Tan);
                weak.record_outcome("inv-x", false, 100.0, 10.0);
                data.upsert_strategy(strong);
                data.upsert_strategy(weak);
                data.metadata.record_investigation(false);
            })
            .await
            .unwrap();

        let stats = store.stats(AgentId::Tan).await;
        assert_eq!(stats.strategies, 2);
        assert_eq!(stats.top_strategy.as_deref(), Some("strong"));
        assert_eq!(stats.failed_investigations, 1);
        // (0.3 + 0.0) / 2
        assert!((stats.average_strategy_confidence - 0.15).abs() < 1e-9);
    }
}
