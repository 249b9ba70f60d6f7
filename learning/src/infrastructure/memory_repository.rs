// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// In-Memory Learning Repository
//
// Ephemeral storage for tests and throwaway sessions. Data is lost when the
// process exits.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::agent::AgentId;
use crate::domain::errors::Result;
use crate::domain::learning_data::LearningData;
use crate::domain::repository::LearningRepository;

#[derive(Clone, Default)]
pub struct InMemoryLearningRepository {
    agents: Arc<RwLock<HashMap<AgentId, LearningData>>>,
}

impl InMemoryLearningRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agents that currently hold data
    pub fn agents(&self) -> Vec<AgentId> {
        let mut agents: Vec<_> = self.agents.read().keys().copied().collect();
        agents.sort();
        agents
    }
}

#[async_trait]
impl LearningRepository for InMemoryLearningRepository {
    async fn load(&self, agent: AgentId) -> Result<Option<LearningData>> {
        Ok(self.agents.read().get(&agent).cloned())
    }

    async fn save(&self, agent: AgentId, data: &LearningData) -> Result<()> {
        self.agents.write().insert(agent, data.clone());
        Ok(())
    }

    async fn delete(&self, agent: AgentId) -> Result<()> {
        self.agents.write().remove(&agent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_delete() {
        let repo = InMemoryLearningRepository::new();
        assert!(repo.load(AgentId::Zen).await.unwrap().is_none());

        let data = LearningData::empty(AgentId::Zen);
        repo.save(AgentId::Zen, &data).await.unwrap();
        assert_eq!(repo.load(AgentId::Zen).await.unwrap(), Some(data));
        assert_eq!(repo.agents(), vec![AgentId::Zen]);

        repo.delete(AgentId::Zen).await.unwrap();
        assert!(repo.load(AgentId::Zen).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let repo = InMemoryLearningRepository::new();
        let other = repo.clone();

        repo.save(AgentId::Tan, &LearningData::empty(AgentId::Tan))
            .await
            .unwrap();
        assert!(other.load(AgentId::Tan).await.unwrap().is_some());
    }
}
