// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository interface for per-agent learning data
//!
//! Implementations persist the four collections of one agent as a unit of
//! namespace. They do not serialize concurrent writers; the store service
//! layered on top does.

use async_trait::async_trait;

use super::agent::AgentId;
use super::errors::Result;
use super::learning_data::LearningData;

#[async_trait]
pub trait LearningRepository: Send + Sync {
    /// `Ok(None)` when the agent has never been saved
    async fn load(&self, agent: AgentId) -> Result<Option<LearningData>>;

    /// Persist every collection of `data` for `agent`
    async fn save(&self, agent: AgentId, data: &LearningData) -> Result<()>;

    /// Remove everything stored for `agent`; missing data is not an error
    async fn delete(&self, agent: AgentId) -> Result<()>;
}
