// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Export document codec
//!
//! One JSON document keyed by agent short code, each value holding the same
//! four collections as the per-agent layout on disk. Collections are ordered
//! maps so repeated exports of the same data are byte-identical.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::domain::agent::AgentId;
use crate::domain::error_resolution::ErrorResolution;
use crate::domain::errors::Result;
use crate::domain::learning_data::{LearningData, LearningMetadata};
use crate::domain::pattern::LearnedPattern;
use crate::domain::strategy::StrategyPerformance;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    #[serde(default)]
    pub patterns: BTreeMap<String, LearnedPattern>,
    #[serde(default)]
    pub strategies: BTreeMap<String, StrategyPerformance>,
    #[serde(default)]
    pub errors: BTreeMap<String, ErrorResolution>,
    pub metadata: LearningMetadata,
}

impl From<&LearningData> for AgentSnapshot {
    fn from(data: &LearningData) -> Self {
        Self {
            patterns: data.patterns.clone().into_iter().collect(),
            strategies: data.strategies.clone().into_iter().collect(),
            errors: data.errors.clone().into_iter().collect(),
            metadata: data.metadata.clone(),
        }
    }
}

impl From<AgentSnapshot> for LearningData {
    fn from(snapshot: AgentSnapshot) -> Self {
        Self {
            patterns: snapshot.patterns.into_iter().collect(),
            strategies: snapshot.strategies.into_iter().collect(),
            errors: snapshot.errors.into_iter().collect(),
            metadata: snapshot.metadata,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportDocument {
    agents: BTreeMap<AgentId, AgentSnapshot>,
}

impl ExportDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, agent: AgentId, data: &LearningData) {
        self.agents.insert(agent, AgentSnapshot::from(data));
    }

    pub fn agents(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    pub fn get(&self, agent: AgentId) -> Option<&AgentSnapshot> {
        self.agents.get(&agent)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Per-agent learning data in agent order. Metadata claiming a different
    /// owner than its key is re-stamped with the key.
    pub fn into_learning_data(self) -> Vec<(AgentId, LearningData)> {
        self.agents
            .into_iter()
            .map(|(agent, snapshot)| {
                let mut data = LearningData::from(snapshot);
                if data.metadata.agent_id != agent {
                    warn!(
                        key = %agent,
                        metadata_agent = %data.metadata.agent_id,
                        "Export entry metadata names another agent, using the key"
                    );
                    data.metadata.agent_id = agent;
                }
                (agent, data)
            })
            .collect()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn read_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pattern::{PatternCategory, PatternType};

    fn populated(agent: AgentId) -> LearningData {
        let mut data = LearningData::empty(agent);
        let mut pattern = LearnedPattern::new(
            "missing-input-validation",
            PatternCategory::Security,
            PatternType::ValidationRule,
            "handler trusts request body",
            agent,
        );
        pattern.record_detection(true, Some("src/api/users.rs".to_string()));
        data.upsert_pattern(pattern);
        data.errors.insert(
            "ENOENT".to_string(),
            ErrorResolution::new("ENOENT", "create parent directory", agent),
        );
        data.refresh_metadata();
        data
    }

    #[test]
    fn test_top_level_is_keyed_by_agent_code() {
        let mut doc = ExportDocument::new();
        doc.insert(AgentId::Juno, &populated(AgentId::Juno));
        doc.insert(AgentId::Tan, &LearningData::empty(AgentId::Tan));

        let json = serde_json::to_value(&doc).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["JUNO".to_string(), "TAN".to_string()]);
        assert!(json["JUNO"]["patterns"]["missing-input-validation"].is_object());
        assert_eq!(json["JUNO"]["metadata"]["version"], "1.0.0");
    }

    #[test]
    fn test_decode_restores_collections() {
        let original = populated(AgentId::Juno);
        let mut doc = ExportDocument::new();
        doc.insert(AgentId::Juno, &original);

        let json = serde_json::to_string(&doc).unwrap();
        let decoded = ExportDocument::from_json_str(&json).unwrap();
        let restored = decoded.into_learning_data();

        assert_eq!(restored, vec![(AgentId::Juno, original)]);
    }

    #[test]
    fn test_mismatched_metadata_owner_is_restamped() {
        let mut doc = ExportDocument::new();
        doc.insert(AgentId::Zen, &LearningData::empty(AgentId::Aj));

        let restored = doc.into_learning_data();
        assert_eq!(restored[0].1.metadata.agent_id, AgentId::Zen);
    }
}
