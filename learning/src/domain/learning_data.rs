// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Per-agent learning aggregate: the four persisted collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::agent::AgentId;
use super::error_resolution::ErrorResolution;
use super::pattern::LearnedPattern;
use super::strategy::StrategyPerformance;

pub const LEARNING_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningMetadata {
    pub version: String,
    pub total_patterns: u64,
    pub total_strategies: u64,
    pub total_investigations: u64,
    pub successful_investigations: u64,
    pub failed_investigations: u64,
    pub last_updated: DateTime<Utc>,
    pub agent_id: AgentId,
}

impl LearningMetadata {
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            version: LEARNING_SCHEMA_VERSION.to_string(),
            total_patterns: 0,
            total_strategies: 0,
            total_investigations: 0,
            successful_investigations: 0,
            failed_investigations: 0,
            last_updated: Utc::now(),
            agent_id,
        }
    }

    pub fn record_investigation(&mut self, success: bool) {
        self.total_investigations += 1;
        if success {
            self.successful_investigations += 1;
        } else {
            self.failed_investigations += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningData {
    pub patterns: HashMap<String, LearnedPattern>,
    pub strategies: HashMap<String, StrategyPerformance>,
    pub errors: HashMap<String, ErrorResolution>,
    pub metadata: LearningMetadata,
}

impl LearningData {
    /// First-use state for an agent
    pub fn empty(agent_id: AgentId) -> Self {
        Self {
            patterns: HashMap::new(),
            strategies: HashMap::new(),
            errors: HashMap::new(),
            metadata: LearningMetadata::new(agent_id),
        }
    }

    pub fn agent_id(&self) -> AgentId {
        self.metadata.agent_id
    }

    /// Sync the metadata totals with the live collections and stamp the update
    pub fn refresh_metadata(&mut self) {
        self.metadata.total_patterns = self.patterns.len() as u64;
        self.metadata.total_strategies = self.strategies.len() as u64;
        self.metadata.last_updated = Utc::now();
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.strategies.is_empty() && self.errors.is_empty()
    }

    pub fn upsert_pattern(&mut self, pattern: LearnedPattern) {
        self.patterns.insert(pattern.pattern_id.clone(), pattern);
    }

    pub fn upsert_strategy(&mut self, strategy: StrategyPerformance) {
        self.strategies.insert(strategy.strategy_id.clone(), strategy);
    }
}
