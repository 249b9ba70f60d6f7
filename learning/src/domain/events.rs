// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the learning bounded context
//! Published on the in-process event bus for observability and integration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::agent::AgentId;
use super::pattern::PatternType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LearningEvent {
    /// Tracker closed an investigation and updated the agent's counters
    InvestigationCompleted {
        investigation_id: String,
        agent_id: AgentId,
        success: bool,
        duration_ms: f64,
        tokens_used: u64,
        timestamp: DateTime<Utc>,
    },

    /// A strategy record was created or updated from an outcome
    StrategyUpdated {
        strategy_id: String,
        agent_id: AgentId,
        usage_count: u64,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// Open tracking records were reaped by the sweeper
    StaleInvestigationsSwept {
        investigation_ids: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A pattern was fanned out to subscribers
    PatternBroadcast {
        pattern_id: String,
        source_agent: AgentId,
        delivered: usize,
        failed: usize,
        timestamp: DateTime<Utc>,
    },

    /// A strategy was copied into another agent's store
    StrategyShared {
        strategy_id: String,
        source_agent: AgentId,
        target_agent: AgentId,
        replaced: bool,
        timestamp: DateTime<Utc>,
    },

    /// A shared pattern passed validation and was installed
    PatternAccepted {
        pattern_id: String,
        pattern_type: PatternType,
        target_agent: AgentId,
        timestamp: DateTime<Utc>,
    },

    /// All learning data for an agent was deleted
    LearningDataCleared {
        agent_id: AgentId,
        timestamp: DateTime<Utc>,
    },
}

impl LearningEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LearningEvent::InvestigationCompleted { timestamp, .. } => *timestamp,
            LearningEvent::StrategyUpdated { timestamp, .. } => *timestamp,
            LearningEvent::StaleInvestigationsSwept { timestamp, .. } => *timestamp,
            LearningEvent::PatternBroadcast { timestamp, .. } => *timestamp,
            LearningEvent::StrategyShared { timestamp, .. } => *timestamp,
            LearningEvent::PatternAccepted { timestamp, .. } => *timestamp,
            LearningEvent::LearningDataCleared { timestamp, .. } => *timestamp,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            LearningEvent::InvestigationCompleted { .. } => "investigation_completed",
            LearningEvent::StrategyUpdated { .. } => "strategy_updated",
            LearningEvent::StaleInvestigationsSwept { .. } => "stale_investigations_swept",
            LearningEvent::PatternBroadcast { .. } => "pattern_broadcast",
            LearningEvent::StrategyShared { .. } => "strategy_shared",
            LearningEvent::PatternAccepted { .. } => "pattern_accepted",
            LearningEvent::LearningDataCleared { .. } => "learning_data_cleared",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = LearningEvent::StrategyShared {
            strategy_id: "static-sweep".to_string(),
            source_agent: AgentId::Juno,
            target_agent: AgentId::Aj,
            replaced: false,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "strategy_shared");
        assert_eq!(json["target_agent"], "AJ");

        let back: LearningEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.event_type(), event.event_type());
        assert_eq!(back.timestamp(), event.timestamp());
    }
}
