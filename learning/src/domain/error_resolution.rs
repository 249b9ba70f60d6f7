// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::agent::AgentId;
use super::confidence::success_rate;

/// Links an error signature to the resolution that was tried for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResolution {
    pub error_signature: String,
    pub resolution_strategy: String,
    pub occurrence_count: u64,
    pub success_count: u64,
    pub success_rate: f64,
    pub agent_id: AgentId,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl ErrorResolution {
    pub fn new(
        error_signature: impl Into<String>,
        resolution_strategy: impl Into<String>,
        agent_id: AgentId,
    ) -> Self {
        let now = Utc::now();
        Self {
            error_signature: error_signature.into(),
            resolution_strategy: resolution_strategy.into(),
            occurrence_count: 0,
            success_count: 0,
            success_rate: 0.0,
            agent_id,
            first_seen: now,
            last_seen: now,
        }
    }

    /// Count another occurrence. The latest resolution replaces the stored
    /// one only when it worked.
    pub fn record_occurrence(&mut self, resolution: &str, resolved: bool) {
        self.occurrence_count += 1;
        if resolved {
            self.success_count += 1;
            self.resolution_strategy = resolution.to_string();
        }
        self.success_rate = success_rate(self.success_count, self.occurrence_count);
        self.last_seen = Utc::now();
    }
}

/// An error met during an investigation and what was done about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorObservation {
    pub error_signature: String,
    pub resolution: String,
    pub resolved: bool,
}
