// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Strategy performance records
//!
//! A strategy is a named approach to running an investigation. Its record
//! accumulates outcomes, rolling duration/token averages and the derived
//! confidence used for selection and sharing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::agent::AgentId;
use super::confidence::{compute_confidence, fold_average, success_rate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPerformance {
    pub strategy_id: String,
    pub strategy_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub applicable_contexts: Vec<String>,
    pub usage_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Rolling mean wall-clock duration in milliseconds
    pub average_duration: f64,
    /// Rolling mean token cost per investigation
    pub token_efficiency: f64,
    pub confidence: f64,
    pub success_rate: f64,
    pub agent_id: AgentId,
    pub last_used: DateTime<Utc>,
    #[serde(default)]
    pub successful_investigations: Vec<String>,
    #[serde(default)]
    pub failed_investigations: Vec<String>,
}

impl StrategyPerformance {
    pub fn new(
        strategy_id: impl Into<String>,
        strategy_name: impl Into<String>,
        agent_id: AgentId,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            strategy_name: strategy_name.into(),
            description: String::new(),
            applicable_contexts: Vec::new(),
            usage_count: 0,
            success_count: 0,
            failure_count: 0,
            average_duration: 0.0,
            token_efficiency: 0.0,
            confidence: 0.0,
            success_rate: 0.0,
            agent_id,
            last_used: Utc::now(),
            successful_investigations: Vec::new(),
            failed_investigations: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applicable_contexts = contexts.into_iter().map(Into::into).collect();
        self
    }

    /// Fold one completed investigation into the record.
    ///
    /// The first outcome seeds the averages directly; later outcomes use the
    /// incremental mean over `usage_count`.
    pub fn record_outcome(
        &mut self,
        investigation_id: &str,
        success: bool,
        duration_ms: f64,
        tokens: f64,
    ) {
        self.usage_count += 1;
        if success {
            self.success_count += 1;
            self.successful_investigations.push(investigation_id.to_string());
        } else {
            self.failure_count += 1;
            self.failed_investigations.push(investigation_id.to_string());
        }

        self.average_duration = fold_average(self.average_duration, duration_ms, self.usage_count);
        self.token_efficiency = fold_average(self.token_efficiency, tokens, self.usage_count);
        self.last_used = Utc::now();
        self.recompute();
    }

    pub fn recompute(&mut self) {
        self.success_rate = success_rate(self.success_count, self.usage_count);
        self.confidence = compute_confidence(self.success_count, self.usage_count);
    }

    /// Fresh copy for `target`: ownership reassigned, usage evidence cleared
    pub fn transfer_to(&self, target: AgentId) -> Self {
        Self {
            agent_id: target,
            usage_count: 0,
            success_count: 0,
            failure_count: 0,
            successful_investigations: Vec::new(),
            failed_investigations: Vec::new(),
            ..self.clone()
        }
    }

    /// Same record, owned by `target`; counters untouched
    pub fn with_owner(&self, target: AgentId) -> Self {
        Self {
            agent_id: target,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_outcome_seeds_averages() {
        let mut strategy = StrategyPerformance::new("s1", "Static Sweep", AgentId::Juno);
        strategy.record_outcome("inv-1", true, 1200.0, 3400.0);

        assert_eq!(strategy.usage_count, 1);
        assert_eq!(strategy.success_count, 1);
        assert_eq!(strategy.failure_count, 0);
        assert_eq!(strategy.average_duration, 1200.0);
        assert_eq!(strategy.token_efficiency, 3400.0);
        assert_eq!(strategy.success_rate, 1.0);
        assert!((strategy.confidence - 0.1).abs() < 1e-12);
        assert_eq!(strategy.successful_investigations, vec!["inv-1".to_string()]);
    }

    #[test]
    fn test_incremental_average() {
        let mut strategy = StrategyPerformance::new("s1", "Static Sweep", AgentId::Juno);
        strategy.record_outcome("inv-1", true, 100.0, 10.0);
        strategy.record_outcome("inv-2", false, 200.0, 20.0);
        strategy.record_outcome("inv-3", true, 600.0, 60.0);

        assert_eq!(strategy.usage_count, 3);
        assert_eq!(strategy.failure_count, 1);
        assert!((strategy.average_duration - 300.0).abs() < 1e-9);
        assert!((strategy.token_efficiency - 30.0).abs() < 1e-9);
        assert!((strategy.success_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(strategy.failed_investigations, vec!["inv-2".to_string()]);
    }

    #[test]
    fn test_counters_stay_consistent() {
        let mut strategy = StrategyPerformance::new("s1", "Static Sweep", AgentId::Juno);
        for i in 0..50 {
            strategy.record_outcome(&format!("inv-{}", i), i % 4 != 0, 10.0, 1.0);
            assert_eq!(strategy.usage_count, strategy.success_count + strategy.failure_count);
            assert!((0.0..=1.0).contains(&strategy.confidence));
        }
    }

    #[test]
    fn test_transfer_resets_counters() {
        let mut strategy = StrategyPerformance::new("s1", "Static Sweep", AgentId::Juno)
            .with_contexts(["security-audit"]);
        for i in 0..5 {
            strategy.record_outcome(&format!("inv-{}", i), true, 10.0, 1.0);
        }

        let copy = strategy.transfer_to(AgentId::Tan);
        assert_eq!(copy.agent_id, AgentId::Tan);
        assert_eq!(copy.usage_count, 0);
        assert_eq!(copy.success_count, 0);
        assert_eq!(copy.failure_count, 0);
        assert!(copy.successful_investigations.is_empty());
        assert_eq!(copy.applicable_contexts, vec!["security-audit".to_string()]);

        let owned = strategy.with_owner(AgentId::Tan);
        assert_eq!(owned.usage_count, 5);
        assert_eq!(owned.agent_id, AgentId::Tan);
    }
}
