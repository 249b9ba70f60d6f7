// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Performance Tracker - Measures investigations and feeds rolling statistics
//!
//! The investigation runner opens a record when an investigation starts,
//! optionally attaches the strategy it is using, and closes the record with
//! the final result. Closing folds the outcome into the agent's store:
//! strategy averages and confidence, pattern detections, error resolutions
//! and the metadata counters.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** In-memory tracking table plus the store update on completion
//!
//! The tracking table is synchronous; only the completion step awaits the
//! store. Records that are never completed stay open until
//! [`PerformanceTracker::sweep_stale`] reaps them.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::application::store::PersistentStore;
use crate::domain::agent::AgentId;
use crate::domain::error_resolution::ErrorResolution;
use crate::domain::errors::{LearningError, Result};
use crate::domain::events::LearningEvent;
use crate::domain::investigation::InvestigationResult;
use crate::domain::pattern::LearnedPattern;
use crate::domain::strategy::StrategyPerformance;
use crate::infrastructure::event_bus::EventBus;

/// Source of the running token total used to measure resource usage
pub trait TokenCounter: Send + Sync {
    fn tokens_used(&self) -> u64;
}

/// Atomic counter the runner bumps as it spends tokens
#[derive(Debug, Clone, Default)]
pub struct SharedTokenCounter {
    total: Arc<AtomicU64>,
}

impl SharedTokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, tokens: u64) {
        self.total.fetch_add(tokens, Ordering::Relaxed);
    }
}

impl TokenCounter for SharedTokenCounter {
    fn tokens_used(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

struct StrategyRun {
    strategy_id: String,
    started_at: Instant,
    token_baseline: u64,
}

struct TrackingRecord {
    agent_id: AgentId,
    started_at: Instant,
    opened_at: DateTime<Utc>,
    token_baseline: u64,
    errors: Vec<String>,
    strategy: Option<StrategyRun>,
}

/// An investigation that has been started but not completed
#[derive(Debug, Clone, Serialize)]
pub struct OpenInvestigation {
    pub investigation_id: String,
    pub agent_id: AgentId,
    pub opened_at: DateTime<Utc>,
    pub age: Duration,
    pub strategy_id: Option<String>,
    pub error_count: usize,
}

/// What the tracker measured for one completed investigation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestigationMetrics {
    pub investigation_id: String,
    pub agent_id: AgentId,
    pub duration_ms: f64,
    pub tokens_used: u64,
    /// Failures reported while open plus errors carried by the result
    pub error_count: usize,
    pub success: bool,
    pub strategy_id: Option<String>,
}

pub struct PerformanceTracker {
    store: Arc<PersistentStore>,
    tokens: Arc<dyn TokenCounter>,
    records: Mutex<HashMap<String, TrackingRecord>>,
    event_bus: EventBus,
}

impl PerformanceTracker {
    pub fn new(store: Arc<PersistentStore>, tokens: Arc<dyn TokenCounter>) -> Self {
        Self {
            store,
            tokens,
            records: Mutex::new(HashMap::new()),
            event_bus: EventBus::default(),
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn track_investigation_start(&self, investigation_id: &str, agent_id: AgentId) -> Result<()> {
        let mut records = self.records.lock();
        if records.contains_key(investigation_id) {
            return Err(LearningError::AlreadyTracked(investigation_id.to_string()));
        }

        records.insert(
            investigation_id.to_string(),
            TrackingRecord {
                agent_id,
                started_at: Instant::now(),
                opened_at: Utc::now(),
                token_baseline: self.tokens.tokens_used(),
                errors: Vec::new(),
                strategy: None,
            },
        );

        debug!(investigation_id, agent = %agent_id, "Tracking investigation");
        Ok(())
    }

    /// Attach a strategy to the open record, replacing any earlier one
    pub fn track_strategy_start(&self, investigation_id: &str, strategy_id: &str) -> Result<()> {
        let mut records = self.records.lock();
        let record = records
            .get_mut(investigation_id)
            .ok_or_else(|| LearningError::NotTracked(investigation_id.to_string()))?;

        if let Some(previous) = &record.strategy {
            debug!(
                investigation_id,
                previous = %previous.strategy_id,
                strategy_id,
                "Replacing strategy on tracked investigation"
            );
        }

        record.strategy = Some(StrategyRun {
            strategy_id: strategy_id.to_string(),
            started_at: Instant::now(),
            token_baseline: self.tokens.tokens_used(),
        });

        debug!(investigation_id, strategy_id, "Tracking strategy");
        Ok(())
    }

    /// Count an error against the open record without closing it
    pub fn track_investigation_failure(&self, investigation_id: &str, error: impl Into<String>) -> Result<()> {
        let error = error.into();
        let mut records = self.records.lock();
        let record = records
            .get_mut(investigation_id)
            .ok_or_else(|| LearningError::NotTracked(investigation_id.to_string()))?;

        warn!(investigation_id, agent = %record.agent_id, error = %error, "Investigation reported failure");
        record.errors.push(error);
        Ok(())
    }

    /// Close the record for `investigation_id` and fold `result` into the
    /// agent's store.
    ///
    /// The record is discarded before the store is written; a persistence
    /// error therefore loses this update rather than leaving the record open.
    pub async fn track_investigation_complete(
        &self,
        investigation_id: &str,
        result: &InvestigationResult,
    ) -> Result<InvestigationMetrics> {
        let record = {
            let mut records = self.records.lock();
            if !records.contains_key(investigation_id) {
                return Err(LearningError::NotTracked(investigation_id.to_string()));
            }
            if !result.is_terminal() {
                return Err(LearningError::validation(format!(
                    "investigation {} cannot complete with status {}",
                    investigation_id,
                    result.status_name()
                )));
            }
            records
                .remove(investigation_id)
                .ok_or_else(|| LearningError::NotTracked(investigation_id.to_string()))?
        };

        let now_tokens = self.tokens.tokens_used();
        let duration_ms = elapsed_ms(record.started_at);
        let tokens_used = now_tokens.saturating_sub(record.token_baseline);
        let success = result.is_success();
        let agent = record.agent_id;

        let strategy_sample = record.strategy.as_ref().map(|run| {
            (
                run.strategy_id.clone(),
                elapsed_ms(run.started_at),
                now_tokens.saturating_sub(run.token_baseline) as f64,
            )
        });

        let updated_strategy = self
            .store
            .update(agent, |data| {
                for finding in result.findings() {
                    match data.patterns.get_mut(&finding.pattern_id) {
                        Some(pattern) => pattern.record_detection(finding.success, finding.example.clone()),
                        None => data.upsert_pattern(LearnedPattern::from_observation(finding, agent)),
                    }
                }

                for observation in result.resolutions() {
                    data.errors
                        .entry(observation.error_signature.clone())
                        .or_insert_with(|| {
                            ErrorResolution::new(
                                observation.error_signature.clone(),
                                observation.resolution.clone(),
                                agent,
                            )
                        })
                        .record_occurrence(&observation.resolution, observation.resolved);
                }

                data.metadata.record_investigation(success);

                strategy_sample.map(|(strategy_id, strategy_ms, strategy_tokens)| {
                    let strategy = data
                        .strategies
                        .entry(strategy_id.clone())
                        .or_insert_with(|| StrategyPerformance::new(strategy_id.clone(), strategy_id, agent));
                    strategy.record_outcome(investigation_id, success, strategy_ms, strategy_tokens);
                    strategy.clone()
                })
            })
            .await?;

        let outcome = if success { "success" } else { "failure" };
        metrics::counter!(
            "aegis_learning_investigations_total",
            "agent" => agent.as_str(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("aegis_learning_investigation_duration_ms", "agent" => agent.as_str())
            .record(duration_ms);

        info!(
            investigation_id,
            agent = %agent,
            duration_ms,
            tokens_used,
            success,
            strategy = updated_strategy.as_ref().map(|s| s.strategy_id.as_str()),
            "Investigation completed"
        );

        let now = Utc::now();
        self.event_bus.publish(LearningEvent::InvestigationCompleted {
            investigation_id: investigation_id.to_string(),
            agent_id: agent,
            success,
            duration_ms,
            tokens_used,
            timestamp: now,
        });

        if let Some(strategy) = &updated_strategy {
            debug!(
                strategy_id = %strategy.strategy_id,
                usage_count = strategy.usage_count,
                confidence = strategy.confidence,
                "Strategy performance updated"
            );
            self.event_bus.publish(LearningEvent::StrategyUpdated {
                strategy_id: strategy.strategy_id.clone(),
                agent_id: agent,
                usage_count: strategy.usage_count,
                confidence: strategy.confidence,
                timestamp: now,
            });
        }

        Ok(InvestigationMetrics {
            investigation_id: investigation_id.to_string(),
            agent_id: agent,
            duration_ms,
            tokens_used,
            error_count: record.errors.len() + result.errors().len(),
            success,
            strategy_id: updated_strategy.map(|s| s.strategy_id),
        })
    }

    pub fn is_tracking(&self, investigation_id: &str) -> bool {
        self.records.lock().contains_key(investigation_id)
    }

    /// Open records, oldest first
    pub fn open_investigations(&self) -> Vec<OpenInvestigation> {
        let records = self.records.lock();
        let mut open: Vec<_> = records
            .iter()
            .map(|(id, record)| OpenInvestigation {
                investigation_id: id.clone(),
                agent_id: record.agent_id,
                opened_at: record.opened_at,
                age: record.started_at.elapsed(),
                strategy_id: record.strategy.as_ref().map(|s| s.strategy_id.clone()),
                error_count: record.errors.len(),
            })
            .collect();
        open.sort_by(|a, b| b.age.cmp(&a.age).then_with(|| a.investigation_id.cmp(&b.investigation_id)));
        open
    }

    /// Drop every open record at least `max_age` old. Returns the dropped ids.
    pub fn sweep_stale(&self, max_age: Duration) -> Vec<String> {
        let mut swept: Vec<String> = {
            let mut records = self.records.lock();
            let stale: Vec<String> = records
                .iter()
                .filter(|(_, record)| record.started_at.elapsed() >= max_age)
                .map(|(id, _)| id.clone())
                .collect();
            for id in &stale {
                records.remove(id);
            }
            stale
        };

        if swept.is_empty() {
            return swept;
        }

        swept.sort();
        warn!(count = swept.len(), ids = ?swept, "Swept stale investigation records");
        self.event_bus.publish(LearningEvent::StaleInvestigationsSwept {
            investigation_ids: swept.clone(),
            timestamp: Utc::now(),
        });
        swept
    }
}

fn elapsed_ms(started_at: Instant) -> f64 {
    started_at.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error_resolution::ErrorObservation;
    use crate::domain::investigation::{InvestigationStatus, InvestigationResult};
    use crate::domain::pattern::{PatternCategory, PatternObservation, PatternType};
    use crate::infrastructure::memory_repository::InMemoryLearningRepository;

    fn tracker() -> (PerformanceTracker, Arc<PersistentStore>, SharedTokenCounter) {
        let store = Arc::new(PersistentStore::new(Arc::new(InMemoryLearningRepository::new())));
        let tokens = SharedTokenCounter::new();
        let tracker = PerformanceTracker::new(store.clone(), Arc::new(tokens.clone()));
        (tracker, store, tokens)
    }

    #[tokio::test]
    async fn test_complete_without_start_is_not_tracked() {
        let (tracker, _, _) = tracker();
        let err = tracker
            .track_investigation_complete("ghost", &InvestigationResult::completed("ghost", "code-quality"))
            .await
            .unwrap_err();
        assert!(err.is_not_tracked());
    }

    #[test]
    fn test_duplicate_start_is_rejected() {
        let (tracker, _, _) = tracker();
        tracker.track_investigation_start("inv-1", AgentId::Tan).unwrap();
        assert!(matches!(
            tracker.track_investigation_start("inv-1", AgentId::Zen),
            Err(LearningError::AlreadyTracked(_))
        ));
    }

    #[test]
    fn test_strategy_and_failure_need_open_record() {
        let (tracker, _, _) = tracker();
        assert!(tracker.track_strategy_start("nope", "s").unwrap_err().is_not_tracked());
        assert!(tracker
            .track_investigation_failure("nope", "boom")
            .unwrap_err()
            .is_not_tracked());
    }

    #[tokio::test]
    async fn test_completion_updates_strategy_and_metadata() {
        let (tracker, store, tokens) = tracker();

        tracker.track_investigation_start("inv-1", AgentId::Juno).unwrap();
        tracker.track_strategy_start("inv-1", "taint-trace").unwrap();
        tokens.add(1200);
        tracker.track_investigation_failure("inv-1", "linter timed out").unwrap();

        let metrics = tracker
            .track_investigation_complete("inv-1", &InvestigationResult::completed("inv-1", "security-audit"))
            .await
            .unwrap();

        assert!(metrics.success);
        assert_eq!(metrics.tokens_used, 1200);
        assert_eq!(metrics.error_count, 1);
        assert_eq!(metrics.strategy_id.as_deref(), Some("taint-trace"));
        assert!(!tracker.is_tracking("inv-1"));

        let data = store.load(AgentId::Juno).await;
        let strategy = &data.strategies["taint-trace"];
        assert_eq!(strategy.usage_count, 1);
        assert_eq!(strategy.success_count, 1);
        assert_eq!(strategy.failure_count, 0);
        assert_eq!(strategy.token_efficiency, 1200.0);
        assert_eq!(strategy.successful_investigations, vec!["inv-1".to_string()]);
        assert!((strategy.confidence - 0.1).abs() < 1e-12);
        assert_eq!(data.metadata.total_investigations, 1);
        assert_eq!(data.metadata.successful_investigations, 1);

        // the record is gone, so a second completion references nothing
        let again = tracker
            .track_investigation_complete("inv-1", &InvestigationResult::completed("inv-1", "security-audit"))
            .await;
        assert!(again.unwrap_err().is_not_tracked());
    }

    #[tokio::test]
    async fn test_failed_result_counts_as_failure() {
        let (tracker, store, _) = tracker();

        tracker.track_investigation_start("inv-2", AgentId::Tan).unwrap();
        tracker.track_strategy_start("inv-2", "bottom-up").unwrap();
        let result = InvestigationResult::failed("inv-2", "architecture-review", vec!["parse error".into()]);
        let metrics = tracker.track_investigation_complete("inv-2", &result).await.unwrap();

        assert!(!metrics.success);
        let data = store.load(AgentId::Tan).await;
        assert_eq!(data.strategies["bottom-up"].failure_count, 1);
        assert_eq!(data.strategies["bottom-up"].confidence, 0.0);
        assert_eq!(data.metadata.failed_investigations, 1);
    }

    #[tokio::test]
    async fn test_non_terminal_result_keeps_record_open() {
        let (tracker, _, _) = tracker();
        tracker.track_investigation_start("inv-3", AgentId::Aj).unwrap();

        let result = InvestigationResult {
            investigation_id: "inv-3".into(),
            investigation_type: "code-quality".into(),
            status: InvestigationStatus::InProgress { started_at: Utc::now() },
        };
        let err = tracker.track_investigation_complete("inv-3", &result).await.unwrap_err();

        assert!(err.is_validation());
        assert!(tracker.is_tracking("inv-3"));
    }

    #[tokio::test]
    async fn test_findings_and_resolutions_are_folded() {
        let (tracker, store, _) = tracker();
        let finding = PatternObservation {
            pattern_id: "barrel-exports".into(),
            category: PatternCategory::Architecture,
            pattern_type: PatternType::StructurePattern,
            description: "index files re-export modules".into(),
            context: vec!["typescript".into()],
            success: true,
            example: Some("src/index.ts".into()),
        };
        let resolution = ErrorObservation {
            error_signature: "EACCES".into(),
            resolution: "retry with backoff".into(),
            resolved: true,
        };

        for id in ["a", "b"] {
            tracker.track_investigation_start(id, AgentId::Tan).unwrap();
            let result = InvestigationResult::completed(id, "architecture-review")
                .with_finding(finding.clone())
                .with_resolution(resolution.clone());
            tracker.track_investigation_complete(id, &result).await.unwrap();
        }

        let data = store.load(AgentId::Tan).await;
        let pattern = &data.patterns["barrel-exports"];
        assert_eq!(pattern.usage_count, 2);
        assert_eq!(pattern.success_count, 2);
        assert_eq!(pattern.examples, vec!["src/index.ts".to_string()]);
        assert_eq!(data.errors["EACCES"].occurrence_count, 2);
        assert_eq!(data.errors["EACCES"].success_rate, 1.0);
        assert!(data.strategies.is_empty());
    }

    #[tokio::test]
    async fn test_completion_publishes_events() {
        let store = Arc::new(PersistentStore::new(Arc::new(InMemoryLearningRepository::new())));
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let tracker = PerformanceTracker::new(store, Arc::new(SharedTokenCounter::new())).with_event_bus(bus);

        tracker.track_investigation_start("inv-4", AgentId::Zen).unwrap();
        tracker.track_strategy_start("inv-4", "docs-first").unwrap();
        tracker
            .track_investigation_complete("inv-4", &InvestigationResult::completed("inv-4", "documentation-review"))
            .await
            .unwrap();

        let kinds: Vec<_> = events.drain().iter().map(|e| e.event_type()).collect();
        assert_eq!(kinds, vec!["investigation_completed", "strategy_updated"]);
    }

    #[test]
    fn test_sweep_stale() {
        let (tracker, _, _) = tracker();
        tracker.track_investigation_start("old", AgentId::Ino).unwrap();
        tracker.track_investigation_start("older", AgentId::Ino).unwrap();

        assert!(tracker.sweep_stale(Duration::from_secs(3600)).is_empty());
        assert_eq!(tracker.open_investigations().len(), 2);

        let swept = tracker.sweep_stale(Duration::ZERO);
        assert_eq!(swept, vec!["old".to_string(), "older".to_string()]);
        assert!(tracker.open_investigations().is_empty());
    }
}
