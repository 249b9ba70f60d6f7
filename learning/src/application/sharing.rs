// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Knowledge Sharing Bus
//!
//! Moves validated knowledge between agents and keeps unproven ideas local.
//!
//! - **Patterns** are broadcast to subscribers of the other agents. Delivery
//!   is best effort: each subscriber runs concurrently, bounded by a timeout
//!   and inside its own failure boundary, so one slow or failing subscriber
//!   never blocks or aborts the others.
//! - **Strategies** are copied straight into target stores. A fresh copy
//!   starts with zeroed evidence; an existing entry is only replaced by a
//!   strictly more confident version, which then keeps its counters.
//! - **Acceptance** of a shared pattern is gated by the role
//!   [`CapabilityTable`].
//!
//! Anything crossing an agent boundary must reach the sharing threshold
//! (default 0.8).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::store::PersistentStore;
use crate::domain::agent::AgentId;
use crate::domain::capability::CapabilityTable;
use crate::domain::errors::{ensure_unit_interval, LearningError, Result};
use crate::domain::events::LearningEvent;
use crate::domain::pattern::LearnedPattern;
use crate::domain::strategy::StrategyPerformance;
use crate::infrastructure::event_bus::EventBus;

pub const DEFAULT_SHARING_THRESHOLD: f64 = 0.8;
pub const DEFAULT_SUBSCRIBER_TIMEOUT: Duration = Duration::from_secs(5);

/// Envelope handed to pattern subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternBroadcast {
    pub pattern: LearnedPattern,
    pub source_agent: AgentId,
    pub broadcast_time: DateTime<Utc>,
}

#[async_trait]
pub trait PatternSubscriber: Send + Sync {
    async fn on_pattern(&self, broadcast: &PatternBroadcast) -> anyhow::Result<()>;
}

/// Adapts an async closure into a [`PatternSubscriber`]
pub struct FnSubscriber<F>(F);

impl<F, Fut> FnSubscriber<F>
where
    F: Fn(PatternBroadcast) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    pub fn new(callback: F) -> Arc<dyn PatternSubscriber> {
        Arc::new(Self(callback))
    }
}

#[async_trait]
impl<F, Fut> PatternSubscriber for FnSubscriber<F>
where
    F: Fn(PatternBroadcast) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn on_pattern(&self, broadcast: &PatternBroadcast) -> anyhow::Result<()> {
        (self.0)(broadcast.clone()).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShareReport {
    /// Targets that received a fresh copy
    pub installed: Vec<AgentId>,
    /// Targets whose less confident copy was replaced
    pub replaced: Vec<AgentId>,
    /// The source itself and targets that already held an equal or better copy
    pub skipped: Vec<AgentId>,
}

/// Qualifying knowledge contributed by one agent
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedKnowledge {
    pub source_agent: AgentId,
    pub patterns: Vec<LearnedPattern>,
    pub strategies: Vec<StrategyPerformance>,
}

enum ShareOutcome {
    Installed,
    Replaced,
    Skipped,
}

type Subscriptions = HashMap<AgentId, Vec<(SubscriptionId, Arc<dyn PatternSubscriber>)>>;

pub struct KnowledgeSharingBus {
    store: Arc<PersistentStore>,
    capabilities: CapabilityTable,
    sharing_threshold: RwLock<f64>,
    subscriber_timeout: Duration,
    subscriptions: RwLock<Subscriptions>,
    event_bus: EventBus,
}

impl KnowledgeSharingBus {
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self {
            store,
            capabilities: CapabilityTable::default(),
            sharing_threshold: RwLock::new(DEFAULT_SHARING_THRESHOLD),
            subscriber_timeout: DEFAULT_SUBSCRIBER_TIMEOUT,
            subscriptions: RwLock::new(HashMap::new()),
            event_bus: EventBus::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: CapabilityTable) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_sharing_threshold(self, threshold: f64) -> Result<Self> {
        self.set_sharing_threshold(threshold)?;
        Ok(self)
    }

    pub fn with_subscriber_timeout(mut self, timeout: Duration) -> Self {
        self.subscriber_timeout = timeout;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn set_sharing_threshold(&self, threshold: f64) -> Result<()> {
        ensure_unit_interval("sharing threshold", threshold)?;
        *self.sharing_threshold.write() = threshold;
        Ok(())
    }

    pub fn sharing_threshold(&self) -> f64 {
        *self.sharing_threshold.read()
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    fn ensure_shareable(&self, kind: &str, id: &str, confidence: f64) -> Result<()> {
        let threshold = self.sharing_threshold();
        if confidence.is_nan() || confidence < threshold {
            return Err(LearningError::validation(format!(
                "{} {} has confidence {:.3}, below the sharing threshold {:.3}",
                kind, id, confidence, threshold
            )));
        }
        Ok(())
    }

    pub fn subscribe_to_patterns(&self, agent: AgentId, subscriber: Arc<dyn PatternSubscriber>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.subscriptions
            .write()
            .entry(agent)
            .or_default()
            .push((id, subscriber));
        debug!(agent = %agent, subscription = %id, "Pattern subscription added");
        id
    }

    /// Remove one subscription, or every subscription of `agent` when `id`
    /// is `None`. Returns how many were removed.
    pub fn unsubscribe_from_patterns(&self, agent: AgentId, id: Option<SubscriptionId>) -> usize {
        let mut subscriptions = self.subscriptions.write();
        let removed = match id {
            None => subscriptions.remove(&agent).map(|subs| subs.len()).unwrap_or(0),
            Some(id) => match subscriptions.get_mut(&agent) {
                Some(subs) => {
                    let before = subs.len();
                    subs.retain(|(sub_id, _)| *sub_id != id);
                    let removed = before - subs.len();
                    if subs.is_empty() {
                        subscriptions.remove(&agent);
                    }
                    removed
                }
                None => 0,
            },
        };
        debug!(agent = %agent, removed, "Pattern subscriptions removed");
        removed
    }

    pub fn subscription_count(&self, agent: AgentId) -> usize {
        self.subscriptions
            .read()
            .get(&agent)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    /// Deliver `pattern` to every subscriber of every agent except `source`.
    pub async fn broadcast_pattern(&self, pattern: &LearnedPattern, source: AgentId) -> Result<BroadcastReport> {
        self.ensure_shareable("pattern", &pattern.pattern_id, pattern.confidence)?;

        let envelope = PatternBroadcast {
            pattern: pattern.clone(),
            source_agent: source,
            broadcast_time: Utc::now(),
        };

        let targets: Vec<(AgentId, SubscriptionId, Arc<dyn PatternSubscriber>)> = {
            let subscriptions = self.subscriptions.read();
            source
                .others()
                .flat_map(|agent| {
                    subscriptions
                        .get(&agent)
                        .into_iter()
                        .flatten()
                        .map(move |(id, sub)| (agent, *id, sub.clone()))
                })
                .collect()
        };

        let timeout = self.subscriber_timeout;
        let envelope = &envelope;
        let deliveries = targets.into_iter().map(|(agent, id, subscriber)| async move {
            let outcome = match tokio::time::timeout(timeout, subscriber.on_pattern(envelope)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("timed out after {:?}", timeout)),
            };
            (agent, id, outcome)
        });

        let mut report = BroadcastReport::default();
        for (agent, id, outcome) in join_all(deliveries).await {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    report.failed += 1;
                    metrics::counter!("aegis_learning_subscriber_failures_total").increment(1);
                    warn!(
                        pattern_id = %pattern.pattern_id,
                        agent = %agent,
                        subscription = %id,
                        error = %error,
                        "Pattern subscriber failed"
                    );
                }
            }
        }

        metrics::counter!("aegis_learning_patterns_broadcast_total").increment(1);
        info!(
            pattern_id = %pattern.pattern_id,
            source = %source,
            delivered = report.delivered,
            failed = report.failed,
            "Pattern broadcast"
        );
        self.event_bus.publish(LearningEvent::PatternBroadcast {
            pattern_id: pattern.pattern_id.clone(),
            source_agent: source,
            delivered: report.delivered,
            failed: report.failed,
            timestamp: envelope.broadcast_time,
        });

        Ok(report)
    }

    /// Copy `strategy` into each target's store.
    pub async fn share_strategy(
        &self,
        strategy: &StrategyPerformance,
        source: AgentId,
        targets: &[AgentId],
    ) -> Result<ShareReport> {
        self.ensure_shareable("strategy", &strategy.strategy_id, strategy.confidence)?;

        let mut report = ShareReport::default();
        for &target in targets {
            if target == source {
                report.skipped.push(target);
                continue;
            }

            let outcome = self
                .store
                .update(target, |data| {
                    let existing = data
                        .strategies
                        .get(&strategy.strategy_id)
                        .map(|existing| existing.confidence);
                    match existing {
                        Some(confidence) if strategy.confidence > confidence => {
                            data.upsert_strategy(strategy.with_owner(target));
                            ShareOutcome::Replaced
                        }
                        Some(_) => ShareOutcome::Skipped,
                        None => {
                            data.upsert_strategy(strategy.transfer_to(target));
                            ShareOutcome::Installed
                        }
                    }
                })
                .await?;

            let replaced = match outcome {
                ShareOutcome::Installed => {
                    report.installed.push(target);
                    false
                }
                ShareOutcome::Replaced => {
                    report.replaced.push(target);
                    true
                }
                ShareOutcome::Skipped => {
                    debug!(
                        strategy_id = %strategy.strategy_id,
                        target = %target,
                        "Target already holds an equally or more confident strategy"
                    );
                    report.skipped.push(target);
                    continue;
                }
            };

            metrics::counter!("aegis_learning_strategies_shared_total").increment(1);
            info!(
                strategy_id = %strategy.strategy_id,
                source = %source,
                target = %target,
                replaced,
                "Strategy shared"
            );
            self.event_bus.publish(LearningEvent::StrategyShared {
                strategy_id: strategy.strategy_id.clone(),
                source_agent: source,
                target_agent: target,
                replaced,
                timestamp: Utc::now(),
            });
        }

        Ok(report)
    }

    /// Patterns and strategies of every other agent at or above
    /// `min_confidence` (default 0.8), one bundle per contributing agent.
    pub async fn get_shared_knowledge(
        &self,
        agent: AgentId,
        min_confidence: Option<f64>,
    ) -> Result<Vec<SharedKnowledge>> {
        let min_confidence = min_confidence.unwrap_or(DEFAULT_SHARING_THRESHOLD);
        ensure_unit_interval("minimum confidence", min_confidence)?;

        let mut bundles = Vec::new();
        for other in agent.others() {
            let data = self.store.load(other).await;

            let mut patterns: Vec<LearnedPattern> = data
                .patterns
                .into_values()
                .filter(|p| p.confidence >= min_confidence)
                .collect();
            let mut strategies: Vec<StrategyPerformance> = data
                .strategies
                .into_values()
                .filter(|s| s.confidence >= min_confidence)
                .collect();

            if patterns.is_empty() && strategies.is_empty() {
                continue;
            }

            patterns.sort_by(|a, b| a.pattern_id.cmp(&b.pattern_id));
            strategies.sort_by(|a, b| a.strategy_id.cmp(&b.strategy_id));
            bundles.push(SharedKnowledge {
                source_agent: other,
                patterns,
                strategies,
            });
        }

        Ok(bundles)
    }

    /// Whether `agent`'s role accepts the pattern's type
    pub fn validate_pattern(&self, pattern: &LearnedPattern, agent: AgentId) -> bool {
        self.capabilities.accepts(agent, pattern.pattern_type)
    }

    /// Install a shared pattern into `target`'s store with evidence reset.
    pub async fn accept_shared_pattern(&self, pattern: &LearnedPattern, target: AgentId) -> Result<LearnedPattern> {
        if !self.validate_pattern(pattern, target) {
            return Err(LearningError::validation(format!(
                "agent {} does not accept {} patterns",
                target, pattern.pattern_type
            )));
        }

        let installed = pattern.transfer_to(target);
        let copy = installed.clone();
        self.store
            .update(target, move |data| data.upsert_pattern(copy))
            .await?;

        info!(pattern_id = %pattern.pattern_id, target = %target, "Shared pattern accepted");
        self.event_bus.publish(LearningEvent::PatternAccepted {
            pattern_id: pattern.pattern_id.clone(),
            pattern_type: pattern.pattern_type,
            target_agent: target,
            timestamp: Utc::now(),
        });

        Ok(installed)
    }
}
