// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Strategy Selection Engine
//!
//! Picks the best-evidenced learned strategy for a new investigation, or a
//! built-in default for the investigation type. A learned strategy only wins
//! when its confidence reaches the configured threshold.
//!
//! Ranking score: `clamp01(success_rate * 0.6 + confidence * 0.4)`.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::store::PersistentStore;
use crate::domain::agent::AgentId;
use crate::domain::confidence::clamp01;
use crate::domain::errors::{ensure_unit_interval, Result};
use crate::domain::investigation::InvestigationContext;
use crate::domain::strategy::StrategyPerformance;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

const SUCCESS_RATE_WEIGHT: f64 = 0.6;
const CONFIDENCE_WEIGHT: f64 = 0.4;

const DEFAULT_STRATEGY_CONFIDENCE: f64 = 0.5;
const DEFAULT_STRATEGY_SUCCESS_RATE: f64 = 0.6;

const FALLBACK_INVESTIGATION_TYPE: &str = "comprehensive-review";

/// investigation type, name, description
const DEFAULT_STRATEGIES: [(&str, &str, &str); 7] = [
    (
        "security-audit",
        "Security Audit",
        "Trace untrusted input to sensitive sinks, then review authentication, authorization and secret handling",
    ),
    (
        "performance-review",
        "Performance Review",
        "Locate hot paths first, then inspect allocation, I/O and query patterns along them",
    ),
    (
        "architecture-review",
        "Architecture Review",
        "Map module boundaries and dependency direction, then look for layering violations",
    ),
    (
        "code-quality",
        "Code Quality Review",
        "Survey complexity, duplication, naming and test coverage across the codebase",
    ),
    (
        "dependency-audit",
        "Dependency Audit",
        "Inventory direct and transitive dependencies and check versions, licences and advisories",
    ),
    (
        "documentation-review",
        "Documentation Review",
        "Compare public interfaces and guides against the behaviour the code actually has",
    ),
    (
        FALLBACK_INVESTIGATION_TYPE,
        "Comprehensive Review",
        "Broad pass over structure, quality, security and documentation",
    ),
];

/// Which rule made a strategy applicable; checked in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextMatch {
    /// No applicable contexts listed
    Universal,
    Exact,
    Substring,
    WordOverlap,
    Framework,
    Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionOrigin {
    Learned,
    Default,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedStrategy {
    pub strategy: StrategyPerformance,
    pub score: f64,
    pub confidence: f64,
    pub justification: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategySelection {
    pub strategy: StrategyPerformance,
    pub origin: SelectionOrigin,
    pub score: f64,
    pub justification: String,
}

impl StrategySelection {
    pub fn is_default(&self) -> bool {
        self.origin == SelectionOrigin::Default
    }
}

pub struct StrategySelectionEngine {
    store: Arc<PersistentStore>,
    confidence_threshold: RwLock<f64>,
}

impl StrategySelectionEngine {
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self {
            store,
            confidence_threshold: RwLock::new(DEFAULT_CONFIDENCE_THRESHOLD),
        }
    }

    pub fn with_confidence_threshold(self, threshold: f64) -> Result<Self> {
        self.set_confidence_threshold(threshold)?;
        Ok(self)
    }

    pub fn set_confidence_threshold(&self, threshold: f64) -> Result<()> {
        ensure_unit_interval("confidence threshold", threshold)?;
        *self.confidence_threshold.write() = threshold;
        Ok(())
    }

    pub fn confidence_threshold(&self) -> f64 {
        *self.confidence_threshold.read()
    }

    /// Best learned strategy for `context`, or the default for its type.
    pub async fn select_strategy(&self, agent: AgentId, context: &InvestigationContext) -> StrategySelection {
        let data = self.store.load(agent).await;

        let mut candidates: Vec<StrategyPerformance> = data
            .strategies
            .into_values()
            .filter(|strategy| is_applicable_to_context(strategy, context))
            .collect();
        // HashMap order is arbitrary; fix it so ties rank the same every time
        candidates.sort_by(|a, b| a.strategy_id.cmp(&b.strategy_id));

        if candidates.is_empty() {
            debug!(agent = %agent, investigation_type = %context.investigation_type, "No applicable learned strategies");
            return self.fallback(
                agent,
                context,
                "no applicable learned strategy".to_string(),
            );
        }

        let threshold = self.confidence_threshold();
        let best = rank_strategies(&candidates).into_iter().next();

        match best {
            Some(best) if best.confidence >= threshold => {
                info!(
                    agent = %agent,
                    investigation_type = %context.investigation_type,
                    strategy_id = %best.strategy.strategy_id,
                    score = best.score,
                    "Selected learned strategy"
                );
                StrategySelection {
                    strategy: best.strategy,
                    origin: SelectionOrigin::Learned,
                    score: best.score,
                    justification: best.justification,
                }
            }
            Some(best) => {
                let reason = format!(
                    "best learned strategy {} has {:.0}% confidence, below the {:.0}% threshold",
                    best.strategy.strategy_id,
                    best.confidence * 100.0,
                    threshold * 100.0
                );
                self.fallback(agent, context, reason)
            }
            None => self.fallback(agent, context, "no applicable learned strategy".to_string()),
        }
    }

    fn fallback(&self, agent: AgentId, context: &InvestigationContext, reason: String) -> StrategySelection {
        let strategy = default_strategy(agent, &context.investigation_type);
        info!(
            agent = %agent,
            investigation_type = %context.investigation_type,
            strategy_id = %strategy.strategy_id,
            reason = %reason,
            "Selected default strategy"
        );
        StrategySelection {
            score: score(&strategy),
            justification: format!("Default strategy: {}", reason),
            strategy,
            origin: SelectionOrigin::Default,
        }
    }
}

fn score(strategy: &StrategyPerformance) -> f64 {
    clamp01(strategy.success_rate * SUCCESS_RATE_WEIGHT + strategy.confidence * CONFIDENCE_WEIGHT)
}

/// Score and sort `strategies`, best first. Equal scores keep input order.
pub fn rank_strategies(strategies: &[StrategyPerformance]) -> Vec<RankedStrategy> {
    let mut ranked: Vec<RankedStrategy> = strategies
        .iter()
        .map(|strategy| RankedStrategy {
            score: score(strategy),
            confidence: strategy.confidence,
            justification: format!(
                "{:.0}% success rate over {} uses, {:.0}% confidence",
                strategy.success_rate * 100.0,
                strategy.usage_count,
                strategy.confidence * 100.0
            ),
            strategy: strategy.clone(),
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

pub fn is_applicable_to_context(strategy: &StrategyPerformance, context: &InvestigationContext) -> bool {
    context_match(strategy, context).is_some()
}

/// First applicability rule that matches, if any
pub fn context_match(strategy: &StrategyPerformance, context: &InvestigationContext) -> Option<ContextMatch> {
    if strategy.applicable_contexts.is_empty() {
        return Some(ContextMatch::Universal);
    }

    let investigation_type = context.investigation_type.trim().to_lowercase();
    let tags: Vec<String> = strategy
        .applicable_contexts
        .iter()
        .map(|tag| tag.to_lowercase())
        .collect();

    if tags.iter().any(|tag| *tag == investigation_type) {
        return Some(ContextMatch::Exact);
    }

    // An empty string is a substring of everything
    if !investigation_type.is_empty()
        && tags
            .iter()
            .filter(|tag| !tag.trim().is_empty())
            .any(|tag| tag.contains(&investigation_type) || investigation_type.contains(tag.as_str()))
    {
        return Some(ContextMatch::Substring);
    }

    let type_words = words(&investigation_type);
    if tags
        .iter()
        .any(|tag| words(tag).iter().any(|word| word.len() > 2 && type_words.contains(word)))
    {
        return Some(ContextMatch::WordOverlap);
    }

    if let Some(framework) = non_blank(context.framework.as_deref()) {
        if tags.iter().any(|tag| tag.contains(&framework)) {
            return Some(ContextMatch::Framework);
        }
    }

    if let Some(language) = non_blank(context.language.as_deref()) {
        if tags.iter().any(|tag| tag.contains(&language)) {
            return Some(ContextMatch::Language);
        }
    }

    None
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

fn words(value: &str) -> Vec<&str> {
    value
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Built-in strategy for `investigation_type`; unknown types get the
/// comprehensive review.
pub fn default_strategy(agent: AgentId, investigation_type: &str) -> StrategyPerformance {
    let (kind, name, description) = DEFAULT_STRATEGIES
        .iter()
        .find(|(kind, _, _)| kind.eq_ignore_ascii_case(investigation_type))
        .or_else(|| {
            DEFAULT_STRATEGIES
                .iter()
                .find(|(kind, _, _)| *kind == FALLBACK_INVESTIGATION_TYPE)
        })
        .copied()
        .unwrap_or(DEFAULT_STRATEGIES[DEFAULT_STRATEGIES.len() - 1]);

    let mut strategy = StrategyPerformance::new(format!("default-{}", kind), name, agent)
        .with_description(description)
        .with_contexts([kind]);
    strategy.confidence = DEFAULT_STRATEGY_CONFIDENCE;
    strategy.success_rate = DEFAULT_STRATEGY_SUCCESS_RATE;
    strategy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_repository::InMemoryLearningRepository;

    fn strategy(id: &str, contexts: &[&str]) -> StrategyPerformance {
        StrategyPerformance::new(id, id, AgentId::Tan).with_contexts(contexts.iter().copied())
    }

    fn proven(id: &str, successes: u64, uses: u64) -> StrategyPerformance {
        let mut s = StrategyPerformance::new(id, id, AgentId::Juno);
        for i in 0..uses {
            s.record_outcome(&format!("{}-{}", id, i), i < successes, 100.0, 10.0);
        }
        s
    }

    #[test]
    fn test_applicability_rules_in_order() {
        let ctx = InvestigationContext::new("security-audit")
            .with_framework("Django")
            .with_language("python");

        assert_eq!(context_match(&strategy("any", &[]), &ctx), Some(ContextMatch::Universal));
        assert_eq!(context_match(&strategy("e", &["Security-Audit"]), &ctx), Some(ContextMatch::Exact));
        assert_eq!(context_match(&strategy("s", &["security"]), &ctx), Some(ContextMatch::Substring));
        assert_eq!(context_match(&strategy("s2", &["full-security-audit-v2"]), &ctx), Some(ContextMatch::Substring));
        assert_eq!(context_match(&strategy("w", &["audit_trail"]), &ctx), Some(ContextMatch::WordOverlap));
        assert_eq!(context_match(&strategy("f", &["django-orm"]), &ctx), Some(ContextMatch::Framework));
        assert_eq!(context_match(&strategy("l", &["python-typing"]), &ctx), Some(ContextMatch::Language));
        assert_eq!(context_match(&strategy("n", &["frontend-perf"]), &ctx), None);
    }

    #[test]
    fn test_blank_framework_or_language_matches_nothing() {
        let unrelated = strategy("n", &["frontend-perf"]);

        for blank in ["", "   "] {
            let ctx = InvestigationContext::new("security-audit")
                .with_framework(blank)
                .with_language(blank);
            assert_eq!(context_match(&unrelated, &ctx), None);
        }

        let ctx = InvestigationContext::new("  ");
        assert_eq!(context_match(&unrelated, &ctx), None);
    }

    #[tokio::test]
    async fn test_blank_framework_falls_back_to_default() {
        let store = Arc::new(PersistentStore::new(Arc::new(InMemoryLearningRepository::new())));
        store
            .update(AgentId::Juno, |data| {
                data.upsert_strategy(proven("frontend", 100, 100).with_contexts(["frontend-perf"]))
            })
            .await
            .unwrap();
        let engine = StrategySelectionEngine::new(store);

        let ctx = InvestigationContext::new("security-audit").with_framework("");
        let selection = engine.select_strategy(AgentId::Juno, &ctx).await;
        assert!(selection.is_default());
        assert_eq!(selection.strategy.strategy_id, "default-security-audit");
    }

    #[test]
    fn test_word_overlap_ignores_short_tokens() {
        let ctx = InvestigationContext::new("ui-review");
        // "ui" is the only shared word and is too short
        assert!(!is_applicable_to_context(&strategy("a", &["ui-lint"]), &ctx));
        // "review" is long enough, false positives included
        assert!(is_applicable_to_context(&strategy("b", &["contract review"]), &ctx));
    }

    #[test]
    fn test_rank_sorted_by_weighted_score() {
        let strategies = vec![proven("weak", 1, 4), proven("strong", 40, 40), proven("middle", 7, 10)];
        let ranked = rank_strategies(&strategies);

        let ids: Vec<_> = ranked.iter().map(|r| r.strategy.strategy_id.as_str()).collect();
        assert_eq!(ids, vec!["strong", "middle", "weak"]);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for r in &ranked {
            let expected = clamp01(r.strategy.success_rate * 0.6 + r.strategy.confidence * 0.4);
            assert!((r.score - expected).abs() < 1e-12);
        }
        assert!(ranked[0].justification.contains("100% success rate over 40 uses"));
    }

    #[test]
    fn test_default_table() {
        let s = default_strategy(AgentId::Juno, "security-audit");
        assert_eq!(s.strategy_id, "default-security-audit");
        assert_eq!(s.confidence, 0.5);
        assert_eq!(s.success_rate, 0.6);
        assert_eq!(s.usage_count, 0);

        let unknown = default_strategy(AgentId::Juno, "license-scan");
        assert_eq!(unknown.strategy_id, "default-comprehensive-review");
    }

    #[tokio::test]
    async fn test_empty_agent_gets_default() {
        let store = Arc::new(PersistentStore::new(Arc::new(InMemoryLearningRepository::new())));
        let engine = StrategySelectionEngine::new(store);

        let selection = engine
            .select_strategy(AgentId::Juno, &InvestigationContext::new("security-audit"))
            .await;

        assert!(selection.is_default());
        assert_eq!(selection.strategy.confidence, 0.5);
        assert_eq!(selection.strategy.success_rate, 0.6);
        assert_eq!(selection.strategy.usage_count, 0);
        assert!((selection.score - 0.56).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_under_evidenced_strategy_loses_to_default() {
        let store = Arc::new(PersistentStore::new(Arc::new(InMemoryLearningRepository::new())));
        store
            .update(AgentId::Juno, |data| {
                // 10/10 successes -> confidence ~0.316
                let mut s = proven("taint-trace", 10, 10);
                s.applicable_contexts = vec!["security-audit".into()];
                data.upsert_strategy(s);
            })
            .await
            .unwrap();
        let engine = StrategySelectionEngine::new(store);
        let ctx = InvestigationContext::new("security-audit");

        let selection = engine.select_strategy(AgentId::Juno, &ctx).await;
        assert!(selection.is_default());
        assert!(selection.justification.contains("taint-trace"));

        engine.set_confidence_threshold(0.3).unwrap();
        let selection = engine.select_strategy(AgentId::Juno, &ctx).await;
        assert_eq!(selection.origin, SelectionOrigin::Learned);
        assert_eq!(selection.strategy.strategy_id, "taint-trace");
    }

    #[test]
    fn test_threshold_validation() {
        let store = Arc::new(PersistentStore::new(Arc::new(InMemoryLearningRepository::new())));
        let engine = StrategySelectionEngine::new(store);

        assert_eq!(engine.confidence_threshold(), 0.7);
        assert!(engine.set_confidence_threshold(1.2).unwrap_err().is_validation());
        assert!(engine.set_confidence_threshold(-0.01).unwrap_err().is_validation());
        assert_eq!(engine.confidence_threshold(), 0.7);
        engine.set_confidence_threshold(1.0).unwrap();
        assert_eq!(engine.confidence_threshold(), 1.0);
    }
}
