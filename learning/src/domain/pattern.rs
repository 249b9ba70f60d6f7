// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Learned patterns
//!
//! A pattern is a recurring characteristic observed across investigations.
//! It is created on first detection and reinforced on each later detection;
//! nothing but an explicit, confirmed clear removes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::agent::AgentId;
use super::confidence::compute_confidence;

/// Maximum number of evidence strings kept per pattern
pub const MAX_PATTERN_EXAMPLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternCategory {
    Security,
    Performance,
    Architecture,
    CodeQuality,
    Testing,
    Accessibility,
    ErrorHandling,
    StateManagement,
    DataFlow,
    UiUx,
    Other,
}

/// Finer-grained tag used to decide which agents may accept a shared pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternType {
    FrameworkDetection,
    StructurePattern,
    DependencyPattern,
    DocumentationPattern,
    ResearchSource,
    ValidationRule,
    AntiPattern,
    ToolUsage,
}

impl PatternType {
    pub const ALL: [PatternType; 8] = [
        PatternType::FrameworkDetection,
        PatternType::StructurePattern,
        PatternType::DependencyPattern,
        PatternType::DocumentationPattern,
        PatternType::ResearchSource,
        PatternType::ValidationRule,
        PatternType::AntiPattern,
        PatternType::ToolUsage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::FrameworkDetection => "framework-detection",
            PatternType::StructurePattern => "structure-pattern",
            PatternType::DependencyPattern => "dependency-pattern",
            PatternType::DocumentationPattern => "documentation-pattern",
            PatternType::ResearchSource => "research-source",
            PatternType::ValidationRule => "validation-rule",
            PatternType::AntiPattern => "anti-pattern",
            PatternType::ToolUsage => "tool-usage",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnedPattern {
    pub pattern_id: String,
    pub category: PatternCategory,
    pub pattern_type: PatternType,
    pub description: String,
    #[serde(default)]
    pub context: Vec<String>,
    pub usage_count: u64,
    pub success_count: u64,
    pub confidence: f64,
    pub agent_id: AgentId,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl LearnedPattern {
    /// A pattern that has not been observed yet (zero counters)
    pub fn new(
        pattern_id: impl Into<String>,
        category: PatternCategory,
        pattern_type: PatternType,
        description: impl Into<String>,
        agent_id: AgentId,
    ) -> Self {
        let now = Utc::now();
        Self {
            pattern_id: pattern_id.into(),
            category,
            pattern_type,
            description: description.into(),
            context: Vec::new(),
            usage_count: 0,
            success_count: 0,
            confidence: 0.0,
            agent_id,
            first_seen: now,
            last_seen: now,
            examples: Vec::new(),
        }
    }

    /// Build a pattern from its first detection
    pub fn from_observation(observation: &PatternObservation, agent_id: AgentId) -> Self {
        let mut pattern = Self::new(
            observation.pattern_id.clone(),
            observation.category,
            observation.pattern_type,
            observation.description.clone(),
            agent_id,
        );
        pattern.context = observation.context.clone();
        pattern.record_detection(observation.success, observation.example.clone());
        pattern
    }

    pub fn record_detection(&mut self, success: bool, example: Option<String>) {
        self.usage_count += 1;
        if success {
            self.success_count += 1;
        }
        self.last_seen = Utc::now();
        if let Some(example) = example {
            if !self.examples.contains(&example) {
                self.examples.push(example);
                if self.examples.len() > MAX_PATTERN_EXAMPLES {
                    self.examples.remove(0);
                }
            }
        }
        self.recompute_confidence();
    }

    pub fn recompute_confidence(&mut self) {
        self.confidence = compute_confidence(self.success_count, self.usage_count);
    }

    /// Copy owned by `target` with all usage evidence reset
    pub fn transfer_to(&self, target: AgentId) -> Self {
        Self {
            agent_id: target,
            usage_count: 0,
            success_count: 0,
            ..self.clone()
        }
    }
}

/// A pattern detected while running an investigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternObservation {
    pub pattern_id: String,
    pub category: PatternCategory,
    pub pattern_type: PatternType,
    pub description: String,
    #[serde(default)]
    pub context: Vec<String>,
    /// Whether acting on the pattern helped the investigation
    pub success: bool,
    #[serde(default)]
    pub example: Option<String>,
}
