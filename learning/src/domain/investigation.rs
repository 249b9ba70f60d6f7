// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Investigation contracts
//!
//! Shapes exchanged with the external investigation runner and planner.
//! The planner hands an [`InvestigationContext`] to the selector before an
//! investigation starts; the runner hands an [`InvestigationResult`] to the
//! tracker when it ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error_resolution::ErrorObservation;
use super::pattern::PatternObservation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationContext {
    /// e.g. "security-audit", "performance-review"
    pub investigation_type: String,
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
}

impl InvestigationContext {
    pub fn new(investigation_type: impl Into<String>) -> Self {
        Self {
            investigation_type: investigation_type.into(),
            scope: Vec::new(),
            framework: None,
            language: None,
            complexity: None,
        }
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = Some(complexity);
        self
    }
}

/// Lifecycle state of an investigation, carrying only what is valid in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvestigationStatus {
    Planned,
    InProgress {
        started_at: DateTime<Utc>,
    },
    Completed {
        completed_at: DateTime<Utc>,
        #[serde(default)]
        findings: Vec<PatternObservation>,
        #[serde(default)]
        resolutions: Vec<ErrorObservation>,
        /// Non-fatal errors raised along the way
        #[serde(default)]
        errors: Vec<String>,
    },
    Failed {
        failed_at: DateTime<Utc>,
        errors: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationResult {
    pub investigation_id: String,
    pub investigation_type: String,
    pub status: InvestigationStatus,
}

impl InvestigationResult {
    pub fn completed(investigation_id: impl Into<String>, investigation_type: impl Into<String>) -> Self {
        Self {
            investigation_id: investigation_id.into(),
            investigation_type: investigation_type.into(),
            status: InvestigationStatus::Completed {
                completed_at: Utc::now(),
                findings: Vec::new(),
                resolutions: Vec::new(),
                errors: Vec::new(),
            },
        }
    }

    pub fn failed(
        investigation_id: impl Into<String>,
        investigation_type: impl Into<String>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            investigation_id: investigation_id.into(),
            investigation_type: investigation_type.into(),
            status: InvestigationStatus::Failed {
                failed_at: Utc::now(),
                errors,
            },
        }
    }

    /// Attach a finding; ignored unless the status is `Completed`
    pub fn with_finding(mut self, finding: PatternObservation) -> Self {
        if let InvestigationStatus::Completed { findings, .. } = &mut self.status {
            findings.push(finding);
        }
        self
    }

    /// Attach an error resolution; ignored unless the status is `Completed`
    pub fn with_resolution(mut self, resolution: ErrorObservation) -> Self {
        if let InvestigationStatus::Completed { resolutions, .. } = &mut self.status {
            resolutions.push(resolution);
        }
        self
    }

    /// Completed with an empty error list
    pub fn is_success(&self) -> bool {
        matches!(&self.status, InvestigationStatus::Completed { errors, .. } if errors.is_empty())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            InvestigationStatus::Completed { .. } | InvestigationStatus::Failed { .. }
        )
    }

    pub fn errors(&self) -> &[String] {
        match &self.status {
            InvestigationStatus::Completed { errors, .. } => errors,
            InvestigationStatus::Failed { errors, .. } => errors,
            _ => &[],
        }
    }

    pub fn findings(&self) -> &[PatternObservation] {
        match &self.status {
            InvestigationStatus::Completed { findings, .. } => findings,
            _ => &[],
        }
    }

    pub fn resolutions(&self) -> &[ErrorObservation] {
        match &self.status {
            InvestigationStatus::Completed { resolutions, .. } => resolutions,
            _ => &[],
        }
    }

    pub fn status_name(&self) -> &'static str {
        match self.status {
            InvestigationStatus::Planned => "planned",
            InvestigationStatus::InProgress { .. } => "in_progress",
            InvestigationStatus::Completed { .. } => "completed",
            InvestigationStatus::Failed { .. } => "failed",
        }
    }
}
