// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pattern acceptance rules
//!
//! Each agent role accepts only the pattern types that fall within its
//! remit. A role missing from the table accepts nothing.

use std::collections::{BTreeSet, HashMap};

use super::agent::AgentId;
use super::pattern::PatternType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityTable {
    accepted: HashMap<AgentId, BTreeSet<PatternType>>,
}

impl CapabilityTable {
    /// No role accepts anything
    pub fn empty() -> Self {
        Self {
            accepted: HashMap::new(),
        }
    }

    pub fn with_role<I>(mut self, agent: AgentId, types: I) -> Self
    where
        I: IntoIterator<Item = PatternType>,
    {
        self.accepted.insert(agent, types.into_iter().collect());
        self
    }

    pub fn without_role(mut self, agent: AgentId) -> Self {
        self.accepted.remove(&agent);
        self
    }

    pub fn accepts(&self, agent: AgentId, pattern_type: PatternType) -> bool {
        self.accepted
            .get(&agent)
            .map(|types| types.contains(&pattern_type))
            .unwrap_or(false)
    }

    pub fn accepted_types(&self, agent: AgentId) -> Vec<PatternType> {
        self.accepted
            .get(&agent)
            .map(|types| types.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        use PatternType::*;

        Self::empty()
            .with_role(AgentId::Tan, [FrameworkDetection, StructurePattern, DependencyPattern])
            .with_role(AgentId::Zen, [DocumentationPattern, ResearchSource])
            .with_role(AgentId::Ino, PatternType::ALL)
            .with_role(AgentId::Juno, [ValidationRule, AntiPattern])
            .with_role(AgentId::Aj, [StructurePattern, AntiPattern])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = CapabilityTable::default();

        assert!(table.accepts(AgentId::Tan, PatternType::StructurePattern));
        assert!(!table.accepts(AgentId::Tan, PatternType::DocumentationPattern));

        assert!(table.accepts(AgentId::Zen, PatternType::ResearchSource));
        assert!(!table.accepts(AgentId::Zen, PatternType::AntiPattern));

        for pattern_type in PatternType::ALL {
            assert!(table.accepts(AgentId::Ino, pattern_type));
        }

        assert!(table.accepts(AgentId::Juno, PatternType::ValidationRule));
        assert!(!table.accepts(AgentId::Juno, PatternType::FrameworkDetection));

        assert!(table.accepts(AgentId::Aj, PatternType::AntiPattern));
        assert!(!table.accepts(AgentId::Aj, PatternType::ResearchSource));
    }

    #[test]
    fn test_missing_role_accepts_nothing() {
        let table = CapabilityTable::default().without_role(AgentId::Ino);
        for pattern_type in PatternType::ALL {
            assert!(!table.accepts(AgentId::Ino, pattern_type));
        }
        assert!(table.accepted_types(AgentId::Ino).is_empty());
        assert!(!CapabilityTable::empty().accepts(AgentId::Tan, PatternType::StructurePattern));
    }
}
