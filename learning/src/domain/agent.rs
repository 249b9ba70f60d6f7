// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent identities
//!
//! The learning subsystem knows a fixed roster of agents. Each one owns an
//! isolated storage namespace named after its short code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::LearningError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentId {
    /// Structure and framework analysis
    Tan,
    /// Documentation
    Zen,
    /// Context and research
    Ino,
    /// Audit and validation
    Juno,
    /// Implementation
    Aj,
}

impl AgentId {
    pub const COUNT: usize = 5;

    pub const ALL: [AgentId; Self::COUNT] = [
        AgentId::Tan,
        AgentId::Zen,
        AgentId::Ino,
        AgentId::Juno,
        AgentId::Aj,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Tan => "TAN",
            AgentId::Zen => "ZEN",
            AgentId::Ino => "INO",
            AgentId::Juno => "JUNO",
            AgentId::Aj => "AJ",
        }
    }

    /// Every agent except `self`
    pub fn others(self) -> impl Iterator<Item = AgentId> {
        Self::ALL.into_iter().filter(move |agent| *agent != self)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = LearningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|agent| agent.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LearningError::UnknownAgent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("juno".parse::<AgentId>().unwrap(), AgentId::Juno);
        assert_eq!(" TAN ".parse::<AgentId>().unwrap(), AgentId::Tan);
        assert!(matches!(
            "APO".parse::<AgentId>(),
            Err(LearningError::UnknownAgent(_))
        ));
    }

    #[test]
    fn test_serializes_as_short_code() {
        let json = serde_json::to_string(&AgentId::Aj).unwrap();
        assert_eq!(json, "\"AJ\"");
        let back: AgentId = serde_json::from_str("\"ZEN\"").unwrap();
        assert_eq!(back, AgentId::Zen);
    }

    #[test]
    fn test_others_excludes_self() {
        let others: Vec<_> = AgentId::Ino.others().collect();
        assert_eq!(others.len(), 4);
        assert!(!others.contains(&AgentId::Ino));
    }
}
