// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Filesystem Learning Repository
//!
//! Stores each agent's learning data under `<root>/<AGENT>/` as four JSON
//! documents:
//!
//! - `patterns.json`   - pattern id → pattern
//! - `strategies.json` - strategy id → strategy performance
//! - `errors.json`     - error signature → resolution
//! - `metadata.json`   - per-agent rollup
//!
//! Every file is replaced through [`AtomicWriter`], so a crash mid-save
//! leaves the previous snapshot of that file intact. Files are written
//! independently: a failure on one does not roll back the ones already
//! written in the same save.
//!
//! **Limitations:**
//! - Single process only; no cross-process locking
//! - A corrupt file degrades to an empty collection on load and is
//!   overwritten by the next save

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::agent::AgentId;
use crate::domain::config::StorageConfig;
use crate::domain::errors::Result;
use crate::domain::learning_data::{LearningData, LearningMetadata};
use crate::domain::repository::LearningRepository;
use crate::infrastructure::atomic_write::AtomicWriter;
use crate::infrastructure::retry::{RetryPolicy, Sleeper};

pub const PATTERNS_FILE: &str = "patterns.json";
pub const STRATEGIES_FILE: &str = "strategies.json";
pub const ERRORS_FILE: &str = "errors.json";
pub const METADATA_FILE: &str = "metadata.json";

pub const LEARNING_FILES: [&str; 4] = [PATTERNS_FILE, STRATEGIES_FILE, ERRORS_FILE, METADATA_FILE];

pub struct FileLearningRepository {
    root: PathBuf,
    writer: AtomicWriter,
}

/// Outcome of reading one learning document
enum Document<T> {
    Missing,
    Corrupt,
    Loaded(T),
}

impl FileLearningRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(&StorageConfig {
            root_dir: root.into(),
            ..StorageConfig::default()
        })
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            root: config.root_dir.clone(),
            writer: AtomicWriter::from_config(config),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.writer = self.writer.with_retry_policy(policy);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.writer = self.writer.with_sleeper(sleeper);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn writer(&self) -> &AtomicWriter {
        &self.writer
    }

    pub fn agent_dir(&self, agent: AgentId) -> PathBuf {
        self.root.join(agent.as_str())
    }

    pub fn file_path(&self, agent: AgentId, file: &str) -> PathBuf {
        self.agent_dir(agent).join(file)
    }

    async fn read_document<T: DeserializeOwned>(&self, path: &Path) -> Document<T> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Document::Missing,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read learning file, using empty data");
                return Document::Corrupt;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Document::Loaded(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt learning file, using empty data");
                Document::Corrupt
            }
        }
    }
}

fn collection<T>(document: Document<HashMap<String, T>>, found: &mut bool) -> HashMap<String, T> {
    match document {
        Document::Loaded(map) => {
            *found = true;
            map
        }
        Document::Corrupt => {
            *found = true;
            HashMap::new()
        }
        Document::Missing => HashMap::new(),
    }
}

#[async_trait]
impl LearningRepository for FileLearningRepository {
    async fn load(&self, agent: AgentId) -> Result<Option<LearningData>> {
        let mut found = false;

        let patterns = collection(
            self.read_document(&self.file_path(agent, PATTERNS_FILE)).await,
            &mut found,
        );
        let strategies = collection(
            self.read_document(&self.file_path(agent, STRATEGIES_FILE)).await,
            &mut found,
        );
        let errors = collection(
            self.read_document(&self.file_path(agent, ERRORS_FILE)).await,
            &mut found,
        );
        let metadata = match self
            .read_document::<LearningMetadata>(&self.file_path(agent, METADATA_FILE))
            .await
        {
            Document::Loaded(metadata) => {
                found = true;
                metadata
            }
            Document::Corrupt => {
                found = true;
                LearningMetadata::new(agent)
            }
            Document::Missing => LearningMetadata::new(agent),
        };

        if !found {
            debug!(agent = %agent, "No learning data on disk");
            return Ok(None);
        }

        Ok(Some(LearningData {
            patterns,
            strategies,
            errors,
            metadata,
        }))
    }

    async fn save(&self, agent: AgentId, data: &LearningData) -> Result<()> {
        self.writer
            .write_json(&self.file_path(agent, PATTERNS_FILE), &data.patterns)
            .await?;
        self.writer
            .write_json(&self.file_path(agent, STRATEGIES_FILE), &data.strategies)
            .await?;
        self.writer
            .write_json(&self.file_path(agent, ERRORS_FILE), &data.errors)
            .await?;
        self.writer
            .write_json(&self.file_path(agent, METADATA_FILE), &data.metadata)
            .await?;

        debug!(
            agent = %agent,
            patterns = data.patterns.len(),
            strategies = data.strategies.len(),
            errors = data.errors.len(),
            "Saved learning data"
        );
        Ok(())
    }

    async fn delete(&self, agent: AgentId) -> Result<()> {
        for file in LEARNING_FILES {
            let path = self.file_path(agent, file);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        // Only succeeds when nothing else lives in the agent directory
        let _ = tokio::fs::remove_dir(self.agent_dir(agent)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pattern::{LearnedPattern, PatternCategory, PatternType};
    use crate::domain::strategy::StrategyPerformance;
    use tempfile::TempDir;

    fn sample_data(agent: AgentId) -> LearningData {
        let mut data = LearningData::empty(agent);
        data.upsert_pattern(LearnedPattern::new(
            "layered-architecture",
            PatternCategory::Architecture,
            PatternType::StructurePattern,
            "domain/application/infrastructure split",
            agent,
        ));
        let mut strategy = StrategyPerformance::new("bottom-up", "Bottom-Up Review", agent);
        strategy.record_outcome("inv-1", true, 1000.0, 500.0);
        data.upsert_strategy(strategy);
        data.refresh_metadata();
        data
    }

    #[tokio::test]
    async fn test_load_missing_agent_returns_none() {
        let dir = TempDir::new().unwrap();
        let repo = FileLearningRepository::new(dir.path());
        assert!(repo.load(AgentId::Tan).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let repo = FileLearningRepository::new(dir.path());
        let data = sample_data(AgentId::Tan);

        repo.save(AgentId::Tan, &data).await.unwrap();

        for file in LEARNING_FILES {
            assert!(dir.path().join("TAN").join(file).exists(), "{} missing", file);
        }

        let loaded = repo.load(AgentId::Tan).await.unwrap().unwrap();
        assert_eq!(loaded, data);
    }

    #[tokio::test]
    async fn test_corrupt_file_degrades_to_empty_collection() {
        let dir = TempDir::new().unwrap();
        let repo = FileLearningRepository::new(dir.path());
        let data = sample_data(AgentId::Zen);
        repo.save(AgentId::Zen, &data).await.unwrap();

        std::fs::write(repo.file_path(AgentId::Zen, PATTERNS_FILE), b"{ not json").unwrap();

        let loaded = repo.load(AgentId::Zen).await.unwrap().unwrap();
        assert!(loaded.patterns.is_empty());
        assert_eq!(loaded.strategies, data.strategies);
    }

    #[tokio::test]
    async fn test_delete_removes_all_files() {
        let dir = TempDir::new().unwrap();
        let repo = FileLearningRepository::new(dir.path());
        repo.save(AgentId::Aj, &sample_data(AgentId::Aj)).await.unwrap();

        repo.delete(AgentId::Aj).await.unwrap();

        for file in LEARNING_FILES {
            assert!(!repo.file_path(AgentId::Aj, file).exists());
        }
        assert!(repo.load(AgentId::Aj).await.unwrap().is_none());

        // deleting again is fine
        repo.delete(AgentId::Aj).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let repo = FileLearningRepository::new(dir.path()).with_retry_policy(RetryPolicy::immediate(2));
        let original = sample_data(AgentId::Juno);
        repo.save(AgentId::Juno, &original).await.unwrap();

        let strategies_path = repo.file_path(AgentId::Juno, STRATEGIES_FILE);
        let before = std::fs::read(&strategies_path).unwrap();
        std::fs::create_dir(repo.writer().temp_path(&strategies_path)).unwrap();

        let mut updated = original.clone();
        updated.upsert_strategy(StrategyPerformance::new("top-down", "Top-Down", AgentId::Juno));
        let err = repo.save(AgentId::Juno, &updated).await.unwrap_err();
        assert!(err.is_persistence());

        let after = std::fs::read(&strategies_path).unwrap();
        assert_eq!(after, before);
        let parsed: HashMap<String, StrategyPerformance> = serde_json::from_slice(&after).unwrap();
        assert_eq!(parsed, original.strategies);
    }
}
