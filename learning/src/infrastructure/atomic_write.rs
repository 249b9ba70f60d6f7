// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Write-temp-then-rename file replacement
//!
//! A document is serialized to a sibling file (`<name><suffix>`), checked
//! for existence, then renamed over the target. Readers therefore see either
//! the previous complete file or the new complete file. Each attempt redoes
//! the whole sequence, including creating the parent directory, so an
//! externally held lock or a directory removed underneath us can clear up
//! between attempts.

use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::domain::config::StorageConfig;
use crate::domain::errors::{LearningError, Result};
use crate::infrastructure::retry::{retry_with_backoff, RetryPolicy, Sleeper, TokioSleeper};

#[derive(Clone)]
pub struct AtomicWriter {
    temp_suffix: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    retries: Arc<AtomicU64>,
}

impl AtomicWriter {
    pub fn new(temp_suffix: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            temp_suffix: temp_suffix.into(),
            retry,
            sleeper: Arc::new(TokioSleeper),
            retries: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.temp_suffix.clone(), RetryPolicy::from_config(&config.retry))
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Attempts beyond the first, across every write so far
    pub fn retry_count(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// `patterns.json` -> `patterns.json.tmp`
    pub fn temp_path(&self, path: &Path) -> PathBuf {
        let mut name: OsString = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(&self.temp_suffix);
        path.with_file_name(name)
    }

    /// Serialize `value` as pretty JSON and atomically replace `path`,
    /// retrying the full sequence per the configured policy.
    pub async fn write_json<T>(&self, path: &Path, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let outcome = retry_with_backoff(&self.retry, self.sleeper.as_ref(), |attempt| {
            if attempt > 1 {
                self.retries.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("aegis_learning_save_retries_total").increment(1);
            }
            self.write_once(path, value)
        })
        .await;

        outcome.map_err(|exhausted| LearningError::Persistence {
            path: path.to_path_buf(),
            attempts: exhausted.attempts,
            reason: exhausted.last_error.to_string(),
        })
    }

    async fn write_once<T>(&self, path: &Path, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(value)?;
        let temp = self.temp_path(path);

        if let Err(e) = tokio::fs::write(&temp, &bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        // The rename is only safe once the temporary file is really there
        if tokio::fs::metadata(&temp).await.is_err() {
            return Err(LearningError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("temporary file {} missing after write", temp.display()),
            )));
        }

        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!(path = %path.display(), bytes = bytes.len(), "Atomically replaced file");
        Ok(())
    }
}
