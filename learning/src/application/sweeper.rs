// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tracking Sweeper - Background task reaping orphaned investigation records
//!
//! A runner that abandons an investigation never completes its record. The
//! sweeper periodically drops records older than `stale_after`.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Interval loop around [`PerformanceTracker::sweep_stale`]

use std::sync::Arc;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::tracker::PerformanceTracker;
use crate::domain::config::TrackingConfig;

pub struct TrackingSweeper {
    tracker: Arc<PerformanceTracker>,
    config: TrackingConfig,
    shutdown_token: CancellationToken,
}

impl TrackingSweeper {
    pub fn new(tracker: Arc<PerformanceTracker>, config: TrackingConfig) -> Self {
        Self {
            tracker,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Start the sweeper background task
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        if !self.config.sweep_enabled {
            info!("Tracking sweeper is disabled");
            return;
        }

        info!(
            interval_seconds = self.config.sweep_interval_secs,
            stale_after_seconds = self.config.stale_after_secs,
            "Starting tracking sweeper background task"
        );

        let mut tick = interval(self.config.sweep_interval().max(std::time::Duration::from_millis(1)));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let swept = self.sweep_once();
                    debug!(swept = swept.len(), "Tracking sweeper cycle completed");
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping tracking sweeper");
                    break;
                }
            }
        }

        info!("Tracking sweeper background task stopped");
    }

    /// Run a single sweep cycle
    pub fn sweep_once(&self) -> Vec<String> {
        self.tracker.sweep_stale(self.config.stale_after())
    }
}
