// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! Services that drive the learning loop.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Store service, performance tracking, strategy selection,
//!   cross-agent sharing and the background sweeper

pub mod selector;
pub mod sharing;
pub mod store;
pub mod sweeper;
pub mod system;
pub mod tracker;

pub use selector::{
    context_match, default_strategy, is_applicable_to_context, rank_strategies, ContextMatch, RankedStrategy,
    SelectionOrigin, StrategySelection, StrategySelectionEngine,
};
pub use sharing::{
    BroadcastReport, FnSubscriber, KnowledgeSharingBus, PatternBroadcast, PatternSubscriber, ShareReport,
    SharedKnowledge, SubscriptionId,
};
pub use store::{LearningStats, PersistentStore, CLEAR_CONFIRMATION_TOKEN};
pub use sweeper::TrackingSweeper;
pub use system::LearningSystem;
pub use tracker::{InvestigationMetrics, OpenInvestigation, PerformanceTracker, SharedTokenCounter, TokenCounter};
