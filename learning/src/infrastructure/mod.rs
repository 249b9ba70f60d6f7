// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! Storage, retry, export and event plumbing behind the domain contracts.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Filesystem and in-memory repositories, the atomic write
//!   routine and its retry combinator, the export codec and the event bus

pub mod atomic_write;
pub mod event_bus;
pub mod export;
pub mod file_repository;
pub mod memory_repository;
pub mod retry;

pub use atomic_write::AtomicWriter;
pub use event_bus::{EventBus, EventBusError, EventReceiver};
pub use export::{AgentSnapshot, ExportDocument};
pub use file_repository::FileLearningRepository;
pub use memory_repository::InMemoryLearningRepository;
pub use retry::{retry_with_backoff, RetryExhausted, RetryPolicy, Sleeper, TokioSleeper};
