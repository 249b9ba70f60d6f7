// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AEGIS Learning
//!
//! Per-agent learning store, performance tracking, strategy selection and
//! cross-agent knowledge sharing.
//!
//! # Architecture
//!
//! - **Layer:** Learning & Memory Layer
//! - **Purpose:** Durable per-agent patterns and strategies, confidence
//!   scoring, and threshold-gated propagation between agents

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::*;
pub use domain::*;
pub use infrastructure::*;
