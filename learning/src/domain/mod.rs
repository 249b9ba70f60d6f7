// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Learning types, invariants and contracts.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Patterns, strategies, error resolutions, metadata and the
//!   scoring rules they share

pub mod agent;
pub mod capability;
pub mod confidence;
pub mod config;
pub mod error_resolution;
pub mod errors;
pub mod events;
pub mod investigation;
pub mod learning_data;
pub mod pattern;
pub mod repository;
pub mod strategy;

pub use agent::*;
pub use capability::*;
pub use confidence::*;
pub use config::*;
pub use error_resolution::*;
pub use errors::*;
pub use events::*;
pub use investigation::*;
pub use learning_data::*;
pub use pattern::*;
pub use repository::*;
pub use strategy::*;
