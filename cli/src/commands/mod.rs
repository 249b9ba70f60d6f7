// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the AEGIS learning CLI

pub mod data;
pub mod select;
pub mod shared;

/// `0.8123` -> `81.2%`
pub(crate) fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}
