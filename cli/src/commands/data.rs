// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Learning data maintenance commands
//!
//! Commands: show, export, import, clear

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use aegis_learning::domain::agent::AgentId;
use aegis_learning::LearningSystem;

use super::percent;

pub async fn show(system: &LearningSystem, agent: AgentId, json: bool) -> Result<()> {
    if json {
        let data = system.store.load(agent).await;
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    let stats = system.store.stats(agent).await;

    println!("{}", format!("Learning data for {}", agent).bold());
    println!();
    println!("  Patterns:        {}", stats.patterns);
    println!("  Strategies:      {}", stats.strategies);
    println!("  Error patterns:  {}", stats.errors);
    println!();
    println!("{}", "Investigations:".bold());
    println!("  Total:      {}", stats.total_investigations);
    println!("  Successful: {}", stats.successful_investigations.to_string().green());
    println!("  Failed:     {}", stats.failed_investigations.to_string().red());
    println!();
    println!(
        "  Average strategy confidence: {}",
        percent(stats.average_strategy_confidence)
    );
    println!(
        "  Top strategy: {}",
        stats.top_strategy.as_deref().unwrap_or("(none)")
    );
    println!("  Last updated: {}", stats.last_updated.to_rfc3339());

    Ok(())
}

pub async fn export(system: &LearningSystem, file: &Path, agent: Option<AgentId>) -> Result<()> {
    let agents = system
        .store
        .export(file, agent)
        .await
        .with_context(|| format!("Failed to export learning data to {:?}", file))?;

    if agents.is_empty() {
        println!("{}", "No learning data to export".yellow());
    }
    let names: Vec<_> = agents.iter().map(AgentId::as_str).collect();
    println!(
        "{} Exported {} agent(s) to {} {}",
        "✓".green(),
        agents.len(),
        file.display(),
        format!("[{}]", names.join(", ")).dimmed()
    );
    Ok(())
}

pub async fn import(system: &LearningSystem, file: &Path) -> Result<()> {
    let agents = system
        .store
        .import(file)
        .await
        .with_context(|| format!("Failed to import learning data from {:?}", file))?;

    let names: Vec<_> = agents.iter().map(AgentId::as_str).collect();
    println!(
        "{} Imported {} agent(s) {}",
        "✓".green(),
        agents.len(),
        format!("[{}]", names.join(", ")).dimmed()
    );
    Ok(())
}

pub async fn clear(system: &LearningSystem, agent: AgentId, confirm: &str) -> Result<()> {
    system
        .store
        .clear(agent, confirm)
        .await
        .with_context(|| format!("Failed to clear learning data for {}", agent))?;

    println!("{} Cleared learning data for {}", "✓".green(), agent);
    Ok(())
}
