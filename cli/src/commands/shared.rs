// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use colored::Colorize;

use aegis_learning::domain::agent::AgentId;
use aegis_learning::LearningSystem;

use super::percent;

/// List what the other agents hold at or above `min_confidence`.
pub async fn shared(
    system: &LearningSystem,
    agent: AgentId,
    min_confidence: Option<f64>,
    json: bool,
) -> Result<()> {
    let bundles = system.sharing.get_shared_knowledge(agent, min_confidence).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bundles)?);
        return Ok(());
    }

    if bundles.is_empty() {
        println!("{}", "No shared knowledge available".yellow());
        return Ok(());
    }

    for bundle in &bundles {
        println!("{}", format!("From {}", bundle.source_agent).bold());
        for pattern in &bundle.patterns {
            let marker = if system.sharing.validate_pattern(pattern, agent) {
                "✓".green()
            } else {
                "✗".red()
            };
            println!(
                "  {} {} [{}] {}",
                marker,
                pattern.pattern_id,
                pattern.pattern_type,
                percent(pattern.confidence).dimmed()
            );
        }
        for strategy in &bundle.strategies {
            println!(
                "  {} {} {}",
                "→".cyan(),
                strategy.strategy_name,
                percent(strategy.confidence).dimmed()
            );
        }
        println!();
    }

    Ok(())
}
