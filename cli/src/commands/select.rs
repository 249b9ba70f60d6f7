// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Strategy selection preview

use anyhow::Result;
use colored::Colorize;

use aegis_learning::domain::agent::AgentId;
use aegis_learning::domain::investigation::InvestigationContext;
use aegis_learning::LearningSystem;

use super::percent;

pub async fn select(
    system: &LearningSystem,
    agent: AgentId,
    investigation_type: String,
    framework: Option<String>,
    language: Option<String>,
    scope: Vec<String>,
) -> Result<()> {
    let mut context = InvestigationContext::new(investigation_type).with_scope(scope);
    if let Some(framework) = framework {
        context = context.with_framework(framework);
    }
    if let Some(language) = language {
        context = context.with_language(language);
    }

    let selection = system.selector.select_strategy(agent, &context).await;
    let strategy = &selection.strategy;

    let origin = if selection.is_default() {
        "default".yellow()
    } else {
        "learned".green()
    };

    println!(
        "{} {} ({})",
        "Selected strategy:".bold(),
        strategy.strategy_name.cyan(),
        origin
    );
    println!("  ID:           {}", strategy.strategy_id);
    println!("  Score:        {}", percent(selection.score));
    println!("  Confidence:   {}", percent(strategy.confidence));
    println!("  Success rate: {}", percent(strategy.success_rate));
    println!("  Uses:         {}", strategy.usage_count);
    println!("  {}", selection.justification.dimmed());

    Ok(())
}
