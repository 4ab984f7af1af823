// ABOUTME: Command-line entry point that answers one coaching message and prints the plan as JSON
// ABOUTME: Wires configuration, logging, the model client, tools and the chat service together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Nutribot CLI
//!
//! ```text
//! nutribot "How much protein is in chicken breast?" --goal "build muscle" --offline
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nutribot::{
    config::ServerConfig,
    external::{MockUsdaClient, NutrientSource, UsdaClient},
    llm::{ModelClient, OpenAiCompatibleProvider},
    logging::{self, AppLogger},
    memory::InMemoryMemoryStore,
    models::UserProfile,
    services::{ChatRequest, ChatService, CoachEngine, InMemoryConversationStore},
    tools::{ToolBackends, ToolRegistry},
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "nutribot")]
#[command(about = "Nutribot - structured nutrition coaching from a single message")]
struct Args {
    /// Message to the coach
    message: String,

    /// User identifier
    #[arg(long, default_value = "cli-user")]
    user_id: String,

    /// Goal, most important first (repeatable)
    #[arg(long = "goal")]
    goals: Vec<String>,

    /// Dietary preference (repeatable)
    #[arg(long = "preference")]
    preferences: Vec<String>,

    /// Allergy (repeatable)
    #[arg(long = "allergy")]
    allergies: Vec<String>,

    /// Current medication (repeatable)
    #[arg(long = "medication")]
    medications: Vec<String>,

    /// Free-form notes
    #[arg(long)]
    notes: Option<String>,

    /// Use built-in sample nutrient data instead of the USDA API
    #[arg(long)]
    offline: bool,

    /// Override the maximum number of tool rounds
    #[arg(long)]
    max_rounds: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env().context("Invalid configuration")?;
    if let Some(max_rounds) = args.max_rounds {
        config.orchestration.max_tool_rounds = max_rounds;
        config.validate().context("Invalid --max-rounds")?;
    }
    info!("{}", config.summary());

    let nutrients: Arc<dyn NutrientSource> = match config.usda.client_config() {
        Some(usda_config) if !args.offline => Arc::new(UsdaClient::new(usda_config)?),
        _ => {
            info!("Using offline sample nutrient data");
            Arc::new(MockUsdaClient::new())
        }
    };

    let mut registry = ToolRegistry::new().with_timeout(config.orchestration.tool_timeout());
    registry.register_builtin_tools(&ToolBackends::new(
        nutrients,
        Arc::new(InMemoryMemoryStore::new()),
    ));
    let mut audit = registry.subscribe();
    let audit_task = tokio::spawn(async move {
        loop {
            match audit.recv().await {
                Ok(event) => AppLogger::log_tool_audit(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Tool audit log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let provider = Arc::new(OpenAiCompatibleProvider::new(config.llm.provider_config())?);
    let limiter = Arc::new(config.rate_limit.build_limiter()?);
    let model = ModelClient::new(provider, limiter)
        .with_retry(config.retry.policy())
        .with_generation(config.llm.generation())
        .with_model(config.llm.model.clone())
        .with_timeout(config.llm.timeout());

    let engine = Arc::new(CoachEngine::new(
        Arc::new(model),
        Arc::new(registry),
        config.orchestration,
    ));
    let service = ChatService::new(engine, Arc::new(InMemoryConversationStore::new()));

    let response = service
        .handle_chat(ChatRequest {
            user_id: args.user_id,
            conversation_id: None,
            message: args.message,
            profile: UserProfile {
                goals: args.goals,
                dietary_preferences: args.preferences,
                allergies: args.allergies,
                medications: args.medications,
                notes: args.notes,
            },
        })
        .await?;

    // Dropping the service closes the audit channel once all events are delivered
    drop(service);
    if audit_task.await.is_err() {
        warn!("Tool audit task ended abnormally");
    }

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
