//! Memory-mode comparison experiment
//!
//! Plays a scripted scenario through all four memory modes and prints what
//! each mode surfaced at the final query.

use std::sync::Arc;

use async_trait::async_trait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dialogue_memory::{
    ChatRequest, ChatResponse, Embedder, ExperimentRunner, HashEmbedder, LlmClient, LocalEmbedder,
    MemoryConfig, MemoryMode, Result, RuleBasedExtractor, Scenario,
};
use dialogue_memory::llm::{OpenRouterClient, RetryConfig, RetryingClient};

/// Offline stand-in used when no API key is configured
struct OfflineLlm;

#[async_trait]
impl LlmClient for OfflineLlm {
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(ChatResponse {
            content: format!("(offline) Acknowledged: {}", last),
            model: "offline".to_string(),
            finish_reason: None,
        })
    }

    fn model_name(&self) -> &str {
        "offline"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let scenario = match std::env::args().nth(1).as_deref() {
        None | Some("demo") => Scenario::demo(),
        Some("long_preference") => Scenario::long_preference(),
        Some("short_preference") => Scenario::short_preference(),
        Some(other) => anyhow::bail!("Unknown scenario: {}", other),
    };
    tracing::info!(scenario = %scenario.name, "Running memory-mode comparison");

    let online = std::env::var("OPENROUTER_API_KEY").is_ok();
    let (llm, embedder): (Arc<dyn LlmClient>, Arc<dyn Embedder>) = if online {
        let client = RetryingClient::new(OpenRouterClient::from_env()?, RetryConfig::default());
        let config = MemoryConfig::default();
        (Arc::new(client), Arc::new(LocalEmbedder::new(&config)?))
    } else {
        tracing::warn!("OPENROUTER_API_KEY not set, using offline LLM and hash embedder");
        (Arc::new(OfflineLlm), Arc::new(HashEmbedder::default()))
    };

    let runner = ExperimentRunner::new(embedder, Arc::new(RuleBasedExtractor::new()));
    let configs: Vec<MemoryConfig> = [
        MemoryMode::NoMemory,
        MemoryMode::Context,
        MemoryMode::Retrieval,
        MemoryMode::Hierarchical,
    ]
    .into_iter()
    .map(MemoryConfig::for_mode)
    .collect();

    let results = runner.run_modes(&scenario, &configs, llm).await;

    for result in results {
        let run = result?;
        println!("\n=== mode: {} ===", run.mode);
        for (index, exchange) in run.exchanges.iter().enumerate() {
            println!("Turn {}", index + 1);
            println!("User: {}", exchange.query);
            println!("Assistant: {}", exchange.response);
        }

        if let Some(context) = run.final_context() {
            println!(
                "Final query saw: {} recent, {} retrieved, {} profile facts",
                context.recent_turns.len(),
                context.retrieved_turns.len(),
                context.profile_facts.len()
            );
            for fact in &context.profile_facts {
                println!("  profile: {} = {}", fact.key, fact.value);
            }
        }
    }

    Ok(())
}
