//! Multi-turn scenario runner for comparing memory modes

use std::sync::Arc;

use futures::future::join_all;
use tracing::info;

use crate::config::{MemoryConfig, MemoryMode};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::extract::FactExtractor;
use crate::llm::{ChatRequest, LlmClient};
use crate::prompt::{PromptBuilder, TokenCounter};
use crate::session::Session;
use crate::turn::MemoryContext;

/// A scripted sequence of user queries
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub queries: Vec<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, queries: Vec<String>) -> Self {
        Self {
            name: name.into(),
            queries,
        }
    }

    /// Short demo conversation about answer style
    pub fn demo() -> Self {
        Self::new(
            "demo",
            vec![
                "Hi, I like concise answers.".to_string(),
                "Remind me what I said about answer style.".to_string(),
                "Give me a short summary of our chat.".to_string(),
            ],
        )
    }

    /// A preference stated early, recalled after several unrelated turns
    pub fn long_preference() -> Self {
        Self::new(
            "long_preference",
            vec![
                "Just so you know, I am vegetarian.".to_string(),
                "What's the weather usually like in Lisbon?".to_string(),
                "Can you recommend a good morning running route?".to_string(),
                "How do I politely decline a meeting invite?".to_string(),
                "What should I eat tonight?".to_string(),
            ],
        )
    }

    /// A preference that falls out of a small context window
    pub fn short_preference() -> Self {
        Self::new(
            "short_preference",
            vec![
                "Just so you know, I am vegetarian.".to_string(),
                "Tell me something about the Eiffel Tower.".to_string(),
                "What should I eat tonight?".to_string(),
            ],
        )
    }
}

/// One completed exchange, with the memory context the model saw
#[derive(Debug, Clone)]
pub struct Exchange {
    pub query: String,
    pub response: String,
    pub context: MemoryContext,
    pub prompt_tokens: u32,
}

/// A scenario played to completion under one memory mode
#[derive(Debug, Clone)]
pub struct ModeRun {
    pub mode: MemoryMode,
    pub scenario: String,
    pub exchanges: Vec<Exchange>,
}

impl ModeRun {
    /// The memory context assembled for the scenario's final query
    pub fn final_context(&self) -> Option<&MemoryContext> {
        self.exchanges.last().map(|e| &e.context)
    }
}

/// Drives scenarios through sessions, one session per memory mode.
///
/// The embedder and extractor are shared immutably across sessions; each
/// session owns its memory store, so independent mode runs execute
/// concurrently without any cross-session locking.
pub struct ExperimentRunner {
    embedder: Arc<dyn Embedder>,
    extractor: Arc<dyn FactExtractor>,
    builder: PromptBuilder,
    tokens: Option<TokenCounter>,
}

impl ExperimentRunner {
    pub fn new(embedder: Arc<dyn Embedder>, extractor: Arc<dyn FactExtractor>) -> Self {
        Self {
            embedder,
            extractor,
            builder: PromptBuilder::new(),
            tokens: TokenCounter::for_gpt().ok(),
        }
    }

    fn prompt_tokens(&self, messages: &[crate::llm::ChatMessage]) -> u32 {
        match &self.tokens {
            Some(counter) => counter.count_messages(messages),
            None => messages.iter().map(|m| TokenCounter::estimate(&m.content)).sum(),
        }
    }

    /// Play a scenario under one memory configuration
    pub async fn run_mode(
        &self,
        scenario: &Scenario,
        config: &MemoryConfig,
        llm: &dyn LlmClient,
    ) -> Result<ModeRun> {
        let mut session = Session::new(config, self.embedder.clone(), self.extractor.clone())?;
        let mut exchanges = Vec::with_capacity(scenario.queries.len());

        for (index, query) in scenario.queries.iter().enumerate() {
            let context = session.assemble(query).await?;
            let messages = self.builder.build(&context, query);
            let prompt_tokens = self.prompt_tokens(&messages);
            let response = llm.generate(ChatRequest::new(messages)).await?;
            session.record_exchange(query, &response.content).await?;

            info!(
                scenario = %scenario.name,
                mode = %config.mode,
                turn = index + 1,
                prompt_tokens,
                user = %query,
                assistant = %response.content,
                "Turn complete"
            );

            exchanges.push(Exchange {
                query: query.clone(),
                response: response.content,
                context,
                prompt_tokens,
            });
        }

        Ok(ModeRun {
            mode: config.mode,
            scenario: scenario.name.clone(),
            exchanges,
        })
    }

    /// Play a scenario under several configurations, one concurrent session
    /// each
    pub async fn run_modes(
        &self,
        scenario: &Scenario,
        configs: &[MemoryConfig],
        llm: Arc<dyn LlmClient>,
    ) -> Vec<Result<ModeRun>> {
        let runs = configs
            .iter()
            .map(|config| self.run_mode(scenario, config, llm.as_ref()));
        join_all(runs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::extract::RuleBasedExtractor;
    use crate::llm::ChatResponse;
    use async_trait::async_trait;

    struct CannedLlm;

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn generate(&self, _request: ChatRequest) -> Result<ChatResponse> {
            Ok(ChatResponse {
                content: "Understood.".to_string(),
                model: "canned".to_string(),
                finish_reason: None,
            })
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn runner() -> ExperimentRunner {
        ExperimentRunner::new(
            Arc::new(HashEmbedder::default()),
            Arc::new(RuleBasedExtractor::new()),
        )
    }

    #[tokio::test]
    async fn run_mode_plays_every_query() {
        let run = runner()
            .run_mode(
                &Scenario::demo(),
                &MemoryConfig::for_mode(MemoryMode::Context),
                &CannedLlm,
            )
            .await
            .unwrap();

        assert_eq!(run.exchanges.len(), 3);
        assert_eq!(run.mode, MemoryMode::Context);
        assert!(run.final_context().is_some());
    }

    #[tokio::test]
    async fn run_modes_runs_all_conditions() {
        let configs: Vec<MemoryConfig> = [
            MemoryMode::NoMemory,
            MemoryMode::Context,
            MemoryMode::Retrieval,
            MemoryMode::Hierarchical,
        ]
        .into_iter()
        .map(MemoryConfig::for_mode)
        .collect();

        let results = runner()
            .run_modes(&Scenario::demo(), &configs, Arc::new(CannedLlm))
            .await;

        assert_eq!(results.len(), 4);
        for (result, config) in results.iter().zip(&configs) {
            assert_eq!(result.as_ref().unwrap().mode, config.mode);
        }
    }

    #[tokio::test]
    async fn first_exchange_context_is_empty_for_every_mode() {
        let run = runner()
            .run_mode(
                &Scenario::demo(),
                &MemoryConfig::for_mode(MemoryMode::Hierarchical),
                &CannedLlm,
            )
            .await
            .unwrap();

        assert!(run.exchanges[0].context.is_empty());
    }
}
