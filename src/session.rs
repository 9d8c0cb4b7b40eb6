//! Per-session conversation state and the per-turn control flow

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::config::{MemoryConfig, MemoryMode};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::extract::FactExtractor;
use crate::llm::{ChatRequest, LlmClient};
use crate::memory::MemoryStore;
use crate::prompt::PromptBuilder;
use crate::turn::{MemoryContext, Turn, TurnId};

/// One conversation session.
///
/// Owns its memory store exclusively and mints monotonic turn ids, so all
/// memory state is scoped to this session and discarded with it. Independent
/// sessions share nothing mutable and may run concurrently; within a session
/// the calls form a single ordered stream.
pub struct Session {
    id: Uuid,
    store: MemoryStore,
    next_turn_id: TurnId,
}

impl Session {
    /// Create a session for the configured memory mode.
    ///
    /// Configuration errors surface here, before any turn is processed.
    pub fn new(
        config: &MemoryConfig,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn FactExtractor>,
    ) -> Result<Self> {
        let store = MemoryStore::new(config, embedder, extractor)?;
        Ok(Self {
            id: Uuid::new_v4(),
            store,
            next_turn_id: 1,
        })
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Memory mode this session runs under
    pub fn mode(&self) -> MemoryMode {
        self.store.mode()
    }

    /// The session's memory store, for inspection
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Number of turns minted so far
    pub fn turn_count(&self) -> u64 {
        self.next_turn_id - 1
    }

    fn mint_turn_id(&mut self) -> TurnId {
        let id = self.next_turn_id;
        self.next_turn_id += 1;
        id
    }

    /// Assemble the memory context for a query without recording anything
    pub async fn assemble(&mut self, query: &str) -> Result<MemoryContext> {
        self.store.assemble(query).await
    }

    /// Mint turns for one exchange and feed them to the memory store
    pub async fn record_exchange(
        &mut self,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<(Turn, Turn)> {
        let user = Turn::user(self.mint_turn_id(), user_text);
        let assistant = Turn::assistant(self.mint_turn_id(), assistant_text);

        self.store.update(&user, &assistant).await?;
        Ok((user, assistant))
    }

    /// Run the full per-turn control flow: assemble the memory context,
    /// build the prompt, generate a response, and record the exchange.
    pub async fn converse(
        &mut self,
        query: &str,
        builder: &PromptBuilder,
        llm: &dyn LlmClient,
    ) -> Result<String> {
        let context = self.store.assemble(query).await?;
        let messages = builder.build(&context, query);
        let response = llm.generate(ChatRequest::new(messages)).await?;

        let (user, assistant) = self.record_exchange(query, &response.content).await?;
        info!(
            session_id = %self.id,
            mode = %self.mode(),
            user_turn = user.id,
            assistant_turn = assistant.id,
            "Completed exchange"
        );

        Ok(response.content)
    }
}
