//! Mode selection and the uniform memory-store surface

use std::sync::Arc;

use crate::config::{MemoryConfig, MemoryMode};
use crate::context::ContextMemory;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::extract::FactExtractor;
use crate::retrieval::RetrievalMemory;
use crate::router::HierarchicalRouter;
use crate::turn::{MemoryContext, Turn};

/// Lifecycle of a store within its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Constructed, no call processed yet
    Initialized,

    /// Has served at least one `assemble` or `update`; stays here until the
    /// session is discarded
    Active,
}

/// The four memory strategies, selected once at construction
enum Strategy {
    NoMemory,
    Context(ContextMemory),
    Retrieval { index: RetrievalMemory, k: usize },
    Hierarchical(HierarchicalRouter),
}

/// A session's memory store.
///
/// The strategy is fixed when the store is built and cannot change for the
/// session's lifetime; there is no mode flag to flip at runtime, which is
/// what makes comparative runs trustworthy. Updates take `&mut self`, so one
/// session's `assemble`/`update` calls form a single ordered stream and every
/// `assemble` observes all earlier updates.
pub struct MemoryStore {
    strategy: Strategy,
    mode: MemoryMode,
    state: StoreState,
}

impl MemoryStore {
    /// Build a store for the configured mode.
    ///
    /// Fails fast on an invalid configuration, before any turn is processed.
    pub fn new(
        config: &MemoryConfig,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn FactExtractor>,
    ) -> Result<Self> {
        config.validate()?;

        let strategy = match config.mode {
            MemoryMode::NoMemory => Strategy::NoMemory,
            MemoryMode::Context => Strategy::Context(ContextMemory::new(config.window_size)),
            MemoryMode::Retrieval => Strategy::Retrieval {
                index: RetrievalMemory::new(embedder),
                k: config.retrieval_k,
            },
            MemoryMode::Hierarchical => Strategy::Hierarchical(HierarchicalRouter::new(
                config.window_size,
                config.retrieval_k,
                embedder,
                extractor,
                config.profile_extraction,
            )),
        };

        Ok(Self {
            strategy,
            mode: config.mode,
            state: StoreState::Initialized,
        })
    }

    /// The mode this store was built for
    pub fn mode(&self) -> MemoryMode {
        self.mode
    }

    /// Lifecycle state of this store
    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Assemble a fresh memory context for a query
    pub async fn assemble(&mut self, query: &str) -> Result<MemoryContext> {
        self.state = StoreState::Active;

        match &self.strategy {
            Strategy::NoMemory => Ok(MemoryContext::empty()),
            Strategy::Context(window) => Ok(MemoryContext {
                recent_turns: window.assemble(),
                ..MemoryContext::empty()
            }),
            Strategy::Retrieval { index, k } => Ok(MemoryContext {
                retrieved_turns: index.search(query, *k).await?,
                ..MemoryContext::empty()
            }),
            Strategy::Hierarchical(router) => router.assemble(query).await,
        }
    }

    /// Record one exchange: the user turn and the assistant response turn
    pub async fn update(&mut self, turn: &Turn, response: &Turn) -> Result<()> {
        self.state = StoreState::Active;

        match &mut self.strategy {
            Strategy::NoMemory => Ok(()),
            Strategy::Context(window) => {
                window.record(turn.clone());
                window.record(response.clone());
                Ok(())
            }
            Strategy::Retrieval { index, .. } => {
                index.record(turn.clone()).await?;
                index.record(response.clone()).await?;
                Ok(())
            }
            Strategy::Hierarchical(router) => router.update(turn, response).await,
        }
    }

    /// The hierarchical router, when this store runs in hierarchical mode
    pub fn as_hierarchical(&self) -> Option<&HierarchicalRouter> {
        match &self.strategy {
            Strategy::Hierarchical(router) => Some(router),
            _ => None,
        }
    }
}
