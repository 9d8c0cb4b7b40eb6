//! Hierarchical composition of context, retrieval, and profile memory

use std::sync::Arc;

use crate::context::ContextMemory;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::extract::FactExtractor;
use crate::profile::ProfileMemory;
use crate::retrieval::RetrievalMemory;
use crate::turn::{MemoryContext, Turn};

/// Routes one session's turns into all three memory layers and merges their
/// outputs in a fixed order: context, then retrieval, then profile.
///
/// The router owns its sub-stores outright; they are constructed with it and
/// never handed to another mode, so one mode's trajectory cannot leak into
/// another's. The merge order is a router property, not configuration, which
/// keeps assembled contexts reproducible given identical stored state.
pub struct HierarchicalRouter {
    context: ContextMemory,
    retrieval: RetrievalMemory,
    profile: ProfileMemory,
    retrieval_k: usize,
}

impl HierarchicalRouter {
    /// Create a router with private sub-store instances
    pub fn new(
        window_size: usize,
        retrieval_k: usize,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn FactExtractor>,
        profile_extraction: bool,
    ) -> Self {
        let profile = if profile_extraction {
            ProfileMemory::new(extractor)
        } else {
            ProfileMemory::disabled(extractor)
        };

        Self {
            context: ContextMemory::new(window_size),
            retrieval: RetrievalMemory::new(embedder),
            profile,
            retrieval_k,
        }
    }

    /// Forward one exchange to all three sub-stores.
    ///
    /// The profile extractor sees the context window as it stood before this
    /// exchange. Retrieval indexing runs first so an embedding failure
    /// aborts the exchange before any other layer has recorded it.
    pub async fn update(&mut self, turn: &Turn, response: &Turn) -> Result<()> {
        let prior = self.context.assemble();

        self.retrieval.record(turn.clone()).await?;
        self.retrieval.record(response.clone()).await?;

        self.context.record(turn.clone());
        self.context.record(response.clone());

        self.profile.record(turn, &prior).await?;
        self.profile.record(response, &prior).await?;

        Ok(())
    }

    /// Assemble the merged memory context for a query
    pub async fn assemble(&self, query: &str) -> Result<MemoryContext> {
        let recent_turns = self.context.assemble();
        let retrieved_turns = self.retrieval.search(query, self.retrieval_k).await?;
        let profile_facts = self.profile.assemble();

        Ok(MemoryContext {
            recent_turns,
            retrieved_turns,
            profile_facts,
        })
    }

    /// The context sub-store
    pub fn context(&self) -> &ContextMemory {
        &self.context
    }

    /// The retrieval sub-store
    pub fn retrieval(&self) -> &RetrievalMemory {
        &self.retrieval
    }

    /// The profile sub-store
    pub fn profile(&self) -> &ProfileMemory {
        &self.profile
    }

    /// Top-k forwarded to the retrieval sub-store
    pub fn retrieval_k(&self) -> usize {
        self.retrieval_k
    }
}
