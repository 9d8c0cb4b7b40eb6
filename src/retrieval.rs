//! Append-only embedding index with exact top-k similarity search

use std::sync::Arc;

use tracing::debug;

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::{Error, Result};
use crate::turn::Turn;

/// One stored turn with its embedding
#[derive(Debug, Clone)]
struct IndexEntry {
    turn: Turn,
    embedding: Vec<f32>,
}

/// Embedding store over a session's turns.
///
/// The index grows monotonically (no eviction) and preserves insertion
/// order, which breaks similarity ties in favor of the more recently stored
/// turn. Search is exact brute force over all stored entries: session
/// corpora are small and reproducible recall matters more than scale here.
pub struct RetrievalMemory {
    entries: Vec<IndexEntry>,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalMemory {
    /// Create an empty index backed by the given embedder
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            entries: Vec::new(),
            embedder,
        }
    }

    /// Embed a turn's text and insert it into the index.
    ///
    /// The index is only mutated after the embedder call succeeds and the
    /// vector dimension checks out, so a failed update leaves all previously
    /// committed entries intact.
    pub async fn record(&mut self, turn: Turn) -> Result<()> {
        if self.entries.iter().any(|e| e.turn.id == turn.id) {
            return Err(Error::invalid_input(format!(
                "Turn {} is already indexed",
                turn.id
            )));
        }

        let embedding = self.embedder.embed(&turn.text).await?;
        if embedding.len() != self.embedder.dimensions() {
            return Err(Error::embedding(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.embedder.dimensions(),
                embedding.len()
            )));
        }

        debug!(turn_id = turn.id, "Indexed turn for retrieval");
        self.entries.push(IndexEntry { turn, embedding });
        Ok(())
    }

    /// Return the `k` stored turns most similar to the query.
    ///
    /// Results are ordered by cosine similarity descending; equal scores are
    /// ordered by recency descending. Asking for more turns than are stored
    /// returns them all, and `k = 0` returns nothing.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Turn>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (cosine_similarity(&query_embedding, &entry.embedding), idx))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.1.cmp(&a.1))
        });
        scored.truncate(k);

        debug!(
            results = scored.len(),
            top_score = scored.first().map(|(s, _)| *s),
            "Similarity search complete"
        );

        Ok(scored
            .into_iter()
            .map(|(_, idx)| self.entries[idx].turn.clone())
            .collect())
    }

    /// Number of indexed turns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use async_trait::async_trait;

    fn index() -> RetrievalMemory {
        RetrievalMemory::new(Arc::new(HashEmbedder::default()))
    }

    #[tokio::test]
    async fn identical_text_ranks_first() {
        let mut memory = index();
        memory.record(Turn::user(1, "I am vegetarian")).await.unwrap();
        memory
            .record(Turn::assistant(2, "Noted, thanks for telling me"))
            .await
            .unwrap();
        memory
            .record(Turn::user(3, "The weather is nice today"))
            .await
            .unwrap();

        let results = memory.search("I am vegetarian", 2).await.unwrap();
        assert_eq!(results[0].id, 1);
    }

    #[tokio::test]
    async fn k_larger_than_index_returns_all_without_padding() {
        let mut memory = index();
        memory.record(Turn::user(1, "alpha")).await.unwrap();
        memory.record(Turn::user(2, "beta")).await.unwrap();

        let results = memory.search("alpha", 10).await.unwrap();
        assert_eq!(results.len(), 2);

        let mut ids: Vec<u64> = results.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn zero_k_returns_nothing() {
        let mut memory = index();
        memory.record(Turn::user(1, "alpha")).await.unwrap();
        assert!(memory.search("alpha", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn equal_scores_prefer_more_recent_turn() {
        let mut memory = index();
        // Identical text gives identical embeddings, so the scores tie.
        memory.record(Turn::user(1, "same text")).await.unwrap();
        memory.record(Turn::user(2, "same text")).await.unwrap();
        memory.record(Turn::user(3, "same text")).await.unwrap();

        let results = memory.search("same text", 3).await.unwrap();
        let ids: Vec<u64> = results.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn duplicate_turn_id_is_rejected() {
        let mut memory = index();
        memory.record(Turn::user(1, "alpha")).await.unwrap();
        let err = memory.record(Turn::user(1, "beta")).await;
        assert!(err.is_err());
        assert_eq!(memory.len(), 1);
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::embedding("embedder offline"))
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    #[tokio::test]
    async fn failed_embedding_leaves_index_untouched() {
        let mut memory = RetrievalMemory::new(Arc::new(FailingEmbedder));
        assert!(memory.record(Turn::user(1, "alpha")).await.is_err());
        assert!(memory.is_empty());
    }
}
