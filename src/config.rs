//! Configuration for dialogue-memory

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which memory strategy a session uses.
///
/// Chosen once at session construction and immutable for the session's
/// lifetime, so that comparative runs never leak state between strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryMode {
    /// No memory at all - the control condition
    NoMemory,

    /// Sliding window of recent turns
    Context,

    /// Embedding-based top-k retrieval over all stored turns
    Retrieval,

    /// Context + retrieval + structured profile, merged in fixed order
    Hierarchical,
}

impl FromStr for MemoryMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "no_memory" => Ok(MemoryMode::NoMemory),
            "context" => Ok(MemoryMode::Context),
            "retrieval" => Ok(MemoryMode::Retrieval),
            "hierarchical" => Ok(MemoryMode::Hierarchical),
            other => Err(Error::config(format!("Unknown memory mode: {}", other))),
        }
    }
}

impl std::fmt::Display for MemoryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryMode::NoMemory => write!(f, "no_memory"),
            MemoryMode::Context => write!(f, "context"),
            MemoryMode::Retrieval => write!(f, "retrieval"),
            MemoryMode::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

/// Configuration for one memory session
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Memory strategy for this session
    pub mode: MemoryMode,

    /// Sliding window capacity in turns (context and hierarchical modes)
    pub window_size: usize,

    /// Number of turns returned by similarity search (retrieval and
    /// hierarchical modes)
    pub retrieval_k: usize,

    /// Whether the hierarchical profile store runs fact extraction
    pub profile_extraction: bool,

    /// Embedding model name (for reference, actual model set in embedding.rs)
    pub embedding_model: String,

    /// Embedding dimensions (384 for all-MiniLM-L6-v2)
    pub embedding_dimensions: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            mode: MemoryMode::Hierarchical,
            window_size: 8,
            retrieval_k: 3,
            profile_extraction: true,
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            embedding_dimensions: 384, // MiniLM-L6-v2 outputs 384-dim vectors
        }
    }
}

impl MemoryConfig {
    /// Create a config for a specific mode with default parameters
    pub fn for_mode(mode: MemoryMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set the sliding window capacity
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the retrieval top-k
    pub fn with_retrieval_k(mut self, retrieval_k: usize) -> Self {
        self.retrieval_k = retrieval_k;
        self
    }

    /// Disable profile fact extraction
    pub fn without_profile_extraction(mut self) -> Self {
        self.profile_extraction = false;
        self
    }

    /// Validate the configuration.
    ///
    /// Fails fast at session construction, before any turn is processed.
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            MemoryMode::NoMemory => {}
            MemoryMode::Context => {
                if self.window_size == 0 {
                    return Err(Error::config(
                        "window_size must be >= 1 for context mode",
                    ));
                }
            }
            MemoryMode::Retrieval => {
                if self.retrieval_k == 0 {
                    return Err(Error::config(
                        "retrieval_k must be >= 1 for retrieval mode",
                    ));
                }
            }
            MemoryMode::Hierarchical => {
                if self.window_size == 0 {
                    return Err(Error::config(
                        "window_size must be >= 1 for hierarchical mode",
                    ));
                }
                if self.retrieval_k == 0 {
                    return Err(Error::config(
                        "retrieval_k must be >= 1 for hierarchical mode",
                    ));
                }
            }
        }

        if self.embedding_dimensions == 0 {
            return Err(Error::config("embedding_dimensions must be >= 1"));
        }

        Ok(())
    }
}
