//! # Dialogue Memory
//!
//! Conversational memory for multi-turn LLM dialogue agents, built around
//! interchangeable memory strategies so that modes can be compared fairly.
//!
//! ## Memory modes
//!
//! - **NoMemory** - empty context every turn, the control condition
//! - **Context** - sliding window of the most recent turns
//! - **Retrieval** - exact top-k similarity search over all stored turns
//! - **Hierarchical** - context + retrieval + a grounded user profile,
//!   merged in a fixed order
//!
//! The mode is chosen once when a [`Session`] is constructed and cannot be
//! switched afterwards; each session owns its stores outright, so one mode's
//! trajectory never leaks into another's.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dialogue_memory::{MemoryConfig, MemoryMode, Session};
//!
//! let config = MemoryConfig::for_mode(MemoryMode::Hierarchical);
//! let mut session = Session::new(&config, embedder, extractor)?;
//!
//! // Per turn: assemble the memory context, prompt the model, record the
//! // exchange
//! let context = session.assemble(query).await?;
//! let reply = session.converse(query, &builder, &llm).await?;
//! ```

pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod experiment;
pub mod extract;
pub mod llm;
pub mod memory;
pub mod profile;
pub mod prompt;
pub mod retrieval;
pub mod router;
pub mod session;
pub mod turn;

pub use config::{MemoryConfig, MemoryMode};
pub use context::ContextMemory;
pub use embedding::{cosine_similarity, Embedder, HashEmbedder, LocalEmbedder};
pub use error::{Error, Result};
pub use experiment::{ExperimentRunner, ModeRun, Scenario};
pub use extract::{CandidateFact, FactExtractor, RuleBasedExtractor};
pub use llm::{ChatMessage, ChatRequest, ChatResponse, ChatRole, LlmClient};
pub use memory::{MemoryStore, StoreState};
pub use profile::ProfileMemory;
pub use prompt::{PromptBuilder, TokenCounter};
pub use retrieval::RetrievalMemory;
pub use router::HierarchicalRouter;
pub use session::Session;
pub use turn::{MemoryContext, ProfileFact, Role, Turn, TurnId};
