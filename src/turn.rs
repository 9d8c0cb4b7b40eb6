//! Turn and memory-context types shared by all memory stores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a turn, monotonic and unique within a session
pub type TurnId = u64;

/// Role of a turn's speaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a session, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Turn ID, assigned by the session in arrival order
    pub id: TurnId,

    /// Role of the speaker
    pub role: Role,

    /// Message text
    pub text: String,

    /// Timestamp when the turn was created
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new turn
    pub fn new(id: TurnId, role: Role, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn
    pub fn user(id: TurnId, text: impl Into<String>) -> Self {
        Self::new(id, Role::User, text)
    }

    /// Create an assistant turn
    pub fn assistant(id: TurnId, text: impl Into<String>) -> Self {
        Self::new(id, Role::Assistant, text)
    }

    /// Whether this turn was spoken by the user
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// A profile attribute derived from the user's own statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFact {
    /// Canonical attribute name, e.g. "dietary_preference"
    pub key: String,

    /// Attribute value
    pub value: String,

    /// User turn the fact was extracted from
    pub evidence_turn_id: TurnId,

    /// Whether the extractor attributed the fact to a specific user statement
    pub grounded: bool,

    /// When the fact was last written
    pub last_updated: DateTime<Utc>,
}

/// The assembled, read-only view handed to the prompt layer.
///
/// Produced fresh per query and never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryContext {
    /// Recent turns from the sliding window, in chronological order
    pub recent_turns: Vec<Turn>,

    /// Turns returned by similarity search, ordered by similarity descending
    pub retrieved_turns: Vec<Turn>,

    /// Profile facts in key-insertion order
    pub profile_facts: Vec<ProfileFact>,
}

impl MemoryContext {
    /// Create an empty context
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if the context carries no memory at all
    pub fn is_empty(&self) -> bool {
        self.recent_turns.is_empty()
            && self.retrieved_turns.is_empty()
            && self.profile_facts.is_empty()
    }
}
