//! Grounded fact extraction from user turns

use async_trait::async_trait;

use crate::error::Result;
use crate::turn::{Turn, TurnId};

/// A fact proposed by an extractor, prior to the profile merge policy
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFact {
    /// Canonical attribute name
    pub key: String,

    /// Attribute value
    pub value: String,

    /// User turn the fact is attributed to
    pub evidence_turn_id: TurnId,

    /// True when the extractor traces the fact to a specific user statement
    /// rather than inferring it without textual support
    pub grounded: bool,
}

impl CandidateFact {
    /// A fact attributed to a specific user turn
    pub fn grounded(
        key: impl Into<String>,
        value: impl Into<String>,
        evidence_turn_id: TurnId,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            evidence_turn_id,
            grounded: true,
        }
    }

    /// A fact inferred without textual support
    pub fn inferred(
        key: impl Into<String>,
        value: impl Into<String>,
        evidence_turn_id: TurnId,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            evidence_turn_id,
            grounded: false,
        }
    }
}

/// Capability for proposing profile facts from a user turn.
///
/// `prior` is the conversation visible to the caller at extraction time;
/// implementations may use it for cross-turn attribution. Returning an empty
/// sequence is the common case.
#[async_trait]
pub trait FactExtractor: Send + Sync {
    async fn extract(&self, turn: &Turn, prior: &[Turn]) -> Result<Vec<CandidateFact>>;
}

/// Dietary identities recognized by the rule-based extractor
const DIET_WORDS: &[&str] = &[
    "vegetarian",
    "vegan",
    "pescatarian",
    "halal",
    "kosher",
    "gluten-free",
];

/// Answer-style keywords, mapped to canonical values. "informal" is listed
/// before "formal" because the match is substring-based.
const STYLE_WORDS: &[(&str, &str)] = &[
    ("informal", "casual"),
    ("formal", "formal"),
    ("casual", "casual"),
    ("concise", "concise"),
    ("brief", "concise"),
    ("detailed", "detailed"),
    ("thorough", "detailed"),
];

/// Pattern-table extractor over first-person statements.
///
/// Covers dietary identity, self-introduction, answer style, and stated
/// preference signals. Everything matched against the turn's own text is
/// grounded on that turn; the single inference rule (terse messages suggest
/// a concise style) is proposed ungrounded.
#[derive(Debug, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_diet(lowered: &str, turn_id: TurnId) -> Option<CandidateFact> {
        for word in DIET_WORDS {
            let statements = [
                format!("i am {}", word),
                format!("i'm {}", word),
                format!("i eat {}", word),
                format!("i only eat {}", word),
            ];
            if statements.iter().any(|s| lowered.contains(s.as_str())) {
                return Some(CandidateFact::grounded("dietary_preference", *word, turn_id));
            }
        }
        None
    }

    fn extract_name(text: &str, lowered: &str, turn_id: TurnId) -> Option<CandidateFact> {
        let pos = lowered.find("my name is ")?;
        let rest = text.get(pos + "my name is ".len()..)?;
        let name: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '\'')
            .collect();
        if name.is_empty() {
            return None;
        }
        Some(CandidateFact::grounded("name", name, turn_id))
    }

    fn extract_style(lowered: &str, turn_id: TurnId) -> Option<CandidateFact> {
        for (word, value) in STYLE_WORDS {
            if lowered.contains(word) {
                return Some(CandidateFact::grounded("answer_style", *value, turn_id));
            }
        }
        None
    }

    fn extract_preference(lowered: &str, turn_id: TurnId) -> Option<CandidateFact> {
        let value = if lowered.contains("i don't like")
            || lowered.contains("i do not like")
            || lowered.contains("i dislike")
        {
            "avoid what the user dislikes"
        } else if lowered.contains("i like") {
            "follow what the user likes"
        } else if lowered.contains("i prefer") || lowered.contains("my preference is") {
            "follow the user's stated preference"
        } else {
            return None;
        };
        Some(CandidateFact::grounded("stated_preference", value, turn_id))
    }
}

#[async_trait]
impl FactExtractor for RuleBasedExtractor {
    async fn extract(&self, turn: &Turn, _prior: &[Turn]) -> Result<Vec<CandidateFact>> {
        let lowered = turn.text.to_lowercase();
        let mut candidates = Vec::new();

        candidates.extend(Self::extract_diet(&lowered, turn.id));
        candidates.extend(Self::extract_name(&turn.text, &lowered, turn.id));
        candidates.extend(Self::extract_style(&lowered, turn.id));
        candidates.extend(Self::extract_preference(&lowered, turn.id));

        // Terse messages weakly suggest a concise style, but that is an
        // inference, not something the user said.
        if candidates.is_empty() && !turn.text.is_empty() && turn.text.len() < 20 {
            candidates.push(CandidateFact::inferred("answer_style", "concise", turn.id));
        }

        Ok(candidates)
    }
}
