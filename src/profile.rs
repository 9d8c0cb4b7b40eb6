//! Structured user profile built from grounded fact extraction

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::extract::{CandidateFact, FactExtractor};
use crate::turn::{ProfileFact, Turn, TurnId};

/// Key-value store of user attributes, each traceable to a user turn.
///
/// Only grounded candidates ever mutate the profile: an ungrounded candidate
/// never overwrites an existing key and never introduces a new one. A
/// candidate that claims to be grounded but whose evidence does not point at
/// a user turn this store has observed is demoted to ungrounded and dropped.
pub struct ProfileMemory {
    facts: Vec<ProfileFact>,
    seen_user_turns: HashSet<TurnId>,
    extractor: Arc<dyn FactExtractor>,
    extraction_enabled: bool,
}

impl ProfileMemory {
    /// Create an empty profile backed by the given extractor
    pub fn new(extractor: Arc<dyn FactExtractor>) -> Self {
        Self {
            facts: Vec::new(),
            seen_user_turns: HashSet::new(),
            extractor,
            extraction_enabled: true,
        }
    }

    /// Create a profile with extraction switched off; the store observes
    /// turns but never proposes facts
    pub fn disabled(extractor: Arc<dyn FactExtractor>) -> Self {
        Self {
            extraction_enabled: false,
            ..Self::new(extractor)
        }
    }

    /// Run extraction for a user turn and merge the resulting candidates.
    ///
    /// Assistant turns are ignored. An extractor failure leaves the profile
    /// untouched and is logged rather than propagated; losing one turn's
    /// candidates must not end the session.
    pub async fn record(&mut self, turn: &Turn, prior: &[Turn]) -> Result<()> {
        if !turn.is_user() {
            return Ok(());
        }

        self.seen_user_turns.insert(turn.id);

        if !self.extraction_enabled {
            return Ok(());
        }

        let candidates = match self.extractor.extract(turn, prior).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(turn_id = turn.id, error = %e, "Fact extraction failed");
                return Ok(());
            }
        };

        for candidate in candidates {
            self.apply(candidate);
        }

        Ok(())
    }

    /// Merge one candidate, applied in extraction order by the caller
    fn apply(&mut self, candidate: CandidateFact) {
        if !candidate.grounded {
            debug!(key = %candidate.key, "Dropped ungrounded candidate");
            return;
        }

        if !self.seen_user_turns.contains(&candidate.evidence_turn_id) {
            warn!(
                key = %candidate.key,
                evidence_turn_id = candidate.evidence_turn_id,
                "Grounding violation: evidence does not reference an observed user turn"
            );
            return;
        }

        let fact = ProfileFact {
            key: candidate.key,
            value: candidate.value,
            evidence_turn_id: candidate.evidence_turn_id,
            grounded: true,
            last_updated: Utc::now(),
        };

        match self.facts.iter_mut().find(|f| f.key == fact.key) {
            Some(existing) => *existing = fact,
            None => self.facts.push(fact),
        }
    }

    /// Current facts in key-insertion order
    pub fn assemble(&self) -> Vec<ProfileFact> {
        self.facts.clone()
    }

    /// Look up a fact by key
    pub fn get(&self, key: &str) -> Option<&ProfileFact> {
        self.facts.iter().find(|f| f.key == key)
    }

    /// Number of stored facts
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the profile is empty
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}
