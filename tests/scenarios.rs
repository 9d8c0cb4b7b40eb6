//! End-to-end scenario tests for the memory modes.
//!
//! These drive full multi-turn sessions through the experiment runner with
//! deterministic test doubles: a topic-keyword embedder (so similarity
//! rankings are exact), the rule-based extractor, and a canned LLM.

use std::sync::Arc;

use async_trait::async_trait;
use dialogue_memory::{
    ChatRequest, ChatResponse, Embedder, ExperimentRunner, LlmClient, MemoryConfig, MemoryMode,
    Result, RuleBasedExtractor, Scenario, Session,
};

/// Embeds text as normalized counts of topic keywords, one dimension per
/// topic plus a constant baseline so no vector is ever zero. Deterministic
/// and transparent: two texts about the same topic are near-identical,
/// unrelated texts are near-orthogonal.
struct TopicEmbedder;

const TOPICS: &[&[&str]] = &[
    &["vegetarian", "vegan", "eat", "food", "dinner", "cook", "meal"],
    &["weather", "lisbon", "rain", "sunny"],
    &["running", "route", "morning", "exercise"],
    &["meeting", "decline", "politely", "invite"],
    &["eiffel", "tower", "paris"],
];

#[async_trait]
impl Embedder for TopicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut vector = vec![0.0f32; TOPICS.len() + 1];
        for (dim, words) in TOPICS.iter().enumerate() {
            vector[dim] = tokens.iter().filter(|t| words.contains(t)).count() as f32;
        }
        vector[TOPICS.len()] = 0.1;
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        TOPICS.len() + 1
    }
}

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
    ExperimentRunner::new(Arc::new(TopicEmbedder), Arc::new(RuleBasedExtractor::new()))
}

fn config(mode: MemoryMode) -> MemoryConfig {
    MemoryConfig::for_mode(mode)
        .with_window_size(8)
        .with_retrieval_k(3)
}

#[tokio::test]
async fn long_preference_hierarchical_recalls_the_diet() {
    let run = runner()
        .run_mode(
            &Scenario::long_preference(),
            &config(MemoryMode::Hierarchical),
            &CannedLlm,
        )
        .await
        .unwrap();

    let final_context = run.final_context().unwrap();

    // The vegetarian statement from turn 1 comes back via retrieval...
    assert!(
        final_context.retrieved_turns.iter().any(|t| t.id == 1),
        "expected turn 1 among retrieved turns, got {:?}",
        final_context.retrieved_turns
    );

    // ...and as a grounded profile fact.
    let fact = final_context
        .profile_facts
        .iter()
        .find(|f| f.key == "dietary_preference")
        .expect("missing dietary_preference fact");
    assert_eq!(fact.value, "vegetarian");
    assert_eq!(fact.evidence_turn_id, 1);
    assert!(fact.grounded);
}

#[tokio::test]
async fn long_preference_no_memory_recalls_nothing() {
    let run = runner()
        .run_mode(
            &Scenario::long_preference(),
            &config(MemoryMode::NoMemory),
            &CannedLlm,
        )
        .await
        .unwrap();

    let final_context = run.final_context().unwrap();
    assert!(final_context.is_empty());
}

#[tokio::test]
async fn short_preference_small_window_forgets_but_retrieval_does_not() {
    let scenario = Scenario::short_preference();
    let runner = runner();

    // Context-only with W = 2: by the third query, turn 1 has been evicted.
    let context_run = runner
        .run_mode(
            &scenario,
            &config(MemoryMode::Context).with_window_size(2),
            &CannedLlm,
        )
        .await
        .unwrap();
    let final_context = context_run.final_context().unwrap();
    assert!(final_context.recent_turns.iter().all(|t| t.id != 1));

    // Retrieval and hierarchical still surface the statement.
    for mode in [MemoryMode::Retrieval, MemoryMode::Hierarchical] {
        let run = runner
            .run_mode(&scenario, &config(mode).with_window_size(2), &CannedLlm)
            .await
            .unwrap();
        let final_context = run.final_context().unwrap();
        assert!(
            final_context.retrieved_turns.iter().any(|t| t.id == 1),
            "mode {} lost the preference",
            mode
        );
    }
}

#[tokio::test]
async fn context_trajectory_is_identical_alongside_other_modes() {
    let extractor = Arc::new(RuleBasedExtractor::new());
    let embedder: Arc<dyn Embedder> = Arc::new(TopicEmbedder);
    let exchanges = [
        ("Just so you know, I am vegetarian.", "Noted!"),
        ("What's the weather usually like in Lisbon?", "Mild."),
        ("What should I eat tonight?", "Try a vegetable curry."),
    ];

    // Context mode running alone.
    let mut alone = Session::new(
        &config(MemoryMode::Context).with_window_size(4),
        embedder.clone(),
        extractor.clone(),
    )
    .unwrap();

    // Context mode running while a hierarchical session processes the same
    // conversation in the same process.
    let mut observed = Session::new(
        &config(MemoryMode::Context).with_window_size(4),
        embedder.clone(),
        extractor.clone(),
    )
    .unwrap();
    let mut hierarchical = Session::new(
        &config(MemoryMode::Hierarchical),
        embedder.clone(),
        extractor.clone(),
    )
    .unwrap();

    for (user, assistant) in exchanges {
        alone.record_exchange(user, assistant).await.unwrap();
        observed.record_exchange(user, assistant).await.unwrap();
        hierarchical.record_exchange(user, assistant).await.unwrap();

        let a = alone.assemble("next query").await.unwrap();
        let b = observed.assemble("next query").await.unwrap();
        assert_eq!(a, b);
    }

    // Meanwhile the hierarchical session built its own state, untouched by
    // and invisible to the context-only sessions.
    let router = hierarchical.store().as_hierarchical().unwrap();
    assert_eq!(
        router.profile().get("dietary_preference").unwrap().value,
        "vegetarian"
    );
}

#[tokio::test]
async fn retrieved_turns_are_sorted_by_similarity() {
    let mut session = Session::new(
        &config(MemoryMode::Retrieval).with_retrieval_k(10),
        Arc::new(TopicEmbedder),
        Arc::new(RuleBasedExtractor::new()),
    )
    .unwrap();

    session
        .record_exchange("Just so you know, I am vegetarian.", "Understood.")
        .await
        .unwrap();
    session
        .record_exchange("What's the weather usually like in Lisbon?", "Mild.")
        .await
        .unwrap();

    let context = session.assemble("What should I eat for dinner?").await.unwrap();
    let embedder = TopicEmbedder;
    let query = embedder.embed("What should I eat for dinner?").await.unwrap();

    let mut previous = f32::INFINITY;
    for turn in &context.retrieved_turns {
        let score = dialogue_memory::cosine_similarity(
            &query,
            &embedder.embed(&turn.text).await.unwrap(),
        );
        assert!(score <= previous);
        previous = score;
    }
    assert_eq!(context.retrieved_turns[0].id, 1);
}

#[tokio::test]
async fn assembled_context_is_a_snapshot() {
    let mut session = Session::new(
        &config(MemoryMode::Hierarchical),
        Arc::new(TopicEmbedder),
        Arc::new(RuleBasedExtractor::new()),
    )
    .unwrap();

    session
        .record_exchange("Just so you know, I am vegetarian.", "Noted!")
        .await
        .unwrap();

    let before = session.assemble("What should I eat tonight?").await.unwrap();
    session
        .record_exchange("What should I eat tonight?", "Try a curry.")
        .await
        .unwrap();

    // The earlier context is unaffected by later updates.
    assert_eq!(before.recent_turns.len(), 2);
    assert_eq!(before.recent_turns.last().map(|t| t.id), Some(2));
}
