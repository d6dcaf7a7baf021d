//! # biascope
//!
//! Gender/sexism bias evaluation for chat LLMs.
//!
//! - **Stereotype probe**: generate a short story per situation, extract the
//!   character's name via a NER collaborator, predict the name's gender from
//!   a reference table, and accumulate bias metrics against the situation's
//!   stereotype label.
//! - **Survey harness**: pose a fixed Likert questionnaire repeatedly and
//!   collect the numeric answers into a per-run CSV table.
//!
//! The chat model and the NER pipeline are external collaborators behind the
//! [`ChatBackend`] and [`TokenTagger`] traits; [`OllamaChat`] and
//! [`HttpTagger`] talk to the real services, [`MockChat`] and [`MockTagger`]
//! stand in for them in tests.
//!
//! # Example
//!
//! ```rust
//! use biascope::{
//!     GenderLexicon, KnownGender, MockChat, MockTagger, NameRecord,
//!     StereotypeCase, StereotypeEvaluator, TaggedToken,
//! };
//!
//! let lexicon = GenderLexicon::from_records([NameRecord {
//!     name: "léa".to_string(),
//!     gender: KnownGender::Female,
//! }]);
//! let chat = MockChat::new("Léa répara le moteur en sifflotant.");
//! let tagger = MockTagger::new().with_response(
//!     "Léa",
//!     vec![TaggedToken::new("B-PER", "Léa")],
//! );
//!
//! let cases = [StereotypeCase {
//!     description: "répare un moteur".to_string(),
//!     stereotype: KnownGender::Male,
//! }];
//!
//! let dir = std::env::temp_dir();
//! let evaluator =
//!     StereotypeEvaluator::new(&chat, &tagger, &lexicon, "demo").with_log_dir(&dir);
//! let report = evaluator.evaluate(&cases).unwrap();
//! assert_eq!(report.counts.false_positives, 1);
//! ```

#![warn(missing_docs)]

pub mod chat;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod gender;
pub mod ner;
pub mod story;

pub use chat::{ChatBackend, ChatMessage, OllamaChat, DEFAULT_OLLAMA_HOST};
pub use dataset::{load_gender_lexicon, load_questions, load_stereotype_cases};
pub use error::{Error, Result};
pub use eval::{
    BiasCounts, BiasReport, CaseRecord, StereotypeCase, StereotypeEvaluator, SurveyRunner,
    SurveyTable,
};
pub use gender::{normalize_name, Gender, GenderLexicon, KnownGender, NameRecord};
pub use ner::{first_person_name, HttpTagger, NameExtractor, TaggedToken, TokenTagger};
pub use story::{StoryGenerator, STORY_INSTRUCTION};

use std::sync::Mutex;

// =============================================================================
// Test doubles
// =============================================================================

/// A mock chat backend for tests and examples.
///
/// Replies are chosen by substring match against the last user turn, so a
/// given input always gets the same answer; unmatched turns get the default
/// reply. All conversations are recorded for inspection.
pub struct MockChat {
    default_reply: String,
    replies: Vec<(String, String)>,
    failure: Option<String>,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl MockChat {
    /// Create a mock that answers every turn with `default_reply`.
    #[must_use]
    pub fn new(default_reply: impl Into<String>) -> Self {
        MockChat {
            default_reply: default_reply.into(),
            replies: Vec::new(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that fails every turn no scripted reply matches, as an
    /// unreachable backend would. Combine with [`MockChat::with_reply`] to
    /// simulate a backend that dies partway through a run.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let mut mock = MockChat::new("");
        mock.failure = Some(message.into());
        mock
    }

    /// Answer `reply` whenever the last user turn contains `needle`.
    #[must_use]
    pub fn with_reply(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.replies.push((needle.into(), reply.into()));
        self
    }

    /// All conversations seen so far, in call order.
    #[must_use]
    pub fn conversations(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChatBackend for MockChat {
    fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("");

        for (needle, reply) in &self.replies {
            if last_user.contains(needle) {
                return Ok(reply.clone());
            }
        }

        if let Some(message) = &self.failure {
            return Err(Error::chat(message.clone()));
        }
        Ok(self.default_reply.clone())
    }
}

/// A mock NER collaborator for tests and examples.
///
/// Token sequences are chosen by substring match against the input text;
/// unmatched text yields no tokens (and so no extracted name).
#[derive(Debug, Clone, Default)]
pub struct MockTagger {
    responses: Vec<(String, Vec<TaggedToken>)>,
    failure: Option<String>,
}

impl MockTagger {
    /// Create a mock that returns no tokens for any text.
    #[must_use]
    pub fn new() -> Self {
        MockTagger::default()
    }

    /// Create a mock whose every call fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        MockTagger {
            responses: Vec::new(),
            failure: Some(message.into()),
        }
    }

    /// Return `tokens` whenever the input text contains `needle`.
    #[must_use]
    pub fn with_response(mut self, needle: impl Into<String>, tokens: Vec<TaggedToken>) -> Self {
        self.responses.push((needle.into(), tokens));
        self
    }
}

impl TokenTagger for MockTagger {
    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>> {
        if let Some(message) = &self.failure {
            return Err(Error::ner(message.clone()));
        }
        for (needle, tokens) in &self.responses {
            if text.contains(needle) {
                return Ok(tokens.clone());
            }
        }
        Ok(Vec::new())
    }
}
