//! NER collaborator boundary and first-person-name extraction.
//!
//! The NER pipeline itself is an external service; all this module knows
//! about it is the [`TokenTagger`] contract: given raw text, it returns an
//! ordered sequence of [`TaggedToken`] records, each an entity tag plus a
//! sub-word fragment. Everything loosely typed about the collaborator's wire
//! format is parsed here and nowhere else.
//!
//! Tags follow the usual IOB2 convention for person spans: `B-PER` begins a
//! mention, `I-PER` continues it, anything without `PER` is not a person.
//! WordPiece-style fragments carry a `##` continuation marker that is
//! stripped before concatenation.
//!
//! # Example
//!
//! ```rust
//! use biascope::ner::{first_person_name, TaggedToken};
//!
//! let tokens = [
//!     TaggedToken::new("B-PER", "Jo"),
//!     TaggedToken::new("I-PER", "##hn"),
//!     TaggedToken::new("O", "ran"),
//! ];
//! assert_eq!(first_person_name(&tokens), Some("John".to_string()));
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Substring identifying person-entity tags.
const PERSON_TAG: &str = "PER";
/// Substring identifying the beginning of a new person span.
const PERSON_BEGIN_TAG: &str = "B-PER";
/// WordPiece continuation marker stripped before concatenation.
const CONTINUATION_MARKER: &str = "##";

/// One tagged sub-word token from the NER collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    /// Entity tag, e.g. `B-PER`, `I-PER`, `O`.
    pub entity: String,
    /// Sub-word fragment, possibly prefixed with `##`.
    pub word: String,
}

impl TaggedToken {
    /// Create a tagged token.
    pub fn new(entity: impl Into<String>, word: impl Into<String>) -> Self {
        TaggedToken {
            entity: entity.into(),
            word: word.into(),
        }
    }

    fn is_person(&self) -> bool {
        self.entity.contains(PERSON_TAG)
    }

    fn begins_person(&self) -> bool {
        self.entity.contains(PERSON_BEGIN_TAG)
    }
}

/// The NER collaborator seam.
///
/// Implementations are expected to be stateless per call; errors are fatal
/// to the run (no retries).
pub trait TokenTagger: Send + Sync {
    /// Tag raw text, returning recognized tokens in document order.
    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>>;
}

/// Extract the first contiguous person mention from tagged tokens.
///
/// Scans in order, skipping non-person tokens, concatenating person
/// fragments (continuation markers stripped), and stopping as soon as a new
/// `B-PER` appears after at least one fragment has been accumulated. Returns
/// `None` when no person token is present.
#[must_use]
pub fn first_person_name(tokens: &[TaggedToken]) -> Option<String> {
    let mut name = String::new();
    let mut seen_any = false;

    for token in tokens {
        if !token.is_person() {
            continue;
        }
        if seen_any && token.begins_person() {
            break;
        }
        name.push_str(&token.word.replace(CONTINUATION_MARKER, ""));
        seen_any = true;
    }

    if seen_any {
        Some(name)
    } else {
        None
    }
}

/// Name extractor over a [`TokenTagger`] collaborator.
#[derive(Clone, Copy)]
pub struct NameExtractor<'a> {
    tagger: &'a dyn TokenTagger,
}

impl<'a> NameExtractor<'a> {
    /// Create an extractor over the given tagger.
    pub fn new(tagger: &'a dyn TokenTagger) -> Self {
        NameExtractor { tagger }
    }

    /// Extract the first person name mentioned in `sentence`, if any.
    pub fn extract(&self, sentence: &str) -> Result<Option<String>> {
        let tokens = self.tagger.tag(sentence)?;
        Ok(first_person_name(&tokens))
    }
}

/// HTTP token-classification endpoint client.
///
/// Speaks the HuggingFace inference convention: POST `{"inputs": text}`,
/// receive a JSON array of tagged tokens. Extra response fields (scores,
/// offsets) are ignored.
#[derive(Debug, Clone)]
pub struct HttpTagger {
    endpoint: String,
}

impl HttpTagger {
    /// Create a client for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        HttpTagger {
            endpoint: endpoint.into(),
        }
    }

    /// The endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TokenTagger for HttpTagger {
    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>> {
        let response = ureq::post(&self.endpoint)
            .send_json(serde_json::json!({ "inputs": text }))
            .map_err(|e| Error::ner(format!("POST {} failed: {}", self.endpoint, e)))?;

        response
            .into_json::<Vec<TaggedToken>>()
            .map_err(|e| Error::ner(format!("malformed NER response: {}", e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
