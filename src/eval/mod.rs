//! Evaluation harnesses.
//!
//! - [`stereotype`]: story-generation probe with NER name extraction and
//!   confusion-style bias metrics.
//! - [`survey`]: repeated Likert questionnaire runs collected into a CSV
//!   table.

pub mod stereotype;
pub mod survey;

pub use stereotype::{
    BiasCounts, BiasReport, CaseRecord, StereotypeCase, StereotypeEvaluator,
};
pub use survey::{SurveyRunner, SurveyTable};
