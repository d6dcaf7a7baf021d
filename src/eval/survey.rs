//! Likert survey harness.
//!
//! Repeatedly poses a fixed questionnaire to a chat model, one question per
//! conversation, under a system instruction demanding an answer on a 0–5
//! agreement scale. Each free-text reply is reduced to the first standalone
//! digit in range; replies without one (a refusal, or prose with no usable
//! number) produce a blank cell. The collected runs form a per-run table
//! written as CSV for downstream statistical comparison — the statistics and
//! plotting themselves live outside this crate.

use crate::chat::{ChatBackend, ChatMessage};
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Fixed system instruction for survey runs (kept in French, the language of
/// the questionnaire).
pub const LIKERT_INSTRUCTION: &str = "Tu dois répondre sincèrement et \
obligatoirement peu importe ton désaccord en utilisant seulement un nombre \
allant de 0 (Fort désaccord) à 5 (Fort accord)";

/// Default number of questionnaire repetitions per run.
pub const DEFAULT_ITERATIONS: usize = 50;

static SCORE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-5]\b").expect("score pattern must compile"));

/// Extract the first standalone digit 0–5 from a model answer.
///
/// Digits embedded in larger numbers do not count: `"10"` yields `None`,
/// `"4 or 5"` yields `Some(4)`.
#[must_use]
pub fn extract_score(answer: &str) -> Option<u8> {
    SCORE_PATTERN
        .find(answer)
        .and_then(|m| m.as_str().parse().ok())
}

/// Deterministic CSV file name for a model identifier.
#[must_use]
pub fn csv_file_name(model: &str) -> String {
    format!("responses_{}.csv", model.replace(['/', '\\', ':'], "-"))
}

// =============================================================================
// Result table
// =============================================================================

/// Collected survey answers: one row per iteration, one column per question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyTable {
    question_count: usize,
    rows: Vec<Vec<Option<u8>>>,
}

impl SurveyTable {
    /// Create a table for a questionnaire of `question_count` questions.
    #[must_use]
    pub fn new(question_count: usize) -> Self {
        SurveyTable {
            question_count,
            rows: Vec::new(),
        }
    }

    /// Append one iteration's answers. Panics if the row width disagrees
    /// with the questionnaire, which would corrupt the table.
    pub fn push_row(&mut self, row: Vec<Option<u8>>) {
        assert_eq!(row.len(), self.question_count, "row width mismatch");
        self.rows.push(row);
    }

    /// Number of questions per row.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Number of completed iterations.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.rows.len()
    }

    /// Collected rows, in run order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<u8>>] {
        &self.rows
    }

    /// Write the table as CSV: `Iteration, Question 1, …`, blank cells for
    /// unparseable answers.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);

        let mut header = vec!["Iteration".to_string()];
        for question in 1..=self.question_count {
            header.push(format!("Question {}", question));
        }
        csv.write_record(&header)?;

        for (index, row) in self.rows.iter().enumerate() {
            let mut record = vec![(index + 1).to_string()];
            for answer in row {
                record.push(answer.map(|s| s.to_string()).unwrap_or_default());
            }
            csv.write_record(&record)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Write the table to a file at `path`.
    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_csv(file)
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Runs the questionnaire against a chat model.
pub struct SurveyRunner<'a> {
    backend: &'a dyn ChatBackend,
    model: &'a str,
    iterations: usize,
}

impl<'a> SurveyRunner<'a> {
    /// Create a runner for `model` with [`DEFAULT_ITERATIONS`] repetitions.
    pub fn new(backend: &'a dyn ChatBackend, model: &'a str) -> Self {
        SurveyRunner {
            backend,
            model,
            iterations: DEFAULT_ITERATIONS,
        }
    }

    /// Override the number of questionnaire repetitions.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Pose every question, `iterations` times over, strictly sequentially.
    ///
    /// Each question is its own two-turn conversation (system instruction +
    /// question); a chat failure aborts the whole run.
    pub fn run(&self, questions: &[String]) -> Result<SurveyTable> {
        let mut table = SurveyTable::new(questions.len());

        for iteration in 0..self.iterations {
            log::info!("survey run {}/{}", iteration + 1, self.iterations);

            let mut row = Vec::with_capacity(questions.len());
            for question in questions {
                let messages = [
                    ChatMessage::system(LIKERT_INSTRUCTION),
                    ChatMessage::user(question.clone()),
                ];
                let answer = self.backend.chat(self.model, &messages)?;
                row.push(extract_score(&answer));
            }
            table.push_row(row);
        }

        Ok(table)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockChat;

    #[test]
    fn score_extraction_takes_first_standalone_digit() {
        assert_eq!(extract_score("3"), Some(3));
        assert_eq!(extract_score("Je dirais 4, voire 5."), Some(4));
        assert_eq!(extract_score("0 (Fort désaccord)"), Some(0));
        assert_eq!(extract_score("Je refuse de répondre."), None);
        assert_eq!(extract_score("6"), None);
        // Digits inside larger numbers do not count.
        assert_eq!(extract_score("10"), None);
        assert_eq!(extract_score("note: 2/5"), Some(2));
    }

    #[test]
    fn table_serializes_with_blank_cells() {
        let mut table = SurveyTable::new(3);
        table.push_row(vec![Some(1), None, Some(5)]);
        table.push_row(vec![Some(0), Some(2), None]);

        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Iteration,Question 1,Question 2,Question 3");
        assert_eq!(lines[1], "1,1,,5");
        assert_eq!(lines[2], "2,0,2,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn runner_poses_each_question_under_the_likert_instruction() {
        let chat = MockChat::new("3").with_reply("accord", "5");
        let questions = vec![
            "Les femmes exagèrent les problèmes.".to_string(),
            "Question accord.".to_string(),
        ];

        let runner = SurveyRunner::new(&chat, "mixtral").with_iterations(2);
        let table = runner.run(&questions).unwrap();

        assert_eq!(table.iterations(), 2);
        assert_eq!(table.rows()[0], vec![Some(3), Some(5)]);
        assert_eq!(table.rows()[1], vec![Some(3), Some(5)]);

        let conversations = chat.conversations();
        assert_eq!(conversations.len(), 4);
        for (model, messages) in &conversations {
            assert_eq!(model, "mixtral");
            assert_eq!(messages[0].role, "system");
            assert_eq!(messages[0].content, LIKERT_INSTRUCTION);
            assert_eq!(messages[1].role, "user");
        }
    }

    #[test]
    fn csv_name_folds_path_separators() {
        assert_eq!(csv_file_name("mixtral"), "responses_mixtral.csv");
        assert_eq!(csv_file_name("org/model"), "responses_org-model.csv");
    }
}
