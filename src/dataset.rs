//! Loaders for the tabular inputs.
//!
//! Three inputs feed the harnesses, all loaded once and read-only for the
//! process lifetime:
//!
//! - the reference name/gender table (CSV, columns `Name`, `Gender`),
//! - the stereotype test cases (CSV, columns `Description`, `Stéréotype`),
//! - the survey questionnaire (plain text, one question per non-empty line).
//!
//! Missing or malformed columns are fatal at load time; raw `"M"`/`"F"` tags
//! are converted to [`KnownGender`] here and never travel further.

use crate::eval::stereotype::StereotypeCase;
use crate::gender::{GenderLexicon, KnownGender, NameRecord};
use crate::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawNameRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Gender")]
    gender: String,
}

#[derive(Debug, Deserialize)]
struct RawCaseRow {
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Stéréotype")]
    stereotype: String,
}

/// Load the reference name/gender table into a [`GenderLexicon`].
pub fn load_gender_lexicon(path: impl AsRef<Path>) -> Result<GenderLexicon> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::dataset(format!("{}: {}", path.display(), e)))?;

    let mut records = Vec::new();
    for row in reader.deserialize::<RawNameRow>() {
        let row = row.map_err(|e| Error::dataset(format!("{}: {}", path.display(), e)))?;
        records.push(NameRecord {
            name: row.name,
            gender: KnownGender::from_tag(&row.gender),
        });
    }

    if records.is_empty() {
        return Err(Error::dataset(format!(
            "{}: empty name/gender table",
            path.display()
        )));
    }

    log::debug!("loaded {} name records from {}", records.len(), path.display());
    Ok(GenderLexicon::from_records(records))
}

/// Load the stereotype test cases, in file order.
pub fn load_stereotype_cases(path: impl AsRef<Path>) -> Result<Vec<StereotypeCase>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::dataset(format!("{}: {}", path.display(), e)))?;

    let mut cases = Vec::new();
    for row in reader.deserialize::<RawCaseRow>() {
        let row = row.map_err(|e| Error::dataset(format!("{}: {}", path.display(), e)))?;
        cases.push(StereotypeCase {
            description: row.description,
            stereotype: KnownGender::from_tag(&row.stereotype),
        });
    }

    log::debug!("loaded {} test cases from {}", cases.len(), path.display());
    Ok(cases)
}

/// Load the survey questionnaire: one question per non-empty line.
pub fn load_questions(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| Error::dataset(format!("{}: {}", path.display(), e)))?;

    let questions: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if questions.is_empty() {
        return Err(Error::dataset(format!(
            "{}: no questions found",
            path.display()
        )));
    }

    Ok(questions)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gender::Gender;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_name_table() {
        let file = temp_file("Name,Gender\nmarie,F\njean,M\ncamille,F\ncamille,M\n");
        let lexicon = load_gender_lexicon(file.path()).unwrap();
        assert_eq!(lexicon.len(), 3);
        assert_eq!(lexicon.predict(Some("marie")), Gender::Female);
        assert_eq!(lexicon.predict(Some("jean")), Gender::Male);
        assert_eq!(lexicon.predict(Some("camille")), Gender::Male);
    }

    #[test]
    fn missing_gender_column_is_fatal() {
        let file = temp_file("Name,Sex\nmarie,F\n");
        let err = load_gender_lexicon(file.path()).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)), "got {:?}", err);
    }

    #[test]
    fn loads_stereotype_cases_in_order() {
        let file = temp_file(
            "Description,Stéréotype\nrépare une voiture,M\ngarde des enfants,F\n",
        );
        let cases = load_stereotype_cases(file.path()).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].description, "répare une voiture");
        assert_eq!(cases[0].stereotype, KnownGender::Male);
        assert_eq!(cases[1].stereotype, KnownGender::Female);
    }

    #[test]
    fn questions_skip_blank_lines() {
        let file = temp_file("Question une\n\n  Question deux  \n\n");
        let questions = load_questions(file.path()).unwrap();
        assert_eq!(questions, vec!["Question une", "Question deux"]);
    }

    #[test]
    fn empty_questionnaire_is_fatal() {
        let file = temp_file("\n\n");
        assert!(load_questions(file.path()).is_err());
    }
}
