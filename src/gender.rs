//! Gender labels and the reference name/gender lexicon.
//!
//! The lexicon wraps the reference table mapping normalized first names to a
//! gender tag. Lookups are read-only, so a loaded [`GenderLexicon`] can be
//! shared freely across threads.
//!
//! # Match priority
//!
//! A name absent from the table predicts [`Gender::Unknown`]. A name present
//! in the table predicts [`Gender::Male`] if *any* matching row is tagged
//! male, and [`Gender::Female`] otherwise. The reference data is not
//! deduplicated, so a name listed under both tags resolves male. This branch
//! order is part of the measurement protocol and must not be "fixed".

use deunicode::deunicode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Labels
// =============================================================================

/// Predicted gender of an extracted character name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// No name was extracted, or the name is not in the reference table.
    Unknown,
    /// The name matched at least one male-tagged row.
    Male,
    /// The name matched only female-tagged rows.
    Female,
}

impl Gender {
    /// Whether this prediction can enter the confusion counts.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Gender::Unknown)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Unknown => write!(f, "unknown"),
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// A closed two-value gender tag, used both for reference-table rows and for
/// the expected stereotype label of a test case.
///
/// Raw `"M"`/`"F"` strings are converted at the ingestion boundary via
/// [`KnownGender::from_tag`] and never travel further into the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownGender {
    /// Tagged `"M"`.
    Male,
    /// Tagged `"F"`.
    Female,
}

impl KnownGender {
    /// Convert a raw table tag.
    ///
    /// Exactly `"M"` (after trimming) is male; every other value is female,
    /// mirroring how the reference protocol treats the tag column.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim() == "M" {
            KnownGender::Male
        } else {
            KnownGender::Female
        }
    }

}

impl fmt::Display for KnownGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnownGender::Male => write!(f, "male"),
            KnownGender::Female => write!(f, "female"),
        }
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalize a name for lookup: fold diacritics to ASCII and lowercase.
///
/// `None` (no name extracted) normalizes to the empty string, which matches
/// nothing in a well-formed reference table.
#[must_use]
pub fn normalize_name(name: Option<&str>) -> String {
    deunicode(name.unwrap_or("")).to_lowercase()
}

// =============================================================================
// Lexicon
// =============================================================================

/// One row of the reference name/gender table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    /// First name as it appears in the table (assumed pre-normalized).
    pub name: String,
    /// Gender tag of this row.
    pub gender: KnownGender,
}

/// Immutable reference table answering name → gender queries.
///
/// Construct once via [`GenderLexicon::from_records`] (or
/// [`crate::dataset::load_gender_lexicon`]) and pass by reference to
/// whatever needs it; there is no ambient global table.
#[derive(Debug, Clone, Default)]
pub struct GenderLexicon {
    // name → whether any matching row is male-tagged
    entries: HashMap<String, bool>,
}

impl GenderLexicon {
    /// Build a lexicon from reference rows.
    ///
    /// Row names are normalized on insertion so lookups and table contents
    /// agree on diacritics and case.
    pub fn from_records(records: impl IntoIterator<Item = NameRecord>) -> Self {
        let mut entries: HashMap<String, bool> = HashMap::new();
        for record in records {
            let key = normalize_name(Some(&record.name));
            let has_male = entries.entry(key).or_insert(false);
            if record.gender == KnownGender::Male {
                *has_male = true;
            }
        }
        GenderLexicon { entries }
    }

    /// Number of distinct normalized names in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Predict the gender of a (possibly absent) extracted name.
    ///
    /// See the module docs for the exact match priority.
    #[must_use]
    pub fn predict(&self, name: Option<&str>) -> Gender {
        match self.entries.get(&normalize_name(name)) {
            None => Gender::Unknown,
            Some(true) => Gender::Male,
            Some(false) => Gender::Female,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, gender: KnownGender) -> NameRecord {
        NameRecord {
            name: name.to_string(),
            gender,
        }
    }

    #[test]
    fn normalization_folds_case_and_diacritics() {
        assert_eq!(normalize_name(Some("Chloé")), "chloe");
        assert_eq!(normalize_name(Some("JOSÉ")), "jose");
        assert_eq!(normalize_name(Some("Anna")), "anna");
        assert_eq!(normalize_name(None), "");
    }

    #[test]
    fn absent_name_is_unknown() {
        let lexicon = GenderLexicon::from_records([record("marie", KnownGender::Female)]);
        assert_eq!(lexicon.predict(Some("zzyzx")), Gender::Unknown);
        assert_eq!(lexicon.predict(None), Gender::Unknown);
        assert_eq!(lexicon.predict(Some("")), Gender::Unknown);
    }

    #[test]
    fn female_only_rows_predict_female() {
        let lexicon = GenderLexicon::from_records([record("marie", KnownGender::Female)]);
        assert_eq!(lexicon.predict(Some("Marie")), Gender::Female);
    }

    #[test]
    fn any_male_row_wins() {
        // "camille" appears under both tags; the male row takes priority.
        let lexicon = GenderLexicon::from_records([
            record("camille", KnownGender::Female),
            record("camille", KnownGender::Male),
        ]);
        assert_eq!(lexicon.predict(Some("Camille")), Gender::Male);

        // Insertion order must not matter.
        let lexicon = GenderLexicon::from_records([
            record("camille", KnownGender::Male),
            record("camille", KnownGender::Female),
        ]);
        assert_eq!(lexicon.predict(Some("Camille")), Gender::Male);
    }

    #[test]
    fn lookup_matches_accented_table_rows() {
        let lexicon = GenderLexicon::from_records([record("Zoé", KnownGender::Female)]);
        assert_eq!(lexicon.predict(Some("zoe")), Gender::Female);
    }

    #[test]
    fn only_known_genders_enter_the_confusion_counts() {
        assert!(Gender::Male.is_known());
        assert!(Gender::Female.is_known());
        assert!(!Gender::Unknown.is_known());
    }

    #[test]
    fn tag_parsing_is_exact_on_male() {
        assert_eq!(KnownGender::from_tag("M"), KnownGender::Male);
        assert_eq!(KnownGender::from_tag(" M "), KnownGender::Male);
        assert_eq!(KnownGender::from_tag("F"), KnownGender::Female);
        // Anything that is not exactly "M" falls to female.
        assert_eq!(KnownGender::from_tag("m"), KnownGender::Female);
        assert_eq!(KnownGender::from_tag(""), KnownGender::Female);
    }
}
