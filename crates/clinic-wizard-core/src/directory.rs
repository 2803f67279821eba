//! Patient lookup for the appointment wizard's patient-selection step.

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

/// Minimum similarity for a fuzzy (non-substring) match.
const MATCH_THRESHOLD: f64 = 0.8;

/// A selectable patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientOption {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl PatientOption {
    pub fn new(id: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            id: id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    /// "Last, First" as shown in the selector.
    pub fn label(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// A search hit with its similarity score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientMatch {
    pub option: PatientOption,
    pub score: f64,
}

/// Patients the user can pick from.
#[derive(Debug, Clone, Default)]
pub struct PatientDirectory {
    options: Vec<PatientOption>,
}

impl PatientDirectory {
    pub fn new(mut options: Vec<PatientOption>) -> Self {
        options.sort_by_key(|o| (o.last_name.to_lowercase(), o.first_name.to_lowercase()));
        Self { options }
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// All options, ordered by last name then first name.
    pub fn options(&self) -> &[PatientOption] {
        &self.options
    }

    pub fn get(&self, id: &str) -> Option<&PatientOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Best matches for a typed query, highest score first.
    ///
    /// A blank query lists everyone. Substring hits score 1.0; otherwise
    /// each query word is compared against each name word.
    pub fn search(&self, query: &str, limit: usize) -> Vec<PatientMatch> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self
                .options
                .iter()
                .take(limit)
                .map(|o| PatientMatch {
                    option: o.clone(),
                    score: 1.0,
                })
                .collect();
        }

        let mut matches: Vec<PatientMatch> = self
            .options
            .iter()
            .filter_map(|o| {
                let score = score(&query, o);
                (score >= MATCH_THRESHOLD).then(|| PatientMatch {
                    option: o.clone(),
                    score,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(limit);
        matches
    }
}

fn score(query: &str, option: &PatientOption) -> f64 {
    let full = format!("{} {}", option.first_name, option.last_name).to_lowercase();
    if full.contains(query) || option.label().to_lowercase().contains(query) {
        return 1.0;
    }

    let words: Vec<&str> = full.split_whitespace().collect();
    let per_word: Vec<f64> = query
        .split_whitespace()
        .map(|q| {
            words
                .iter()
                .map(|w| similarity(q, w))
                .fold(0.0, f64::max)
        })
        .collect();

    if per_word.is_empty() {
        return 0.0;
    }
    per_word.iter().sum::<f64>() / per_word.len() as f64
}

fn similarity(a: &str, b: &str) -> f64 {
    // Jaro-Winkler favours shared prefixes, Levenshtein overall shape
    jaro_winkler(a, b) * 0.7 + normalized_levenshtein(a, b) * 0.3
}
