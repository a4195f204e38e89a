//! Diagnosis labels and raw-score interpretation.
//!
//! The model emits a single sigmoid scalar. This module maps that scalar
//! onto the closed two-label domain and derives a confidence percentage for
//! whichever label was chosen.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The decision boundary on the raw score.
///
/// Scores strictly above the threshold are malignant; a score of exactly
/// 0.5 is classified benign. The tie-break toward the non-malignant class
/// is deliberate and must be preserved.
pub const DECISION_THRESHOLD: f32 = 0.5;

/// The closed set of diagnosis labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diagnosis {
    /// The lesion is classified as benign.
    Benign,
    /// The lesion is classified as malignant.
    Malignant,
}

impl Diagnosis {
    /// Returns the label as a lowercase string, matching the wire format
    /// the hosting boundary emits.
    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Benign => "benign",
            Diagnosis::Malignant => "malignant",
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one classification request.
///
/// Created once per request and immutable; `confidence` is a percentage in
/// `[0.0, 100.0]` for in-range scores, rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// The assigned label.
    pub label: Diagnosis,
    /// Confidence in the assigned label, as a percentage.
    pub confidence: f32,
}

/// Maps a raw model score onto a diagnosis with a confidence percentage.
///
/// Scores above [`DECISION_THRESHOLD`] yield `Malignant` with confidence
/// `score * 100`; everything else yields `Benign` with confidence
/// `(1 - score) * 100`. Confidence is rounded to two decimal places,
/// half away from zero.
///
/// Scores outside `[0.0, 1.0]` are not clamped: the arithmetic degrades
/// (confidence above 100 or below 0) rather than silently moving a score
/// across the boundary. Range policing belongs to the caller.
pub fn interpret(score: f32) -> DiagnosisResult {
    if score > DECISION_THRESHOLD {
        DiagnosisResult {
            label: Diagnosis::Malignant,
            confidence: round_to_two_decimals(score * 100.0),
        }
    } else {
        DiagnosisResult {
            label: Diagnosis::Benign,
            confidence: round_to_two_decimals((1.0 - score) * 100.0),
        }
    }
}

fn round_to_two_decimals(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
