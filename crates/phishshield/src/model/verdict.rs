//! Final classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Class label. The positive class (1) is a legitimate site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Legitimate,
    Phishing,
}

impl Label {
    /// Numeric class as used in training: 1 legitimate, 0 phishing.
    pub fn code(self) -> u8 {
        match self {
            Label::Legitimate => 1,
            Label::Phishing => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Legitimate => "Legitimate",
            Label::Phishing => "Phishing",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability of the legitimate class and the label it rounds to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub probability: f64,
    pub label: Label,
}

impl Verdict {
    /// Round half away from zero: `0.5` is legitimate.
    pub fn from_probability(probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        let label = if probability.round() >= 1.0 {
            Label::Legitimate
        } else {
            Label::Phishing
        };
        Self { probability, label }
    }

    /// 1 for legitimate, 0 for phishing.
    pub fn prediction(&self) -> u8 {
        self.label.code()
    }
}
