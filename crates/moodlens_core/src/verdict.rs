//! Score classification and the formatted values shown in a result block.

use std::fmt;

/// One of the two fixed categories a score maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Happy,
    Sad,
}

impl Verdict {
    /// Label text shown in front of the percentage.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Happy => "Happy",
            Verdict::Sad => "Sad",
        }
    }

    /// Emoji glyph shown beside the result.
    pub fn emoji(&self) -> &'static str {
        match self {
            Verdict::Happy => ":)",
            Verdict::Sad => ":(",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a score against `threshold`.
///
/// Only scores strictly above the threshold are sad, so a score sitting
/// exactly on it is happy. NaN compares false and is therefore happy too.
pub fn classify(score: f64, threshold: f64) -> Verdict {
    if score > threshold {
        Verdict::Sad
    } else {
        Verdict::Happy
    }
}

/// A score rendered as a percentage with one decimal place, e.g. `"30.0%"`.
///
/// Formatted once so the label and the bar can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Percentage(String);

impl Percentage {
    /// Format `score * 100` with one decimal.
    ///
    /// Rounds the exact binary value, like JavaScript's `toFixed(1)`. Exact
    /// ties round away from zero; `{:.1}` alone would round them to even.
    pub fn from_score(score: f64) -> Self {
        let percent = score * 100.0;
        if !percent.is_finite() {
            return Self(format!("{}%", percent));
        }
        // toFixed drops the sign of negative zero
        if percent == 0.0 {
            return Self("0.0%".to_string());
        }
        // A tie at one decimal is only representable when percent * 4 is odd
        let quarters = percent * 4.0;
        if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
            let rounded = (percent * 10.0).round() / 10.0;
            return Self(format!("{:.1}%", rounded));
        }
        Self(format!("{:.1}%", percent))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to render one result block.
#[derive(Debug, Clone)]
pub struct PreviewEntry<S> {
    /// Downsampled image produced by the decoder
    pub snapshot: S,
    /// Raw score as returned by the prediction service
    pub score: f64,
    pub verdict: Verdict,
    pub percentage: Percentage,
}

impl<S> PreviewEntry<S> {
    pub fn new(snapshot: S, score: f64, threshold: f64) -> Self {
        Self {
            snapshot,
            score,
            verdict: classify(score, threshold),
            percentage: Percentage::from_score(score),
        }
    }

    /// Headline text, e.g. `"Happy (30.0%)"`.
    pub fn label_text(&self) -> String {
        format!("{} ({})", self.verdict.label(), self.percentage)
    }

    /// Value for the bar's CSS width. Same string as the bar's text.
    pub fn bar_width(&self) -> &str {
        self.percentage.as_str()
    }

    pub fn emoji(&self) -> &'static str {
        self.verdict.emoji()
    }
}
