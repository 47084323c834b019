use std::collections::{HashMap, HashSet};

use super::{Classification, SentimentOracle};
use crate::types::SentimentLabel;

/// Longest input considered, in whitespace tokens.
pub const MAX_TOKENS: usize = 512;

/// Scores inside `(-NEUTRAL_BAND, NEUTRAL_BAND)` are labelled neutral.
pub const NEUTRAL_BAND: f64 = 0.05;

/// Confidence reported when no lexicon term matched at all.
pub const UNMATCHED_CONFIDENCE: f64 = 0.5;

const POSITIVE_TERMS: &[(&str, f64)] = &[
    ("bullish", 0.8),
    ("surge", 0.7),
    ("soar", 0.8),
    ("rally", 0.7),
    ("jump", 0.6),
    ("climb", 0.5),
    ("gain", 0.5),
    ("profit", 0.6),
    ("growth", 0.6),
    ("grow", 0.5),
    ("rise", 0.5),
    ("increase", 0.5),
    ("improve", 0.5),
    ("outperform", 0.7),
    ("beat", 0.6),
    ("exceed", 0.6),
    ("strong", 0.5),
    ("robust", 0.5),
    ("positive", 0.5),
    ("optimistic", 0.6),
    ("confident", 0.5),
    ("record", 0.6),
    ("upgrade", 0.6),
    ("buy", 0.5),
    ("breakout", 0.6),
    ("recovery", 0.5),
    ("rebound", 0.5),
    ("win", 0.5),
    ("approval", 0.5),
    ("dividend", 0.3),
    ("buyback", 0.4),
    ("expand", 0.4),
    ("partnership", 0.3),
];

const NEGATIVE_TERMS: &[(&str, f64)] = &[
    ("bearish", -0.8),
    ("crash", -0.9),
    ("plunge", -0.8),
    ("tumble", -0.7),
    ("slump", -0.7),
    ("sink", -0.6),
    ("drop", -0.6),
    ("fall", -0.5),
    ("decline", -0.6),
    ("loss", -0.6),
    ("lose", -0.5),
    ("decrease", -0.5),
    ("weak", -0.5),
    ("negative", -0.5),
    ("pessimistic", -0.6),
    ("concern", -0.5),
    ("worry", -0.5),
    ("fear", -0.6),
    ("risk", -0.4),
    ("uncertainty", -0.5),
    ("miss", -0.6),
    ("disappoint", -0.7),
    ("underperform", -0.6),
    ("downgrade", -0.6),
    ("sell", -0.5),
    ("selloff", -0.7),
    ("lawsuit", -0.6),
    ("probe", -0.5),
    ("recall", -0.5),
    ("layoff", -0.6),
    ("cut", -0.4),
    ("crisis", -0.8),
    ("warning", -0.5),
    ("warn", -0.5),
    ("fail", -0.7),
    ("fraud", -0.9),
    ("bankruptcy", -0.9),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "none", "cannot", "cant", "don't", "dont", "doesn't",
    "doesnt", "didn't", "didnt", "won't", "wont", "isn't", "isnt", "aren't", "arent",
    "wasn't", "wasnt", "hardly", "barely", "without",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5),
    ("extremely", 2.0),
    ("highly", 1.5),
    ("significantly", 1.5),
    ("sharply", 1.6),
    ("dramatically", 1.8),
    ("massively", 1.8),
    ("slightly", 0.5),
    ("somewhat", 0.7),
    ("marginally", 0.5),
];

const SUFFIXES: &[&str] = &["ing", "ed", "es", "s"];

/// Rule-based financial lexicon classifier with negation and intensifier
/// handling.
#[derive(Debug, Clone)]
pub struct LexiconOracle {
    words: HashMap<String, f64>,
    negations: HashSet<String>,
    intensifiers: HashMap<String, f64>,
}

impl Default for LexiconOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconOracle {
    pub fn new() -> Self {
        let words = POSITIVE_TERMS
            .iter()
            .chain(NEGATIVE_TERMS)
            .map(|(w, s)| (w.to_string(), *s))
            .collect();
        let negations = NEGATIONS.iter().map(|w| w.to_string()).collect();
        let intensifiers = INTENSIFIERS.iter().map(|(w, m)| (w.to_string(), *m)).collect();

        Self {
            words,
            negations,
            intensifiers,
        }
    }

    /// Exact match first, then the word with a common inflection removed.
    fn lookup(&self, word: &str) -> Option<f64> {
        if let Some(score) = self.words.get(word) {
            return Some(*score);
        }
        SUFFIXES.iter().find_map(|suffix| {
            let stem = word.strip_suffix(suffix)?;
            self.words
                .get(stem)
                .or_else(|| self.words.get(&format!("{}e", stem)))
                .copied()
        })
    }

    /// Mean score of the matched terms, clamped to [-1, 1]. Zero when nothing matched.
    pub fn score(&self, text: &str) -> f64 {
        self.matched_score(text).unwrap_or(0.0)
    }

    fn matched_score(&self, text: &str) -> Option<f64> {
        let mut scores = Vec::new();
        let mut negate = false;
        let mut intensity = 1.0;

        for token in text.split_whitespace().take(MAX_TOKENS) {
            let word: String = token
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase();
            if word.is_empty() {
                continue;
            }

            if self.negations.contains(&word) {
                negate = true;
                continue;
            }
            if let Some(mult) = self.intensifiers.get(&word) {
                intensity = *mult;
                continue;
            }

            match self.lookup(&word) {
                Some(mut score) => {
                    if negate {
                        score = -score;
                    }
                    scores.push(score * intensity);
                    negate = false;
                    intensity = 1.0;
                }
                None => intensity = 1.0,
            }
        }

        if scores.is_empty() {
            return None;
        }
        Some((scores.iter().sum::<f64>() / scores.len() as f64).clamp(-1.0, 1.0))
    }
}

impl SentimentOracle for LexiconOracle {
    fn name(&self) -> &'static str {
        "financial-lexicon"
    }

    fn classify(&self, text: &str) -> Classification {
        let Some(score) = self.matched_score(text) else {
            return Classification::new(SentimentLabel::Neutral, UNMATCHED_CONFIDENCE);
        };

        let label = if score >= NEUTRAL_BAND {
            SentimentLabel::Positive
        } else if score <= -NEUTRAL_BAND {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };

        // 0.5 at the decision boundary, approaching 1.0 with magnitude
        let margin = match label {
            SentimentLabel::Neutral => (NEUTRAL_BAND - score.abs()) / NEUTRAL_BAND * 0.5,
            _ => score.abs(),
        };
        let confidence = 0.5 + 0.49 * (1.0 - (-3.0 * margin).exp());

        Classification::new(label, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::DOMINANCE_CONFIDENCE;

    #[test]
    fn test_positive_headline() {
        let oracle = LexiconOracle::new();
        let result = oracle.classify("Apple shares surge after earnings beat estimates");
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!(result.confidence > 0.5 && result.confidence < 1.0);
    }

    #[test]
    fn test_negative_headline() {
        let oracle = LexiconOracle::new();
        let result = oracle.classify("Stock plunges as regulators open fraud probe");
        assert_eq!(result.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_unmatched_text_is_low_confidence_neutral() {
        let oracle = LexiconOracle::new();
        let result = oracle.classify("Company to hold annual shareholder meeting on Tuesday");
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.confidence, UNMATCHED_CONFIDENCE);
        assert!(result.confidence < DOMINANCE_CONFIDENCE);
    }

    #[test]
    fn test_balanced_terms_are_confident_neutral() {
        let oracle = LexiconOracle::new();
        // +0.5 and -0.5 cancel, so the text is neutral on evidence rather than silence
        let result = oracle.classify("gain offset by weak guidance");
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert!(result.confidence > UNMATCHED_CONFIDENCE);
    }

    #[test]
    fn test_negation_flips() {
        let oracle = LexiconOracle::new();
        assert!(oracle.score("analysts are bullish") > 0.0);
        assert!(oracle.score("analysts are not bullish") < 0.0);
    }

    #[test]
    fn test_intensifier_scales() {
        let oracle = LexiconOracle::new();
        let plain = oracle.score("revenue growth");
        let boosted = oracle.score("revenue growth very strong");
        let damped = oracle.score("slightly weak quarter");
        assert!(boosted > plain);
        assert!(damped > -0.5 && damped < 0.0);
    }

    #[test]
    fn test_inflections_and_punctuation() {
        let oracle = LexiconOracle::new();
        assert!(oracle.score("Shares soared!") > 0.0);
        assert!(oracle.score("(falling)") < 0.0);
        assert!(oracle.score("Tumbles,") < 0.0);
    }

    #[test]
    fn test_long_input_truncated() {
        let oracle = LexiconOracle::new();
        let mut text = "filler ".repeat(MAX_TOKENS);
        text.push_str("crash crash crash");
        assert_eq!(oracle.score(&text), 0.0);
    }

    #[test]
    fn test_confidence_grows_with_magnitude() {
        let oracle = LexiconOracle::new();
        let mild = oracle.classify("slightly positive");
        let strong = oracle.classify("extremely bullish rally");
        assert!(strong.confidence > mild.confidence);
    }
}
