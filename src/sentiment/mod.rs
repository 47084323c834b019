pub mod aggregation;
pub mod lexicon;

pub use aggregation::*;
pub use lexicon::LexiconOracle;

use crate::types::SentimentLabel;

/// Label and confidence for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    pub confidence: f64,
}

impl Classification {
    pub fn new(label: SentimentLabel, confidence: f64) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Three-way financial sentiment classifier.
///
/// Built once at startup and shared; implementations must be safe to call
/// from several requests at a time.
pub trait SentimentOracle: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, text: &str) -> Classification;
}
