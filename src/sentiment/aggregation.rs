use chrono::{DateTime, Utc};
use std::fmt;

use crate::types::{EnrichedArticle, SentimentDistribution, SentimentLabel};

pub const WEAK_THRESHOLD: f64 = 0.10;
pub const MODERATE_THRESHOLD: f64 = 0.30;
pub const STRONG_THRESHOLD: f64 = 0.55;

/// A moderate signal is upgraded when the dominant side holds this share...
pub const DOMINANCE_SHARE: f64 = 0.70;
/// ...and the mean classifier confidence is at least this high.
pub const DOMINANCE_CONFIDENCE: f64 = 0.65;

/// Exponential decay of an article's influence with age.
/// Timestamps in the future count as fresh.
pub fn time_weight(published_at: DateTime<Utc>, now: DateTime<Utc>, decay_hours: f64) -> f64 {
    let age_hours = ((now - published_at).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
    (-age_hours / decay_hours).exp()
}

/// Σ(polarity · confidence · weight) / Σ(weight), in [-1, 1].
pub fn weighted_score(articles: &[EnrichedArticle]) -> f64 {
    let total_weight: f64 = articles.iter().map(|a| a.time_weight).sum();
    if articles.is_empty() || total_weight <= 0.0 {
        return 0.0;
    }

    let numerator: f64 = articles
        .iter()
        .map(|a| f64::from(a.sentiment_polarity) * a.sentiment_confidence * a.time_weight)
        .sum();

    (numerator / total_weight).clamp(-1.0, 1.0)
}

pub fn average_confidence(articles: &[EnrichedArticle]) -> f64 {
    if articles.is_empty() {
        return 0.0;
    }
    articles.iter().map(|a| a.sentiment_confidence).sum::<f64>() / articles.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalTier {
    Mixed,
    Weak,
    Moderate,
    Strong,
}

impl SignalTier {
    pub fn from_magnitude(magnitude: f64) -> Self {
        if magnitude >= STRONG_THRESHOLD {
            SignalTier::Strong
        } else if magnitude >= MODERATE_THRESHOLD {
            SignalTier::Moderate
        } else if magnitude >= WEAK_THRESHOLD {
            SignalTier::Weak
        } else {
            SignalTier::Mixed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalTier::Mixed => "mixed",
            SignalTier::Weak => "weak",
            SignalTier::Moderate => "moderate",
            SignalTier::Strong => "strong",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDirection {
    Positive,
    Negative,
}

impl SignalDirection {
    /// Zero counts as negative.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            SignalDirection::Positive
        } else {
            SignalDirection::Negative
        }
    }

    pub fn label(&self) -> SentimentLabel {
        match self {
            SignalDirection::Positive => SentimentLabel::Positive,
            SignalDirection::Negative => SentimentLabel::Negative,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::Positive => "positive",
            SignalDirection::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalStrength {
    pub tier: SignalTier,
    pub direction: SignalDirection,
}

impl SignalStrength {
    /// Tier from the score magnitude, with a moderate signal promoted to
    /// strong when one side dominates with confident classifications.
    pub fn classify(score: f64, distribution: &SentimentDistribution, avg_confidence: f64) -> Self {
        let direction = SignalDirection::from_score(score);
        let mut tier = SignalTier::from_magnitude(score.abs());

        if tier == SignalTier::Moderate
            && distribution.share(direction.label()) >= DOMINANCE_SHARE
            && avg_confidence >= DOMINANCE_CONFIDENCE
        {
            tier = SignalTier::Strong;
        }

        Self { tier, direction }
    }

    pub fn none() -> Self {
        Self::classify(0.0, &SentimentDistribution::default(), 0.0)
    }
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.tier.as_str(), self.direction.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn article(label: SentimentLabel, confidence: f64, weight: f64) -> EnrichedArticle {
        EnrichedArticle {
            title: "headline".into(),
            published_at: Utc::now(),
            sentiment_label: label,
            sentiment_confidence: confidence,
            sentiment_polarity: label.polarity(),
            time_weight: weight,
        }
    }

    #[test]
    fn test_time_weight_decay() {
        let now = Utc::now();
        assert!((time_weight(now, now, 48.0) - 1.0).abs() < 1e-12);
        let w = time_weight(now - Duration::hours(48), now, 48.0);
        assert!((w - (-1.0f64).exp()).abs() < 1e-9);
        assert_eq!(time_weight(now + Duration::hours(5), now, 48.0), 1.0);
    }

    #[test]
    fn test_weighted_score_empty() {
        assert_eq!(weighted_score(&[]), 0.0);
        assert_eq!(SignalStrength::none().to_string(), "mixed_negative");
    }

    #[test]
    fn test_weighted_score_bounds() {
        let all_pos = vec![article(SentimentLabel::Positive, 1.0, 0.3); 4];
        assert_eq!(weighted_score(&all_pos), 1.0);
        let all_neg = vec![article(SentimentLabel::Negative, 1.0, 0.7); 2];
        assert_eq!(weighted_score(&all_neg), -1.0);

        let mixed = vec![
            article(SentimentLabel::Positive, 0.9, 1.0),
            article(SentimentLabel::Negative, 0.9, 1.0),
            article(SentimentLabel::Neutral, 0.8, 1.0),
        ];
        assert_eq!(weighted_score(&mixed), 0.0);
    }

    #[test]
    fn test_tiers() {
        let dist = SentimentDistribution { positive: 1, neutral: 1, negative: 1 };
        let s = |score| SignalStrength::classify(score, &dist, 0.9).to_string();

        assert_eq!(s(0.05), "mixed_positive");
        assert_eq!(s(-0.05), "mixed_negative");
        assert_eq!(s(0.10), "weak_positive");
        assert_eq!(s(-0.29), "weak_negative");
        assert_eq!(s(0.30), "moderate_positive");
        assert_eq!(s(0.55), "strong_positive");
        assert_eq!(s(-0.8), "strong_negative");
    }

    #[test]
    fn test_moderate_upgrade() {
        let dominant = SentimentDistribution { positive: 7, neutral: 2, negative: 1 };
        let upgraded = SignalStrength::classify(0.4, &dominant, 0.65);
        assert_eq!(upgraded.tier, SignalTier::Strong);

        let low_conf = SignalStrength::classify(0.4, &dominant, 0.6);
        assert_eq!(low_conf.tier, SignalTier::Moderate);

        // weak signals are never promoted
        let weak = SignalStrength::classify(0.2, &dominant, 0.99);
        assert_eq!(weak.tier, SignalTier::Weak);

        // dominance must be on the side the score points to
        let against = SignalStrength::classify(-0.4, &dominant, 0.9);
        assert_eq!(against.to_string(), "moderate_negative");
    }
}
