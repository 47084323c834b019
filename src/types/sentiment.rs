use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn polarity(&self) -> i8 {
        match self {
            SentimentLabel::Positive => 1,
            SentimentLabel::Neutral => 0,
            SentimentLabel::Negative => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedArticle {
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub sentiment_label: SentimentLabel,
    pub sentiment_confidence: f64,
    pub sentiment_polarity: i8,
    pub time_weight: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentDistribution {
    pub fn from_articles(articles: &[EnrichedArticle]) -> Self {
        let mut dist = Self::default();
        for article in articles {
            match article.sentiment_label {
                SentimentLabel::Positive => dist.positive += 1,
                SentimentLabel::Neutral => dist.neutral += 1,
                SentimentLabel::Negative => dist.negative += 1,
            }
        }
        dist
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    pub fn share(&self, label: SentimentLabel) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let count = match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Negative => self.negative,
        };
        count as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextHeadline {
    pub title: String,
    pub published: DateTime<Utc>,
    pub sentiment: SentimentLabel,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub time_window_hours: f64,
    pub articles_analyzed: usize,
    pub sentiment_distribution: SentimentDistribution,
    pub weighted_sentiment_score: f64,
    pub average_confidence: f64,
    pub signal_strength: String,
    pub context_headlines: Vec<ContextHeadline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SentimentReport {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
