use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::market::NewsSource;
use crate::sentiment::{average_confidence, time_weight, weighted_score, SentimentOracle, SignalStrength};
use crate::types::{
    ContextHeadline, EnrichedArticle, Headline, SentimentDistribution, SentimentReport, Ticker,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentSettings {
    pub time_window_hours: f64,
    pub decay_hours: f64,
    pub max_articles: usize,
    pub headline_count: usize,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            time_window_hours: 72.0,
            decay_hours: 48.0,
            max_articles: 25,
            headline_count: 5,
        }
    }
}

/// Fetches recent headlines and folds their classifications into one signal.
#[derive(Clone)]
pub struct SentimentPipeline {
    news: Arc<dyn NewsSource>,
    oracle: Arc<dyn SentimentOracle>,
    settings: SentimentSettings,
}

impl SentimentPipeline {
    pub fn new(news: Arc<dyn NewsSource>, oracle: Arc<dyn SentimentOracle>, settings: SentimentSettings) -> Self {
        Self { news, oracle, settings }
    }

    pub fn oracle_name(&self) -> &'static str {
        self.oracle.name()
    }

    /// Never fails: a news outage yields a degraded report carrying the error.
    pub async fn run(&self, ticker: &Ticker) -> SentimentReport {
        let now = Utc::now();
        match self.news.fetch(ticker, self.settings.time_window_hours).await {
            Ok(headlines) => self.analyze(ticker, headlines, now),
            Err(e) => {
                warn!("{}: news fetch failed, returning degraded sentiment: {}", ticker, e);
                self.degraded(ticker, now, e.to_string())
            }
        }
    }

    pub fn analyze(&self, ticker: &Ticker, mut headlines: Vec<Headline>, now: DateTime<Utc>) -> SentimentReport {
        let window = Duration::milliseconds((self.settings.time_window_hours * 3_600_000.0) as i64);
        let cutoff = now - window;

        headlines.retain(|h| h.published_at >= cutoff);
        headlines.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        headlines.truncate(self.settings.max_articles);

        let articles: Vec<EnrichedArticle> = headlines
            .into_iter()
            .map(|h| self.enrich(h, now))
            .collect();

        let distribution = SentimentDistribution::from_articles(&articles);
        let score = weighted_score(&articles);
        let avg_confidence = average_confidence(&articles);
        let signal = SignalStrength::classify(score, &distribution, avg_confidence);

        info!(
            "{}: {} articles, score={:.3}, signal={}",
            ticker,
            articles.len(),
            score,
            signal
        );

        let context_headlines = articles
            .iter()
            .take(self.settings.headline_count)
            .map(|a| ContextHeadline {
                title: a.title.clone(),
                published: a.published_at,
                sentiment: a.sentiment_label,
                confidence: a.sentiment_confidence,
            })
            .collect();

        SentimentReport {
            ticker: ticker.to_string(),
            timestamp: now,
            time_window_hours: self.settings.time_window_hours,
            articles_analyzed: articles.len(),
            sentiment_distribution: distribution,
            weighted_sentiment_score: score,
            average_confidence: avg_confidence,
            signal_strength: signal.to_string(),
            context_headlines,
            error: None,
        }
    }

    fn enrich(&self, headline: Headline, now: DateTime<Utc>) -> EnrichedArticle {
        let classification = self.oracle.classify(&headline.title);
        EnrichedArticle {
            time_weight: time_weight(headline.published_at, now, self.settings.decay_hours),
            title: headline.title,
            published_at: headline.published_at,
            sentiment_label: classification.label,
            sentiment_confidence: classification.confidence,
            sentiment_polarity: classification.label.polarity(),
        }
    }

    fn degraded(&self, ticker: &Ticker, now: DateTime<Utc>, error: String) -> SentimentReport {
        SentimentReport {
            ticker: ticker.to_string(),
            timestamp: now,
            time_window_hours: self.settings.time_window_hours,
            articles_analyzed: 0,
            sentiment_distribution: SentimentDistribution::default(),
            weighted_sentiment_score: 0.0,
            average_confidence: 0.0,
            signal_strength: SignalStrength::none().to_string(),
            context_headlines: Vec::new(),
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{news::parse_feed, GoogleNewsClient, MockNewsSource};
    use crate::testing::{ScriptedOracle, StaticNews};
    use crate::types::SentimentLabel;

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    fn headline(title: &str, now: DateTime<Utc>, hours_ago: i64) -> Headline {
        Headline {
            title: title.to_string(),
            published_at: now - Duration::hours(hours_ago),
        }
    }

    fn pipeline(oracle: ScriptedOracle, headlines: Vec<Headline>) -> SentimentPipeline {
        SentimentPipeline::new(
            Arc::new(StaticNews(headlines)),
            Arc::new(oracle),
            SentimentSettings::default(),
        )
    }

    #[test]
    fn test_three_positive_articles_is_strong() {
        let now = Utc::now();
        let oracle = ScriptedOracle::default()
            .with("a", SentimentLabel::Positive, 0.9)
            .with("b", SentimentLabel::Positive, 0.8)
            .with("c", SentimentLabel::Positive, 0.7);
        let headlines = vec![headline("c", now, 3), headline("a", now, 1), headline("b", now, 2)];

        let report = pipeline(oracle, Vec::new()).analyze(&ticker(), headlines, now);

        assert_eq!(report.articles_analyzed, 3);
        assert!(report.weighted_sentiment_score > 0.55);
        assert_eq!(report.signal_strength, "strong_positive");
        assert_eq!(report.sentiment_distribution.positive, 3);
        assert!((report.average_confidence - 0.8).abs() < 1e-12);
        // newest first
        assert_eq!(report.context_headlines[0].title, "a");
        assert_eq!(report.context_headlines[2].title, "c");
    }

    #[test]
    fn test_no_articles() {
        let report = pipeline(ScriptedOracle::default(), Vec::new()).analyze(&ticker(), Vec::new(), Utc::now());
        assert_eq!(report.articles_analyzed, 0);
        assert_eq!(report.weighted_sentiment_score, 0.0);
        assert_eq!(report.signal_strength, "mixed_negative");
        assert!(!report.is_degraded());
    }

    #[test]
    fn test_window_and_caps() {
        let now = Utc::now();
        let mut headlines: Vec<Headline> = (0..40).map(|i| headline(&format!("h{}", i), now, i)).collect();
        headlines.push(headline("ancient", now, 100));

        let report = pipeline(ScriptedOracle::default(), Vec::new()).analyze(&ticker(), headlines, now);

        assert_eq!(report.articles_analyzed, 25);
        assert_eq!(report.context_headlines.len(), 5);
        assert_eq!(report.context_headlines[0].title, "h0");
        assert_eq!(report.sentiment_distribution.neutral, 25);
    }

    #[tokio::test]
    async fn test_run_uses_news_source() {
        let now = Utc::now();
        let oracle = ScriptedOracle::default().with("down", SentimentLabel::Negative, 0.9);
        let report = pipeline(oracle, vec![headline("down", now, 1)]).run(&ticker()).await;

        assert_eq!(report.ticker, "AAPL");
        assert_eq!(report.sentiment_distribution.negative, 1);
        assert!(report.weighted_sentiment_score < 0.0);
    }

    #[tokio::test]
    async fn test_unparseable_feed_degrades() {
        let err = parse_feed(b"<html>", Utc::now(), 72.0).unwrap_err();
        let mut news = MockNewsSource::new();
        news.expect_fetch()
            .withf(|t, hours| t.as_str() == "AAPL" && *hours == 72.0)
            .times(1)
            .return_once(move |_, _| Err(err));

        let pipeline = SentimentPipeline::new(
            Arc::new(news),
            Arc::new(ScriptedOracle::default()),
            SentimentSettings::default(),
        );
        let report = pipeline.run(&ticker()).await;

        assert!(report.is_degraded());
        assert_eq!(report.articles_analyzed, 0);
        assert_eq!(report.signal_strength, "mixed_negative");

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_unreachable_feed_degrades() {
        // nothing listens on port 1, so the request fails before any body arrives
        let news = GoogleNewsClient::with_feed_url("http://127.0.0.1:1/rss/search", std::time::Duration::from_secs(2))
            .unwrap();
        let pipeline = SentimentPipeline::new(
            Arc::new(news),
            Arc::new(ScriptedOracle::default()),
            SentimentSettings::default(),
        );
        let report = pipeline.run(&ticker()).await;

        assert!(report.is_degraded());
        assert!(report.error.as_deref().unwrap().starts_with("news feed request failed"));
        assert_eq!(report.articles_analyzed, 0);
        assert!(report.context_headlines.is_empty());
        assert_eq!(report.weighted_sentiment_score, 0.0);
    }
}
