use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tracing::debug;

use super::{NewsError, NewsSource};
use crate::types::{Headline, Ticker};

pub const GOOGLE_NEWS_RSS: &str = "https://news.google.com/rss/search";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Google News RSS search for `"<TICKER> stock"`.
#[derive(Debug, Clone)]
pub struct GoogleNewsClient {
    client: Client,
    feed_url: String,
}

impl GoogleNewsClient {
    pub fn with_feed_url(feed_url: &str, timeout: std::time::Duration) -> Result<Self, NewsError> {
        let client = Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?;
        Ok(Self {
            client,
            feed_url: feed_url.to_string(),
        })
    }
}

#[async_trait]
impl NewsSource for GoogleNewsClient {
    async fn fetch(&self, ticker: &Ticker, window_hours: f64) -> Result<Vec<Headline>, NewsError> {
        let body = self
            .client
            .get(&self.feed_url)
            .query(&[
                ("q", format!("{} stock", ticker)),
                ("hl", "en-US".to_string()),
                ("gl", "US".to_string()),
                ("ceid", "US:en".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let headlines = parse_feed(&body, Utc::now(), window_hours)?;
        debug!("Fetched {} headlines for {} within {}h", headlines.len(), ticker, window_hours);
        Ok(headlines)
    }
}

/// Parses an RSS document, keeping dated items newer than the window cutoff,
/// newest first.
pub fn parse_feed(bytes: &[u8], now: DateTime<Utc>, window_hours: f64) -> Result<Vec<Headline>, NewsError> {
    let channel = rss::Channel::read_from(bytes)?;
    let cutoff = now - Duration::milliseconds((window_hours * 3_600_000.0) as i64);

    let mut headlines: Vec<Headline> = channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?.trim().to_string();
            let published_at = DateTime::parse_from_rfc2822(item.pub_date()?)
                .ok()?
                .with_timezone(&Utc);
            (published_at >= cutoff && !title.is_empty()).then_some(Headline { title, published_at })
        })
        .collect();

    headlines.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    Ok(headlines)
}
