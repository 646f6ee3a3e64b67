//! Upstream data feeds
//!
//! Four HTTP sources: live snapshots, bet365 event links, ended matches and
//! head-to-head history. Every failure is absorbed here: a feed that errors
//! yields an empty result for the cycle, and a malformed record is skipped
//! without discarding its batch.

mod parse;

pub use parse::{parse_ended, parse_links, parse_live, LinkMap};

use crate::config::FeedConfig;
use crate::error::{BotError, Result};
use crate::h2h::{self, HeadToHeadMetrics};
use crate::types::{FinishedMatch, MatchSnapshot};
use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchFeed: Send + Sync {
    /// In-progress matches; empty on failure
    async fn live_matches(&self) -> Vec<MatchSnapshot>;

    /// Matches started on the reporting day or later; empty on failure
    async fn ended_matches(&self) -> Vec<FinishedMatch>;

    /// Head-to-head history for the ordered pair; `None` when unavailable
    async fn head_to_head(&self, player1: &str, player2: &str) -> Option<HeadToHeadMetrics>;

    /// bet365 event ids keyed by lower-cased (home, away) player; empty on failure
    async fn bet365_links(&self) -> LinkMap;
}

/// HTTP implementation of every feed
#[derive(Clone)]
pub struct HttpFeed {
    http: Client,
    config: FeedConfig,
    /// Reporting-day offset for the ended-match date filter
    offset: FixedOffset,
}

impl HttpFeed {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config,
            offset: Utc.fix(),
        })
    }

    /// Filter ended matches on the reporting day of `offset` instead of UTC
    pub fn with_reporting_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn h2h_url(&self, player1: &str, player2: &str) -> String {
        self.config
            .h2h_url
            .replace("{player1}", player1)
            .replace("{player2}", player2)
    }

    async fn json(response: Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Api(format!("{}: {}", status, body.chars().take(200).collect::<String>())));
        }
        Ok(response.json().await?)
    }

    async fn fetch_live(&self) -> Result<Vec<MatchSnapshot>> {
        let response = self.http.get(&self.config.live_url).send().await?;
        Ok(parse_live(&Self::json(response).await?))
    }

    async fn fetch_links(&self) -> Result<LinkMap> {
        let request = self
            .http
            .post(&self.config.links_url)
            .header("Accept", "application/json")
            .json(&serde_json::json!({}));
        let response = self.authorized(request).send().await?;
        Ok(parse_links(&Self::json(response).await?))
    }

    async fn fetch_ended(&self) -> Result<Vec<FinishedMatch>> {
        let limit = self.config.ended_page_limit.to_string();
        let request = self
            .http
            .get(&self.config.ended_url)
            .header("Accept", "application/json")
            .query(&[
                ("page", "1"),
                ("limit", limit.as_str()),
                ("sport", "esoccer"),
                ("status", "ended"),
            ]);
        let response = self.authorized(request).send().await?;
        let today = Utc::now().with_timezone(&self.offset).date_naive();
        Ok(parse_ended(&Self::json(response).await?, today, self.offset))
    }

    async fn fetch_h2h(&self, player1: &str, player2: &str) -> Result<Option<HeadToHeadMetrics>> {
        let url = self.h2h_url(player1, player2);
        let response = self.http.get(&url).send().await?;
        Ok(h2h::from_response(&Self::json(response).await?))
    }
}

#[async_trait]
impl MatchFeed for HttpFeed {
    async fn live_matches(&self) -> Vec<MatchSnapshot> {
        match self.fetch_live().await {
            Ok(matches) => {
                info!("🎮 {} live matches", matches.len());
                matches
            }
            Err(e) => {
                warn!("Live feed failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn ended_matches(&self) -> Vec<FinishedMatch> {
        match self.fetch_ended().await {
            Ok(matches) => {
                debug!("{} ended matches (today+)", matches.len());
                matches
            }
            Err(e) => {
                warn!("Ended feed failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn head_to_head(&self, player1: &str, player2: &str) -> Option<HeadToHeadMetrics> {
        match self.fetch_h2h(player1, player2).await {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!("H2H {} vs {} failed: {}", player1, player2, e);
                None
            }
        }
    }

    async fn bet365_links(&self) -> LinkMap {
        match self.fetch_links().await {
            Ok(links) => {
                debug!("{} bet365 links", links.len());
                links
            }
            Err(e) => {
                warn!("Links feed failed: {}", e);
                LinkMap::new()
            }
        }
    }
}
