//! Test utilities for the must-play crawler
//!
//! Provides listing/detail page fixtures shaped like the live markup and an
//! in-memory [`PageFetcher`] so crawl tests run offline and deterministically.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::infrastructure::http_client::{FetchError, FetchedPage, PageFetcher, log_fetch_outcome};

/// One listing card; `None` renders the sub-element empty (or the link
/// attribute missing entirely)
#[derive(Debug, Clone)]
pub struct CardFixture {
    pub must_play: bool,
    pub rank: Option<String>,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub score: Option<String>,
    pub href: Option<String>,
}

impl CardFixture {
    pub fn must_play(rank: u32, title: &str) -> Self {
        let slug = title
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        Self {
            must_play: true,
            rank: Some(format!("{rank}.")),
            title: Some(title.to_string()),
            release_date: Some("Jan 02, 2020".to_string()),
            score: Some("95".to_string()),
            href: Some(format!("/game/{slug}/")),
        }
    }

    pub fn regular(rank: u32, title: &str) -> Self {
        Self {
            must_play: false,
            ..Self::must_play(rank, title)
        }
    }

    pub fn to_html(&self) -> String {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let href = self
            .href
            .as_ref()
            .map(|h| format!(r#" href="{h}""#))
            .unwrap_or_default();
        let marker = if self.must_play {
            r#"<div class="c-finderProductCard_badge"><img alt="must-play" src="/must-play.svg"></div>"#
        } else {
            ""
        };
        format!(
            r#"<a class="c-finderProductCard_container"{href}>
  <div class="c-finderProductCard_titleHeading"><span>{rank}</span><span>{title}</span></div>
  <div class="c-finderProductCard_meta"><span>{date}</span><span>Rated M</span></div>
  <div class="c-siteReviewScore"><span>{score}</span></div>
  {marker}
</a>"#,
            rank = text(&self.rank),
            title = text(&self.title),
            date = text(&self.release_date),
            score = text(&self.score),
        )
    }
}

/// Full listing document around the given cards
pub fn listing_page(cards: &[CardFixture]) -> String {
    let cards: String = cards.iter().map(CardFixture::to_html).collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>Best Games</title></head>
<body><div class="c-productListings">{cards}</div></body></html>"#
    )
}

/// `count` must-play cards titled "Game N", ranked from `first_rank` upwards
pub fn must_play_page(first_rank: u32, count: u32) -> String {
    let cards: Vec<CardFixture> = (first_rank..first_rank + count)
        .map(|rank| CardFixture::must_play(rank, &format!("Game {rank}")))
        .collect();
    listing_page(&cards)
}

/// Detail document, optionally carrying a supplemental count
pub fn detail_page(count: Option<u32>) -> String {
    let reviews = count.map_or_else(String::new, |n| {
        format!(r#"<a href="/critic-reviews/">Based on <span>{n}</span> Critic Reviews</a>"#)
    });
    format!(
        r#"<!DOCTYPE html><html><body>
<h1>Some Game</h1>
<div class="c-productScoreInfo">{reviews}</div>
<p>Released on Jan 02, 2020</p>
</body></html>"#
    )
}

#[derive(Debug, Clone)]
enum StubResponse {
    Body(String),
    Status(u16),
    Transport(String),
}

/// In-memory fetcher. Unknown URLs answer HTTP 404.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: HashMap<String, StubResponse>,
    /// URL and (tokio clock) start time of every fetch
    requested: Mutex<Vec<(String, Instant)>>,
    latency: Option<Duration>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), StubResponse::Body(body.into()));
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, code: u16) -> Self {
        self.responses.insert(url.into(), StubResponse::Status(code));
        self
    }

    pub fn with_transport_error(mut self, url: impl Into<String>, cause: &str) -> Self {
        self.responses
            .insert(url.into(), StubResponse::Transport(cause.to_string()));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// URLs in the order fetches were issued
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|log| log.iter().map(|(url, _)| url.clone()).collect())
            .unwrap_or_default()
    }

    /// Start times of the issued fetches, in issue order
    pub fn requested_at(&self) -> Vec<Instant> {
        self.requested
            .lock()
            .map(|log| log.iter().map(|(_, at)| *at).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedPage, FetchError> {
        let started = Instant::now();
        if let Ok(mut log) = self.requested.lock() {
            log.push((url.to_string(), started));
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let outcome = match self.responses.get(url) {
            Some(StubResponse::Body(body)) => Ok(FetchedPage {
                url: url.to_string(),
                body: body.clone(),
                elapsed: started.elapsed(),
                byte_size: body.len(),
            }),
            Some(StubResponse::Status(code)) => Err(FetchError::HttpStatus { code: *code }),
            Some(StubResponse::Transport(cause)) => Err(FetchError::Transport {
                cause: cause.clone(),
            }),
            None => Err(FetchError::HttpStatus { code: 404 }),
        };
        log_fetch_outcome(url, started.elapsed(), &outcome);
        outcome
    }
}
