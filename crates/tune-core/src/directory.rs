//! radio-browser.info directory client.
//!
//! Category listings walk a shuffled list of mirrors one at a time and take
//! the first mirror that answers; search goes to a single fixed mirror.
//! Both run the same filter / rank / map pipeline over the raw records.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, warn};
use tune_proto::config::DirectoryConfig;
use tune_proto::protocol::Station;

use crate::error::DirectoryError;

/// Lowest bitrate (kbps) a listed station may have.
pub const MIN_BITRATE: i64 = 64;

/// Minimal HTTP surface the directory client needs.
#[async_trait]
pub trait DirectoryTransport: Send + Sync {
    /// GET `url` and return the body of a successful response.
    async fn get_text(&self, url: &Url) -> Result<String, DirectoryError>;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DirectoryTransport for ReqwestTransport {
    async fn get_text(&self, url: &Url) -> Result<String, DirectoryError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// A station record as the directory returns it.  Only the fields the
/// pipeline reads are kept; everything may be missing or null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryStation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url_resolved: Option<String>,
    #[serde(default)]
    pub broken: Option<bool>,
    #[serde(default)]
    pub bitrate: Option<i64>,
    #[serde(default)]
    pub votes: Option<i64>,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl DirectoryStation {
    fn is_listable(&self) -> bool {
        let has = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.is_empty());
        has(&self.url_resolved)
            && has(&self.name)
            && !self.broken.unwrap_or(false)
            && self.bitrate.unwrap_or(0) >= MIN_BITRATE
            && self.votes.unwrap_or(0) > 0
    }

    fn into_station(self) -> Station {
        Station {
            name: self.name.unwrap_or_default(),
            url: self.url_resolved.unwrap_or_default(),
            bitrate: self.bitrate.and_then(|b| u32::try_from(b).ok()),
            codec: self.codec.unwrap_or_default(),
            votes: self.votes.unwrap_or(0),
            favicon: self.favicon.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
        }
    }
}

/// Filter out unplayable or unpopular records, rank by votes then bitrate
/// (both descending, stable otherwise) and map to `Station`.
pub fn rank_stations(raw: Vec<DirectoryStation>) -> Vec<Station> {
    let mut kept: Vec<DirectoryStation> = raw.into_iter().filter(|s| s.is_listable()).collect();
    kept.sort_by(|a, b| {
        b.votes
            .unwrap_or(0)
            .cmp(&a.votes.unwrap_or(0))
            .then(b.bitrate.unwrap_or(0).cmp(&a.bitrate.unwrap_or(0)))
    });
    kept.into_iter().map(DirectoryStation::into_station).collect()
}

pub fn parse_station_list(body: &str) -> Result<Vec<Station>, DirectoryError> {
    let raw: Vec<DirectoryStation> = serde_json::from_str(body)?;
    Ok(rank_stations(raw))
}

#[derive(Debug, Deserialize)]
struct ServerEntry {
    #[serde(default)]
    name: String,
}

pub struct DirectoryClient {
    transport: Arc<dyn DirectoryTransport>,
    registry_url: String,
    fallback_mirrors: Vec<String>,
    search_mirror: String,
    limit: u32,
}

impl DirectoryClient {
    /// Client with the production `reqwest` transport.
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let transport = ReqwestTransport::new(
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: &DirectoryConfig, transport: Arc<dyn DirectoryTransport>) -> Self {
        Self {
            transport,
            registry_url: config.registry_url.clone(),
            fallback_mirrors: config.fallback_mirrors.clone(),
            search_mirror: config.search_mirror.clone(),
            limit: config.limit,
        }
    }

    // ── mirrors ───────────────────────────────────────────────────────────────

    /// Candidate mirrors in a fresh random order.  Falls back to the
    /// configured list when the registry cannot be used.
    pub async fn resolve_mirrors(&self) -> Vec<String> {
        let mut candidates = match self.fetch_registry().await {
            Ok(mirrors) if !mirrors.is_empty() => mirrors,
            Ok(_) => {
                warn!("directory: registry returned no servers, using fallback list");
                self.fallback_mirrors.clone()
            }
            Err(e) => {
                warn!("directory: registry unavailable ({}), using fallback list", e);
                self.fallback_mirrors.clone()
            }
        };
        candidates.shuffle(&mut rand::thread_rng());
        candidates
    }

    async fn fetch_registry(&self) -> Result<Vec<String>, DirectoryError> {
        let url = parse_url(&self.registry_url)?;
        let body = self.transport.get_text(&url).await?;
        let entries: Vec<ServerEntry> = serde_json::from_str(&body)?;
        let mut mirrors: Vec<String> = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = entry.name.trim();
            if name.is_empty() {
                continue;
            }
            let mirror = format!("https://{}", name);
            if !mirrors.contains(&mirror) {
                mirrors.push(mirror);
            }
        }
        debug!("directory: registry lists {} mirrors", mirrors.len());
        Ok(mirrors)
    }

    // ── category ──────────────────────────────────────────────────────────────

    /// Stations tagged exactly `category`.  Empty when every mirror fails.
    pub async fn list_by_category(&self, category: &str) -> Vec<Station> {
        match self.try_list_by_category(category).await {
            Ok(stations) => stations,
            Err(e) => {
                warn!("directory: {} for category '{}'", e, category);
                Vec::new()
            }
        }
    }

    /// Like `list_by_category` but reports mirror exhaustion as
    /// `DirectoryError::Exhausted` instead of an empty list.
    pub async fn try_list_by_category(&self, category: &str) -> Result<Vec<Station>, DirectoryError> {
        let mirrors = self.resolve_mirrors().await;
        self.list_by_category_on(&mirrors, category).await
    }

    /// Walk `mirrors` in order, one request at a time.
    pub async fn list_by_category_on(
        &self,
        mirrors: &[String],
        category: &str,
    ) -> Result<Vec<Station>, DirectoryError> {
        for mirror in mirrors {
            let url = match self.category_url(mirror, category) {
                Ok(u) => u,
                Err(e) => {
                    warn!("directory: skipping mirror '{}': {}", mirror, e);
                    continue;
                }
            };
            info!("directory: trying mirror {}", mirror);
            match self.fetch_stations(&url).await {
                Ok(stations) => {
                    info!(
                        "directory: {} stations for '{}' from {}",
                        stations.len(),
                        category,
                        mirror
                    );
                    return Ok(stations);
                }
                Err(e) => {
                    let err = DirectoryError::unreachable(mirror.as_str(), e);
                    warn!("directory: {}", err);
                }
            }
        }
        warn!("directory: all mirrors failed for '{}'", category);
        Err(DirectoryError::Exhausted {
            attempted: mirrors.len(),
        })
    }

    pub fn category_url(&self, mirror: &str, category: &str) -> Result<Url, DirectoryError> {
        let mut url = parse_url(mirror)?;
        url.path_segments_mut()
            .map_err(|_| DirectoryError::InvalidUrl(mirror.to_string()))?
            .pop_if_empty()
            .extend(["json", "stations", "bytagexact", &category.to_lowercase()]);
        url.query_pairs_mut()
            .append_pair("limit", &self.limit.to_string())
            .append_pair("order", "votes")
            .append_pair("reverse", "true")
            .append_pair("hidebroken", "true")
            .append_pair("offset", "0")
            .append_pair("codec", "mp3,aac")
            .append_pair("has_extended_info", "true");
        Ok(url)
    }

    // ── search ────────────────────────────────────────────────────────────────

    /// Name search on the fixed search mirror.  Empty on failure.
    pub async fn search(&self, term: &str) -> Vec<Station> {
        match self.try_search(term).await {
            Ok(stations) => stations,
            Err(e) => {
                warn!("directory: search '{}' failed: {}", term, e);
                Vec::new()
            }
        }
    }

    /// Search without fallback; a failed mirror is reported as `Exhausted`.
    pub async fn try_search(&self, term: &str) -> Result<Vec<Station>, DirectoryError> {
        let url = self.search_url(term)?;
        debug!("directory: search {}", url);
        match self.fetch_stations(&url).await {
            Ok(stations) => {
                info!("directory: {} stations match '{}'", stations.len(), term);
                Ok(stations)
            }
            Err(e) => {
                warn!("directory: {}", DirectoryError::unreachable(self.search_mirror.as_str(), e));
                Err(DirectoryError::Exhausted { attempted: 1 })
            }
        }
    }

    pub fn search_url(&self, term: &str) -> Result<Url, DirectoryError> {
        let mut url = parse_url(&self.search_mirror)?;
        url.path_segments_mut()
            .map_err(|_| DirectoryError::InvalidUrl(self.search_mirror.clone()))?
            .pop_if_empty()
            .extend(["json", "stations", "search"]);
        url.query_pairs_mut()
            .append_pair("name", term)
            .append_pair("limit", &self.limit.to_string());
        Ok(url)
    }

    async fn fetch_stations(&self, url: &Url) -> Result<Vec<Station>, DirectoryError> {
        let body = self.transport.get_text(url).await?;
        parse_station_list(&body)
    }
}

fn parse_url(raw: &str) -> Result<Url, DirectoryError> {
    Url::parse(raw).map_err(|e| DirectoryError::InvalidUrl(format!("{}: {}", raw, e)))
}
