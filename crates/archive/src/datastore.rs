//! EUMETSAT Data Store REST client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, Response, Url};
use sat_common::TimeWindow;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::error::{ArchiveError, ArchiveResult};
use crate::{Archive, ByteStream, CandidateProduct};

/// Refresh tokens this long before they expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

const SEARCH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// API consumer key and secret.
#[derive(Clone)]
pub struct Credentials {
    consumer_key: String,
    consumer_secret: String,
}

impl Credentials {
    /// Both values must be present and non-blank.
    pub fn new(consumer_key: Option<String>, consumer_secret: Option<String>) -> ArchiveResult<Self> {
        let key = consumer_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ArchiveError::MissingCredentials("--consumer-key / EUMETSAT_CONSUMER_KEY".to_string()))?;
        let secret = consumer_secret.filter(|s| !s.trim().is_empty()).ok_or_else(|| {
            ArchiveError::MissingCredentials("--consumer-secret / EUMETSAT_CONSUMER_SECRET".to_string())
        })?;
        Ok(Self {
            consumer_key: key.trim().to_string(),
            consumer_secret: secret.trim().to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

/// Configuration for the Data Store client.
#[derive(Debug, Clone)]
pub struct DataStoreConfig {
    /// API root, without trailing slash
    pub base_url: String,
    pub collection_id: String,
    /// Search page size
    pub page_size: usize,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl DataStoreConfig {
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.eumetsat.int".to_string(),
            collection_id: collection_id.into(),
            page_size: 100,
            request_timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BrowseResponse {
    properties: BrowseProperties,
}

#[derive(Debug, Deserialize)]
struct BrowseProperties {
    links: BrowseLinks,
}

#[derive(Debug, Deserialize)]
struct BrowseLinks {
    #[serde(rename = "sip-entries", default)]
    sip_entries: Vec<EntryLink>,
}

#[derive(Debug, Deserialize)]
struct EntryLink {
    title: String,
}

/// Data Store client with a cached bearer token.
pub struct DataStoreClient {
    client: Client,
    config: DataStoreConfig,
    credentials: Credentials,
    token: Mutex<Option<CachedToken>>,
}

impl DataStoreClient {
    pub fn new(config: DataStoreConfig, credentials: Credentials) -> ArchiveResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            client,
            config,
            credentials,
            token: Mutex::new(None),
        })
    }

    pub fn collection_id(&self) -> &str {
        &self.config.collection_id
    }

    /// Current bearer token, fetching a new one when absent or near expiry.
    async fn access_token(&self) -> ArchiveResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        let url = self.url(&["token"])?;
        debug!(url = %url, "Requesting access token");
        let response = self
            .client
            .post(url.clone())
            .basic_auth(&self.credentials.consumer_key, Some(&self.credentials.consumer_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let body: TokenResponse = check_status(response)?.json().await?;

        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            access_token: body.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(body.access_token)
    }

    /// `{base}/{segments...}` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> ArchiveResult<Url> {
        build_url(&self.config.base_url, segments)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> ArchiveResult<T> {
        let token = self.access_token().await?;
        let response = self.client.get(url).bearer_auth(token).send().await?;
        let text = check_status(response)?.text().await?;
        serde_json::from_str(&text).map_err(|e| ArchiveError::Decode(e.to_string()))
    }

    async fn search_ids(&self, window: &TimeWindow, limit: Option<usize>) -> ArchiveResult<Vec<String>> {
        let page_size = limit.map_or(self.config.page_size, |l| l.min(self.config.page_size)).max(1);
        let mut ids = Vec::new();
        let mut start_index = 0usize;
        loop {
            let mut url = self.url(&["data", "search-products", "1.0.0", "os"])?;
            url.query_pairs_mut()
                .append_pair("format", "json")
                .append_pair("pi", &self.config.collection_id)
                .append_pair("dtstart", &format_time(&window.start))
                .append_pair("dtend", &format_time(&window.end))
                .append_pair("si", &start_index.to_string())
                .append_pair("c", &page_size.to_string());

            let page: SearchPage = self.get_json(url).await?;
            let count = page.features.len();
            ids.extend(page.features.into_iter().map(|f| f.id));
            debug!(start_index, count, "Fetched search page");

            if let Some(limit) = limit {
                if ids.len() >= limit {
                    ids.truncate(limit);
                    break;
                }
            }
            if count < page_size || count == 0 {
                break;
            }
            start_index += count;
        }
        Ok(ids)
    }

    async fn entries(&self, product_id: &str) -> ArchiveResult<Vec<String>> {
        let mut url = self.url(&[
            "data",
            "browse",
            "1.0.0",
            "collections",
            &self.config.collection_id,
            "products",
            product_id,
        ])?;
        url.query_pairs_mut().append_pair("format", "json");
        let browse: BrowseResponse = self.get_json(url).await?;
        Ok(browse.properties.links.sip_entries.into_iter().map(|e| e.title).collect())
    }
}

impl fmt::Debug for DataStoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStoreClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[async_trait]
impl Archive for DataStoreClient {
    #[instrument(skip(self), fields(collection = %self.config.collection_id))]
    async fn search(&self, window: &TimeWindow, limit: Option<usize>) -> ArchiveResult<Vec<CandidateProduct>> {
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        let ids = self.search_ids(window, limit).await?;
        let mut products = Vec::with_capacity(ids.len());
        for product_id in ids {
            let entries = self.entries(&product_id).await?;
            debug!(product = %product_id, entries = entries.len(), "Listed product entries");
            products.push(CandidateProduct {
                product_id,
                collection_id: self.config.collection_id.clone(),
                entries,
            });
        }
        info!(count = products.len(), start = %window.start, end = %window.end, "Found products");
        Ok(products)
    }

    #[instrument(skip(self, product), fields(product = %product.product_id))]
    async fn open(&self, product: &CandidateProduct, entry: &str) -> ArchiveResult<ByteStream> {
        let mut url = self.url(&[
            "data",
            "download",
            "1.0.0",
            "collections",
            &product.collection_id,
            "products",
            &product.product_id,
            "entry",
        ])?;
        url.query_pairs_mut().append_pair("name", entry);

        let token = self.access_token().await?;
        debug!(url = %url, "Opening entry");
        let response = self.client.get(url).bearer_auth(token).send().await?;
        let stream = check_status(response)?.bytes_stream().map_err(ArchiveError::from);
        Ok(stream.boxed())
    }
}

fn check_status(response: Response) -> ArchiveResult<Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(ArchiveError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}

pub(crate) fn build_url(base: &str, segments: &[&str]) -> ArchiveResult<Url> {
    let mut url = Url::parse(base).map_err(|e| ArchiveError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ArchiveError::InvalidUrl(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn format_time(t: &DateTime<Utc>) -> String {
    t.format(SEARCH_TIME_FORMAT).to_string()
}
