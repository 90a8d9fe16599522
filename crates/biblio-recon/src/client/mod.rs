//! Bibliometric API collaborator.
//!
//! [`BibliometricApi`] is the contract the engine consumes. [`ElsevierClient`]
//! implements it against the Scopus and SciVal REST APIs with:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff
//! - A fixed delay before each request
//! - Response caching keyed by request digest
//! - Pass-through of the `X-RateLimit-*` quota headers

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;

use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    ApiUsage, Endpoint, EntityKind, Metered, MetricFilters, MetricType, MetricWindow,
    RateLimitInfo, RawCitationBlock, RawCollaborationRecord, RawDocument, RawProfile, RawSeries,
};

/// A structured person search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonQuery {
    pub last_name: String,
    pub first_name: String,
}

/// Calls the engine needs from the bibliometric API.
///
/// Every call reports the quota headers of the responses it consumed.
#[async_trait]
pub trait BibliometricApi: Send + Sync {
    /// Search people by name.
    async fn search_people(&self, query: &PersonQuery) -> ClientResult<Metered<Vec<RawProfile>>>;

    /// Retrieve one full profile.
    async fn fetch_profile(&self, id: &str, kind: EntityKind) -> ClientResult<Metered<RawProfile>>;

    /// All documents of a person.
    async fn fetch_documents(&self, id: &str) -> ClientResult<Metered<Vec<RawDocument>>>;

    /// Per-year citation counts for at most one batch of documents.
    async fn fetch_citation_batch(
        &self,
        scopus_ids: &[String],
        year_start: i32,
        year_end: i32,
    ) -> ClientResult<Metered<RawCitationBlock>>;

    /// One yearly metric of a person over a fixed window.
    async fn fetch_yearly_metric(
        &self,
        entity_id: &str,
        metric: MetricType,
        window: MetricWindow,
        filters: MetricFilters,
    ) -> ClientResult<Metered<RawSeries>>;

    /// Documents matching a boolean collaboration query.
    async fn search_collaboration(
        &self,
        query: &str,
    ) -> ClientResult<Metered<Vec<RawCollaborationRecord>>>;
}

/// How a search endpoint is paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paging {
    /// `start`/`count`, limited to `api::MAX_SEARCH_RESULTS`.
    Offset,
    /// `cursor=*` then `cursor/@next`; Scopus Search only.
    Cursor,
}

/// Scopus / SciVal API client.
#[derive(Clone)]
pub struct ElsevierClient {
    /// HTTP client with middleware.
    client: ClientWithMiddleware,

    /// Response cache.
    cache: Cache<String, (serde_json::Value, RateLimitInfo)>,

    /// API key (optional).
    api_key: Option<String>,

    /// Content API base URL.
    content_api_url: String,

    /// SciVal base URL.
    scival_api_url: String,

    /// Delay before each request.
    rate_limit_delay: Duration,

    /// Search page size.
    page_size: usize,
}

impl ElsevierClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a credential is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(ref key) = config.api_key {
            headers.insert("X-ELS-APIKey", key.parse()?);
        }
        if let Some(ref token) = config.inst_token {
            headers.insert("X-ELS-Insttoken", token.parse()?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
            .build_with_max_retries(3);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let cache = Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            client,
            cache,
            api_key: config.api_key,
            content_api_url: config.content_api_url,
            scival_api_url: config.scival_api_url,
            rate_limit_delay: config.rate_limit_delay,
            page_size: config.page_size.max(1),
        })
    }

    /// Check if an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Page through a Scopus search endpoint until `total` entries are collected.
    ///
    /// Offset paging cannot reach past `api::MAX_SEARCH_RESULTS`; a larger result
    /// set is an error rather than a silent cut.
    async fn search_all<E>(
        &self,
        url: &str,
        base_params: &[(String, String)],
        endpoint: Endpoint,
        paging: Paging,
    ) -> ClientResult<Metered<Vec<E>>>
    where
        E: DeserializeOwned + wire::SearchEntry,
    {
        let mut usage = ApiUsage::default();
        let mut entries = Vec::new();
        let mut fetched = 0usize;
        let mut cursor = String::from("*");

        loop {
            let mut params = base_params.to_vec();
            match paging {
                Paging::Offset => params.push(("start".to_string(), fetched.to_string())),
                Paging::Cursor => params.push(("cursor".to_string(), cursor.clone())),
            }
            params.push(("count".to_string(), self.page_size.to_string()));

            let (page, info): (wire::SearchEnvelope<E>, _) = self.get(url, &params).await?;
            usage.record(endpoint, info);

            let total = page.results.total;
            if paging == Paging::Offset && total > api::MAX_SEARCH_RESULTS as u64 {
                return Err(ClientError::Incomplete {
                    total,
                    reachable: api::MAX_SEARCH_RESULTS as u64,
                });
            }

            let received = page.results.entry.len();
            entries.extend(page.results.entry.into_iter().filter(wire::SearchEntry::is_result));
            fetched += received;
            if received == 0 || fetched as u64 >= total {
                break;
            }

            if paging == Paging::Cursor {
                match page.results.cursor.and_then(|c| c.next) {
                    Some(next) if next != cursor => cursor = next,
                    _ => return Err(ClientError::Incomplete { total, reachable: fetched as u64 }),
                }
            }
        }

        tracing::debug!(url = %url, entries = entries.len(), ?paging, "Search complete");
        Ok(Metered::new(entries, usage))
    }

    /// Make a GET request, returning the decoded body and its quota headers.
    async fn get<T>(&self, url: &str, params: &[(String, String)]) -> ClientResult<(T, RateLimitInfo)>
    where
        T: DeserializeOwned,
    {
        // Check cache
        let cache_key = self.cache_key("GET", url, params);
        if let Some((cached, info)) = self.cache.get(&cache_key).await {
            return Ok((serde_json::from_value(cached)?, info));
        }

        // Rate limit
        tokio::time::sleep(self.rate_limit_delay).await;

        let response = self.client.get(url).query(params).send().await?;

        let response = self.handle_response(response).await?;
        let info = rate_limit_info(response.headers());
        let value: serde_json::Value = response.json().await?;

        // Cache response
        self.cache.insert(cache_key, (value.clone(), info.clone())).await;

        Ok((serde_json::from_value(value)?, info))
    }

    /// Handle API response status codes.
    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> ClientResult<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);

                Err(ClientError::rate_limited(retry_after))
            }
            404 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::not_found(text))
            }
            400 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::bad_request(text))
            }
            401 | 403 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::Unauthorized { message: text })
            }
            500..=599 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::server(status.as_u16(), text))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text })
            }
        }
    }

    /// Generate cache key.
    fn cache_key(&self, method: &str, url: &str, params: &[(String, String)]) -> String {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        hasher.update(method.as_bytes());
        hasher.update(b"|");
        hasher.update(url.as_bytes());
        hasher.update(b"|");

        for (k, v) in params {
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
            hasher.update(b"&");
        }

        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl BibliometricApi for ElsevierClient {
    async fn search_people(&self, query: &PersonQuery) -> ClientResult<Metered<Vec<RawProfile>>> {
        let url = format!("{}/search/author", self.content_api_url);
        let params = vec![(
            "query".to_string(),
            format!("AUTHLAST({}) and AUTHFIRST({})", query.last_name, query.first_name),
        )];

        let entries: Metered<Vec<wire::AuthorEntry>> =
            self.search_all(&url, &params, Endpoint::AuthorSearch, Paging::Offset).await?;
        Ok(entries.map(|list| list.into_iter().map(wire::AuthorEntry::into_profile).collect()))
    }

    async fn fetch_profile(&self, id: &str, kind: EntityKind) -> ClientResult<Metered<RawProfile>> {
        match kind {
            EntityKind::Person => {
                let url = format!("{}/author/author_id/{}", self.content_api_url, id);
                let params = vec![("view".to_string(), "ENHANCED".to_string())];
                let (body, info): (wire::AuthorRetrievalEnvelope, _) =
                    self.get(&url, &params).await?;
                let profile = body.into_profile(id)?;
                Ok(Metered::new(profile, ApiUsage::single(Endpoint::AuthorRetrieval, info)))
            }
            EntityKind::Institution => {
                let url = format!("{}/affiliation/affiliation_id/{}", self.content_api_url, id);
                let params = vec![("view".to_string(), "STANDARD".to_string())];
                let (body, info): (wire::AffiliationRetrievalEnvelope, _) =
                    self.get(&url, &params).await?;
                let profile = body.into_profile(id);
                Ok(Metered::new(profile, ApiUsage::single(Endpoint::AffiliationRetrieval, info)))
            }
        }
    }

    async fn fetch_documents(&self, id: &str) -> ClientResult<Metered<Vec<RawDocument>>> {
        let url = format!("{}/search/scopus", self.content_api_url);
        let params = vec![
            ("query".to_string(), format!("AU-ID({id})")),
            ("view".to_string(), "COMPLETE".to_string()),
        ];

        let entries: Metered<Vec<wire::ScopusEntry>> =
            self.search_all(&url, &params, Endpoint::ScopusSearch, Paging::Cursor).await?;
        Ok(entries.map(|list| list.into_iter().map(wire::ScopusEntry::into_document).collect()))
    }

    async fn fetch_citation_batch(
        &self,
        scopus_ids: &[String],
        year_start: i32,
        year_end: i32,
    ) -> ClientResult<Metered<RawCitationBlock>> {
        let url = format!("{}/abstract/citations", self.content_api_url);
        let params = vec![
            ("scopus_id".to_string(), scopus_ids.join(",")),
            ("date".to_string(), format!("{year_start}-{year_end}")),
        ];

        let (body, info): (wire::CitationEnvelope, _) = self.get(&url, &params).await?;
        let block = body.into_block(year_start, year_end)?;
        Ok(Metered::new(block, ApiUsage::single(Endpoint::CitationOverview, info)))
    }

    async fn fetch_yearly_metric(
        &self,
        entity_id: &str,
        metric: MetricType,
        window: MetricWindow,
        filters: MetricFilters,
    ) -> ClientResult<Metered<RawSeries>> {
        let url = format!("{}/author/metrics", self.scival_api_url);
        let params = vec![
            ("authors".to_string(), entity_id.to_string()),
            ("metricTypes".to_string(), metric.as_str().to_string()),
            ("yearRange".to_string(), window.as_str().to_string()),
            ("includeSelfCitations".to_string(), filters.include_self_citations.to_string()),
            ("byYear".to_string(), "true".to_string()),
            ("includedDocs".to_string(), filters.included_docs.as_str().to_string()),
            ("journalImpactType".to_string(), filters.journal_impact_type.as_str().to_string()),
            ("showAsFieldWeighted".to_string(), "false".to_string()),
            ("indexType".to_string(), "hIndex".to_string()),
        ];

        let (body, info): (wire::MetricsEnvelope, _) = self.get(&url, &params).await?;
        let series = body.into_series(metric)?;
        Ok(Metered::new(series, ApiUsage::single(Endpoint::SciValMetrics, info)))
    }

    async fn search_collaboration(
        &self,
        query: &str,
    ) -> ClientResult<Metered<Vec<RawCollaborationRecord>>> {
        let url = format!("{}/search/scopus", self.content_api_url);
        let params = vec![
            ("query".to_string(), query.to_string()),
            ("view".to_string(), "COMPLETE".to_string()),
        ];

        let entries: Metered<Vec<wire::ScopusEntry>> =
            self.search_all(&url, &params, Endpoint::ScopusSearch, Paging::Cursor).await?;
        Ok(entries.map(|list| {
            list.into_iter()
                .map(|entry| RawCollaborationRecord::from(&entry.into_document()))
                .collect()
        }))
    }
}

/// Extract the quota headers of a response.
fn rate_limit_info(headers: &HeaderMap) -> RateLimitInfo {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    RateLimitInfo {
        date: header("Date"),
        limit: header("X-RateLimit-Limit"),
        remaining: header("X-RateLimit-Remaining"),
        reset: header("X-RateLimit-Reset"),
    }
}

impl std::fmt::Debug for ElsevierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElsevierClient").field("has_api_key", &self.has_api_key()).finish()
    }
}
