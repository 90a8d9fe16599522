//! Rate-limit metadata passed through from the API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upstream endpoint families that report their own quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Endpoint {
    AuthorSearch,
    AuthorRetrieval,
    AffiliationRetrieval,
    ScopusSearch,
    CitationOverview,
    SciValMetrics,
}

/// Quota headers of one response, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub date: Option<String>,
    pub limit: Option<String>,
    pub remaining: Option<String>,
    pub reset: Option<String>,
}

impl RateLimitInfo {
    /// True when the response carried none of the headers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.date.is_none() && self.limit.is_none() && self.remaining.is_none() && self.reset.is_none()
    }
}

/// Latest quota record per endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUsage {
    entries: BTreeMap<Endpoint, RateLimitInfo>,
}

impl ApiUsage {
    /// Usage with one record.
    #[must_use]
    pub fn single(endpoint: Endpoint, info: RateLimitInfo) -> Self {
        let mut usage = Self::default();
        usage.record(endpoint, info);
        usage
    }

    /// Record a response; empty records never overwrite a known one.
    pub fn record(&mut self, endpoint: Endpoint, info: RateLimitInfo) {
        if info.is_empty() && self.entries.contains_key(&endpoint) {
            return;
        }
        self.entries.insert(endpoint, info);
    }

    /// Fold `other` into `self`; `other` is the more recent.
    pub fn merge(&mut self, other: Self) {
        for (endpoint, info) in other.entries {
            self.record(endpoint, info);
        }
    }

    /// Record for an endpoint.
    #[must_use]
    pub fn get(&self, endpoint: Endpoint) -> Option<&RateLimitInfo> {
        self.entries.get(&endpoint)
    }

    /// All records in endpoint order.
    pub fn iter(&self) -> impl Iterator<Item = (Endpoint, &RateLimitInfo)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A collaborator result together with the quota it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Metered<T> {
    pub value: T,
    pub usage: ApiUsage,
}

impl<T> Metered<T> {
    #[must_use]
    pub const fn new(value: T, usage: ApiUsage) -> Self {
        Self { value, usage }
    }

    /// A result that cost nothing upstream.
    #[must_use]
    pub fn free(value: T) -> Self {
        Self { value, usage: ApiUsage::default() }
    }

    /// Transform the payload, keeping the usage.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metered<U> {
        Metered { value: f(self.value), usage: self.usage }
    }

    /// Split into payload and usage, merging the usage into `sink`.
    pub fn take(self, sink: &mut ApiUsage) -> T {
        sink.merge(self.usage);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(remaining: &str) -> RateLimitInfo {
        RateLimitInfo { remaining: Some(remaining.into()), ..RateLimitInfo::default() }
    }

    #[test]
    fn test_merge_keeps_latest() {
        let mut usage = ApiUsage::single(Endpoint::AuthorSearch, info("10"));
        usage.merge(ApiUsage::single(Endpoint::AuthorSearch, info("9")));
        assert_eq!(usage.get(Endpoint::AuthorSearch), Some(&info("9")));
    }

    #[test]
    fn test_empty_record_does_not_erase() {
        let mut usage = ApiUsage::single(Endpoint::CitationOverview, info("5"));
        usage.record(Endpoint::CitationOverview, RateLimitInfo::default());
        assert_eq!(usage.get(Endpoint::CitationOverview), Some(&info("5")));
    }

    #[test]
    fn test_metered_take_merges() {
        let mut sink = ApiUsage::default();
        let value = Metered::new(3, ApiUsage::single(Endpoint::ScopusSearch, info("1"))).take(&mut sink);
        assert_eq!(value, 3);
        assert!(sink.get(Endpoint::ScopusSearch).is_some());
    }
}
