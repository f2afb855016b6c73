//! Provider-specific authentication headers.
//!
//! Header selection is a pure function of the endpoint URL: strategies are
//! tried in registration order and the first match wins. Endpoints that match
//! no strategy get the generic JSON headers only.

use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT,
};
use url::Url;

/// One provider family's header policy.
pub trait AuthStrategy: Send + Sync {
    /// Provider family name, for log lines.
    fn name(&self) -> &'static str;

    /// Whether this strategy applies to the endpoint.
    fn matches(&self, url: &Url) -> bool;

    /// Adds the provider-specific headers on top of the generic ones.
    fn apply(&self, url: &Url, headers: &mut HeaderMap);
}

/// Alchemy-style endpoints carry the API key as the last path segment and
/// expect it echoed back as a bearer token.
pub struct AlchemyAuth;

impl AuthStrategy for AlchemyAuth {
    fn name(&self) -> &'static str {
        "alchemy"
    }

    fn matches(&self, url: &Url) -> bool {
        url.as_str().to_lowercase().contains("alchemy")
    }

    fn apply(&self, url: &Url, headers: &mut HeaderMap) {
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://solana.com"));
        headers.insert(REFERER, HeaderValue::from_static("https://solana.com/"));

        let api_key = url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|segment| !segment.is_empty());
        if let Some(key) = api_key {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {key}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }
    }
}

/// QuickNode authenticates through the URL itself; no extra headers.
pub struct QuickNodeAuth;

impl AuthStrategy for QuickNodeAuth {
    fn name(&self) -> &'static str {
        "quiknode"
    }

    fn matches(&self, url: &Url) -> bool {
        url.as_str().to_lowercase().contains("quiknode")
    }

    fn apply(&self, _url: &Url, _headers: &mut HeaderMap) {}
}

/// Ordered registry of [`AuthStrategy`] implementations.
pub struct AuthRegistry {
    strategies: Vec<Box<dyn AuthStrategy>>,
}

impl AuthRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy; earlier registrations take precedence.
    pub fn register(&mut self, strategy: Box<dyn AuthStrategy>) {
        self.strategies.push(strategy);
    }

    /// Name of the strategy that applies to `url`, if any.
    #[must_use]
    pub fn provider_name(&self, url: &Url) -> Option<&'static str> {
        self.strategies
            .iter()
            .find(|strategy| strategy.matches(url))
            .map(|strategy| strategy.name())
    }

    /// Builds the full header set for `url`.
    #[must_use]
    pub fn headers_for(&self, url: &Url) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(strategy) = self.strategies.iter().find(|strategy| strategy.matches(url)) {
            strategy.apply(url, &mut headers);
        }
        headers
    }
}

impl Default for AuthRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(AlchemyAuth));
        registry.register(Box::new(QuickNodeAuth));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alchemy_gets_bearer_from_path() {
        let registry = AuthRegistry::default();
        let url = Url::parse("https://solana-mainnet.g.alchemy.com/v2/test-api-key").unwrap();

        let headers = registry.headers_for(&url);
        assert_eq!(registry.provider_name(&url), Some("alchemy"));
        assert_eq!(
            headers.get(AUTHORIZATION).unwrap(),
            "Bearer test-api-key"
        );
        assert_eq!(headers.get(USER_AGENT).unwrap(), "Mozilla/5.0");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn quiknode_gets_json_headers_only() {
        let registry = AuthRegistry::default();
        let url =
            Url::parse("https://restless-misty-river.solana-mainnet.quiknode.pro/abc123/").unwrap();

        let headers = registry.headers_for(&url);
        assert_eq!(registry.provider_name(&url), Some("quiknode"));
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn unknown_provider_falls_through_to_defaults() {
        let registry = AuthRegistry::default();
        let url = Url::parse("https://api.mainnet-beta.solana.com").unwrap();

        assert_eq!(registry.provider_name(&url), None);
        let headers = registry.headers_for(&url);
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn first_registered_match_wins() {
        struct CatchAll;
        impl AuthStrategy for CatchAll {
            fn name(&self) -> &'static str {
                "catch-all"
            }
            fn matches(&self, _url: &Url) -> bool {
                true
            }
            fn apply(&self, _url: &Url, headers: &mut HeaderMap) {
                headers.insert(USER_AGENT, HeaderValue::from_static("catch-all"));
            }
        }

        let mut registry = AuthRegistry::new();
        registry.register(Box::new(CatchAll));
        registry.register(Box::new(AlchemyAuth));

        let url = Url::parse("https://solana-mainnet.g.alchemy.com/v2/key").unwrap();
        let headers = registry.headers_for(&url);
        assert_eq!(registry.provider_name(&url), Some("catch-all"));
        assert_eq!(headers.get(USER_AGENT).unwrap(), "catch-all");
        assert!(headers.get(AUTHORIZATION).is_none());
    }
}
