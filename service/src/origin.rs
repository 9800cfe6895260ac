//! Cross-origin authorization shared by every route, including the SSE handshake.

use crate::config::{Config, EmptyOriginsPolicy};
use http::Uri;
use std::collections::HashSet;

/// Hosts treated as the local machine. Any scheme and port is accepted for these.
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

/// Decides whether a request's declared `Origin` may talk to the relay.
///
/// Evaluation order:
/// 1. no origin (non-browser caller) is allowed
/// 2. a loopback origin is allowed regardless of port
/// 3. an exact match in the allowed set is allowed
/// 4. with an empty allowed set, `EmptyOriginsPolicy` decides
/// 5. anything else is rejected
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: HashSet<String>,
    when_empty: EmptyOriginsPolicy,
}

impl OriginPolicy {
    pub fn new<I, S>(origins: I, when_empty: EmptyOriginsPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = origins
            .into_iter()
            .map(|origin| origin.as_ref().trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Self {
            allowed,
            when_empty,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.allowed_origins, config.empty_origins_policy)
    }

    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return true;
        };

        is_loopback(origin) || self.allowed.contains(origin) || self.is_unrestricted()
    }

    /// Whether every origin is accepted.
    pub fn is_unrestricted(&self) -> bool {
        self.allowed.is_empty() && self.when_empty == EmptyOriginsPolicy::AllowAll
    }

    /// Human readable summary used in the startup banner.
    pub fn describe(&self) -> String {
        if self.is_unrestricted() {
            return "(not restricted)".to_string();
        }
        if self.allowed.is_empty() {
            return "(loopback only)".to_string();
        }

        let mut origins: Vec<&str> = self.allowed.iter().map(String::as_str).collect();
        origins.sort_unstable();
        origins.join(", ")
    }
}

fn is_loopback(origin: &str) -> bool {
    let Ok(uri) = origin.parse::<Uri>() else {
        return false;
    };

    if uri.scheme().is_none() {
        return false;
    }

    uri.host().is_some_and(|host| {
        LOOPBACK_HOSTS
            .iter()
            .any(|loopback| host.eq_ignore_ascii_case(loopback))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restricted() -> OriginPolicy {
        OriginPolicy::new(
            ["https://example.com", " https://admin.example.com "],
            EmptyOriginsPolicy::AllowAll,
        )
    }

    #[test]
    fn test_missing_origin_is_allowed() {
        assert!(restricted().is_allowed(None));
        assert!(OriginPolicy::new(Vec::<String>::new(), EmptyOriginsPolicy::AllowNone)
            .is_allowed(None));
    }

    #[test]
    fn test_loopback_allowed_on_any_port() {
        let policy = restricted();

        assert!(policy.is_allowed(Some("http://localhost:3000")));
        assert!(policy.is_allowed(Some("http://localhost:5173")));
        assert!(policy.is_allowed(Some("http://localhost")));
        assert!(policy.is_allowed(Some("https://127.0.0.1:8443")));
        assert!(policy.is_allowed(Some("http://[::1]:9000")));
        assert!(policy.is_allowed(Some("http://LOCALHOST:3000")));
    }

    #[test]
    fn test_loopback_lookalikes_are_rejected() {
        let policy = restricted();

        assert!(!policy.is_allowed(Some("http://localhost.evil.com")));
        assert!(!policy.is_allowed(Some("http://127.0.0.1.nip.io:3000")));
        assert!(!policy.is_allowed(Some("localhost:3000")));
        assert!(!policy.is_allowed(Some("null")));
    }

    #[test]
    fn test_listed_origins_match_exactly() {
        let policy = restricted();

        assert!(policy.is_allowed(Some("https://example.com")));
        assert!(policy.is_allowed(Some("https://admin.example.com")));
        assert!(!policy.is_allowed(Some("http://example.com")));
        assert!(!policy.is_allowed(Some("https://example.com:8443")));
        assert!(!policy.is_allowed(Some("https://evil.com")));
    }

    #[test]
    fn test_empty_list_allow_all() {
        let policy = OriginPolicy::new(["", "  "], EmptyOriginsPolicy::AllowAll);

        assert!(policy.is_unrestricted());
        assert!(policy.is_allowed(Some("https://anything.example")));
        assert_eq!(policy.describe(), "(not restricted)");
    }

    #[test]
    fn test_empty_list_allow_none_still_allows_loopback() {
        let policy = OriginPolicy::new(Vec::<String>::new(), EmptyOriginsPolicy::AllowNone);

        assert!(!policy.is_unrestricted());
        assert!(!policy.is_allowed(Some("https://anything.example")));
        assert!(policy.is_allowed(Some("http://localhost:3000")));
        assert_eq!(policy.describe(), "(loopback only)");
    }

    #[test]
    fn test_describe_lists_origins_sorted() {
        assert_eq!(
            restricted().describe(),
            "https://admin.example.com, https://example.com"
        );
    }
}
