//! Route classification.
//!
//! Every request the router sees resolves to exactly one [`RouteClass`],
//! which picks the caching strategy. Classification is a pure function of
//! method and path; the table is data, so tests and alternate deployments
//! can swap it without touching strategy code.

use serde::{Deserialize, Serialize};
use vetsync_protocol::Method;

/// The caching strategy classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteClass {
    /// Page loads: network-first with a short timeout, cache fallback.
    Navigation,
    /// Fingerprinted build artifacts: stale-while-revalidate.
    ImmutableAsset,
    /// Deployment-versioned data files: stale-while-revalidate.
    VersionedData,
    /// API GETs: cache-then-revalidate when cached, network-first when not.
    ApiRead,
    /// API mutations: network-only, queued-for-later on failure.
    ApiWrite,
    /// Images and video: cache-first.
    Media,
    /// Anything unmatched: network-first, cache fallback.
    Default,
}

/// The result of classifying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The strategy class.
    pub class: RouteClass,
    /// Whether the route belongs to the offline warm list.
    pub offline_capable: bool,
    /// Whether the route must never be served stale.
    pub online_only: bool,
}

/// The classification table.
///
/// The matching rules are fixed (first match wins, anything unmatched is
/// [`RouteClass::Default`]); the table only parameterizes which routes are
/// offline-capable and which are online-only.
#[derive(Debug, Clone)]
pub struct RouteTable {
    offline_capable_routes: Vec<String>,
    online_only_prefixes: Vec<String>,
}

const MEDIA_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "avif", "mp4", "webm", "mp3",
];

impl RouteTable {
    /// Creates an empty table: classification still works, but no route is
    /// offline-capable or online-only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            offline_capable_routes: Vec::new(),
            online_only_prefixes: Vec::new(),
        }
    }

    /// The practice-management app's table.
    ///
    /// The day-to-day clinical surfaces work offline; reporting and
    /// billing need live data and are online-only.
    #[must_use]
    pub fn practice_defaults() -> Self {
        Self::new()
            .with_offline_capable([
                "/",
                "/dashboard",
                "/appointments",
                "/pets",
                "/clients",
                "/soap-notes",
                "/admissions",
                "/boarding",
            ])
            .with_online_only(["/reports", "/billing"])
    }

    /// Adds routes to the offline warm list.
    #[must_use]
    pub fn with_offline_capable<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.offline_capable_routes
            .extend(routes.into_iter().map(Into::into));
        self
    }

    /// Adds path prefixes that must never be served stale.
    #[must_use]
    pub fn with_online_only<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.online_only_prefixes
            .extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Returns the offline warm list.
    #[must_use]
    pub fn offline_capable_routes(&self) -> &[String] {
        &self.offline_capable_routes
    }

    /// Classifies a request. Total: every method/path pair resolves to
    /// exactly one classification.
    #[must_use]
    pub fn classify(&self, method: Method, path: &str) -> Classification {
        let path = path.split('?').next().unwrap_or(path);
        let class = self.class_of(method, path);
        Classification {
            class,
            offline_capable: class == RouteClass::Navigation
                && self.offline_capable_routes.iter().any(|r| r == path),
            online_only: self
                .online_only_prefixes
                .iter()
                .any(|p| path.starts_with(p.as_str())),
        }
    }

    fn class_of(&self, method: Method, path: &str) -> RouteClass {
        if !method.is_read() {
            return RouteClass::ApiWrite;
        }
        if path.starts_with("/api/") {
            return RouteClass::ApiRead;
        }
        if path.starts_with("/_data/") || path == "/config/version" {
            return RouteClass::VersionedData;
        }
        if path.starts_with("/assets/") || is_fingerprinted(path) {
            return RouteClass::ImmutableAsset;
        }
        if has_extension(path, MEDIA_EXTENSIONS) {
            return RouteClass::Media;
        }
        // Extension-less GETs are page navigations
        if !last_segment(path).contains('.') {
            return RouteClass::Navigation;
        }
        RouteClass::Default
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::practice_defaults()
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    last_segment(path)
        .rsplit_once('.')
        .is_some_and(|(_, ext)| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Detects build-fingerprinted filenames like `app.3f9c2b1d.js`: a middle
/// dot-separated segment of eight or more hex characters.
fn is_fingerprinted(path: &str) -> bool {
    let segments: Vec<&str> = last_segment(path).split('.').collect();
    if segments.len() < 3 {
        return false;
    }
    segments[1..segments.len() - 1]
        .iter()
        .any(|s| s.len() >= 8 && s.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classify(method: Method, path: &str) -> RouteClass {
        RouteTable::practice_defaults().classify(method, path).class
    }

    #[test]
    fn api_traffic_splits_on_method() {
        assert_eq!(classify(Method::Get, "/api/pets"), RouteClass::ApiRead);
        assert_eq!(classify(Method::Post, "/api/pets"), RouteClass::ApiWrite);
        assert_eq!(
            classify(Method::Patch, "/api/pets/p1"),
            RouteClass::ApiWrite
        );
        assert_eq!(
            classify(Method::Delete, "/api/pets/p1"),
            RouteClass::ApiWrite
        );
    }

    #[test]
    fn assets_and_fingerprints_are_immutable() {
        assert_eq!(
            classify(Method::Get, "/assets/app.js"),
            RouteClass::ImmutableAsset
        );
        assert_eq!(
            classify(Method::Get, "/js/app.3f9c2b1d.js"),
            RouteClass::ImmutableAsset
        );
        // Short or non-hex middle segments are not fingerprints
        assert_eq!(classify(Method::Get, "/js/app.min.js"), RouteClass::Default);
    }

    #[test]
    fn versioned_data_paths() {
        assert_eq!(
            classify(Method::Get, "/_data/breeds.json"),
            RouteClass::VersionedData
        );
        assert_eq!(
            classify(Method::Get, "/config/version"),
            RouteClass::VersionedData
        );
    }

    #[test]
    fn media_by_extension() {
        assert_eq!(classify(Method::Get, "/uploads/pet.jpg"), RouteClass::Media);
        assert_eq!(classify(Method::Get, "/uploads/intro.mp4"), RouteClass::Media);
        assert_eq!(classify(Method::Get, "/uploads/PET.PNG"), RouteClass::Media);
    }

    #[test]
    fn extensionless_gets_are_navigation() {
        assert_eq!(classify(Method::Get, "/"), RouteClass::Navigation);
        assert_eq!(classify(Method::Get, "/dashboard"), RouteClass::Navigation);
        assert_eq!(
            classify(Method::Get, "/appointments?date=today"),
            RouteClass::Navigation
        );
    }

    #[test]
    fn flags_follow_the_table() {
        let table = RouteTable::practice_defaults();

        let c = table.classify(Method::Get, "/dashboard");
        assert!(c.offline_capable);
        assert!(!c.online_only);

        let c = table.classify(Method::Get, "/reports/monthly");
        assert!(c.online_only);
        assert!(!c.offline_capable);
    }

    proptest! {
        // Classification is total and deterministic for arbitrary paths
        #[test]
        fn classification_is_total(path in "/[a-zA-Z0-9_./?=-]{0,60}") {
            let table = RouteTable::practice_defaults();
            for method in [Method::Get, Method::Post, Method::Put, Method::Patch, Method::Delete] {
                let first = table.classify(method, &path);
                let second = table.classify(method, &path);
                prop_assert_eq!(first, second);
                if !method.is_read() {
                    prop_assert_eq!(first.class, RouteClass::ApiWrite);
                }
            }
        }
    }
}
