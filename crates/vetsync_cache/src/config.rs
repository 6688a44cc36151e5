//! Router configuration.

use crate::namespace::CacheKind;
use crate::routes::RouteTable;

/// Per-class entry limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    /// Navigation pages.
    pub pages: usize,
    /// Immutable assets plus the default class.
    pub static_assets: usize,
    /// Versioned data files.
    pub data: usize,
    /// API reads.
    pub api: usize,
    /// Media.
    pub media: usize,
}

impl CacheLimits {
    /// Returns the limit for one cache kind.
    #[must_use]
    pub const fn for_kind(&self, kind: CacheKind) -> usize {
        match kind {
            CacheKind::Pages => self.pages,
            CacheKind::Static => self.static_assets,
            CacheKind::Data => self.data,
            CacheKind::Api => self.api,
            CacheKind::Media => self.media,
        }
    }
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            pages: 50,
            static_assets: 200,
            data: 50,
            api: 100,
            media: 30,
        }
    }
}

/// Configuration for the edge cache router.
///
/// Passed into the constructor (never global) so tests and multiple
/// deployments can run isolated routers.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// The deployment version token embedded in every namespace name.
    pub version: String,
    /// The route classification table.
    pub routes: RouteTable,
    /// Per-class entry limits.
    pub limits: CacheLimits,
    /// Timeout budget for the network-first navigation attempt, in
    /// milliseconds.
    pub navigation_timeout_ms: u64,
    /// The offline fallback page, warmed at install.
    pub offline_page: String,
    /// The online-only placeholder page (carries a `{{path}}` token),
    /// warmed at install.
    pub online_only_page: String,
    /// Extra routes warmed at install beyond the table's offline list.
    pub warm_routes: Vec<String>,
}

impl RouterConfig {
    /// Creates a configuration with the practice-app defaults.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            routes: RouteTable::practice_defaults(),
            limits: CacheLimits::default(),
            navigation_timeout_ms: 3_000,
            offline_page: "/offline.html".to_string(),
            online_only_page: "/online-only.html".to_string(),
            warm_routes: Vec::new(),
        }
    }

    /// Sets the route table.
    #[must_use]
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Sets the per-class limits.
    #[must_use]
    pub fn with_limits(mut self, limits: CacheLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the navigation timeout.
    #[must_use]
    pub fn with_navigation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.navigation_timeout_ms = timeout_ms;
        self
    }

    /// Sets the offline fallback page.
    #[must_use]
    pub fn with_offline_page(mut self, path: impl Into<String>) -> Self {
        self.offline_page = path.into();
        self
    }

    /// Sets the online-only placeholder page.
    #[must_use]
    pub fn with_online_only_page(mut self, path: impl Into<String>) -> Self {
        self.online_only_page = path.into();
        self
    }

    /// Sets additional install-time warm routes.
    #[must_use]
    pub fn with_warm_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warm_routes = routes.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_cover_all_kinds() {
        let limits = CacheLimits::default();
        for kind in CacheKind::ALL {
            assert!(limits.for_kind(kind) > 0);
        }
    }

    #[test]
    fn defaults() {
        let config = RouterConfig::new("v1");
        assert_eq!(config.navigation_timeout_ms, 3_000);
        assert_eq!(config.offline_page, "/offline.html");
        assert!(config.warm_routes.is_empty());
    }
}
