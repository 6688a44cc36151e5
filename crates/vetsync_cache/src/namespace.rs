//! Versioned cache namespaces.
//!
//! A namespace is one bounded, FIFO-ordered bucket of cached responses
//! for one traffic class, persisted as its own framed log. The namespace
//! name embeds the deployment version token, so activation can discard a
//! stale deployment's caches by filename alone.

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use vetsync_protocol::HttpResponse;
use vetsync_storage::FramedLog;

/// The five traffic-class buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Navigation responses (HTML pages).
    Pages,
    /// Immutable build assets, plus the default class.
    Static,
    /// Deployment-versioned data files.
    Data,
    /// API read responses.
    Api,
    /// Images and video.
    Media,
}

impl CacheKind {
    /// All kinds, in a fixed order.
    pub const ALL: [CacheKind; 5] = [
        CacheKind::Pages,
        CacheKind::Static,
        CacheKind::Data,
        CacheKind::Api,
        CacheKind::Media,
    ];

    /// Returns the kind's name as embedded in namespace names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CacheKind::Pages => "pages",
            CacheKind::Static => "static",
            CacheKind::Data => "data",
            CacheKind::Api => "api",
            CacheKind::Media => "media",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for CacheKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespace name: traffic class plus deployment version token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheName {
    /// The traffic class.
    pub kind: CacheKind,
    /// The deployment version token.
    pub token: String,
}

impl CacheName {
    /// Creates a name for the given class and version token.
    #[must_use]
    pub fn new(kind: CacheKind, token: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
        }
    }

    /// Renders the canonical namespace name, `vetsync-<kind>-<token>`.
    #[must_use]
    pub fn render(&self) -> String {
        format!("vetsync-{}-{}", self.kind.as_str(), self.token)
    }

    /// Returns the on-disk file name for this namespace.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.log", self.render())
    }

    /// Parses a rendered name back into its parts.
    ///
    /// Version tokens may themselves contain `-`; only the leading
    /// `vetsync-<kind>-` portion is structural.
    #[must_use]
    pub fn parse(rendered: &str) -> Option<Self> {
        let rest = rendered.strip_prefix("vetsync-")?;
        let (kind, token) = rest.split_once('-')?;
        if token.is_empty() {
            return None;
        }
        Some(Self {
            kind: CacheKind::parse(kind)?,
            token: token.to_string(),
        })
    }
}

impl std::fmt::Display for CacheName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// One cached request/response pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The request path the response was cached under (query included).
    pub path: String,
    /// The cached response.
    pub response: HttpResponse,
}

// Log record kinds
const ENTRY_INSERT: u8 = 1;
const ENTRY_REMOVE: u8 = 2;

#[derive(Serialize, Deserialize)]
struct InsertPayload {
    path: String,
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct RemovePayload {
    path: String,
}

/// A bounded FIFO bucket of cached responses.
///
/// Entries keep strict insertion order; refreshing an existing path
/// overwrites in place without reordering, and exceeding `max_items`
/// evicts the oldest-inserted entries first. Only status-200 responses
/// are ever inserted.
pub struct CacheNamespace {
    name: CacheName,
    max_items: usize,
    log: Option<FramedLog>,
    entries: Vec<CacheEntry>,
}

impl CacheNamespace {
    /// Creates an ephemeral (unpersisted) namespace.
    #[must_use]
    pub fn ephemeral(name: CacheName, max_items: usize) -> Self {
        Self {
            name,
            max_items,
            log: None,
            entries: Vec::new(),
        }
    }

    /// Opens a persisted namespace, replaying its log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log is unreadable or a record fails to
    /// decode; callers treat that as a corrupt namespace (drop and start
    /// empty).
    pub fn open(name: CacheName, max_items: usize, log: FramedLog) -> CacheResult<Self> {
        let mut namespace = Self {
            name,
            max_items,
            log: None,
            entries: Vec::new(),
        };

        for item in log.iter()? {
            let (_, kind, payload) = item?;
            match kind {
                ENTRY_INSERT => {
                    let p: InsertPayload =
                        ciborium::from_reader(payload.as_slice()).map_err(CacheError::codec)?;
                    namespace.apply_insert(CacheEntry {
                        path: p.path,
                        response: HttpResponse {
                            status: p.status,
                            body: p.body,
                            content_type: p.content_type,
                        },
                    });
                }
                ENTRY_REMOVE => {
                    let p: RemovePayload =
                        ciborium::from_reader(payload.as_slice()).map_err(CacheError::codec)?;
                    namespace.entries.retain(|e| e.path != p.path);
                }
                other => {
                    return Err(CacheError::Codec(format!(
                        "unknown cache record kind {other}"
                    )))
                }
            }
        }

        namespace.log = Some(log);
        Ok(namespace)
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn name(&self) -> &CacheName {
        &self.name
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached paths in insertion order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }

    /// Looks up a cached response by exact path.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<HttpResponse> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.response.clone())
    }

    /// Inserts a response, returning whether it was cached.
    ///
    /// Anything but status 200 is refused. An existing path is refreshed
    /// in place; a new path is appended, evicting the oldest entries past
    /// `max_items`.
    ///
    /// # Errors
    ///
    /// Returns an error if the log append fails.
    pub fn insert(&mut self, path: &str, response: &HttpResponse) -> CacheResult<bool> {
        if response.status != 200 {
            return Ok(false);
        }

        if let Some(log) = &self.log {
            let payload = InsertPayload {
                path: path.to_string(),
                status: response.status,
                content_type: response.content_type.clone(),
                body: response.body.clone(),
            };
            let mut buf = Vec::new();
            ciborium::into_writer(&payload, &mut buf).map_err(CacheError::codec)?;
            log.append(ENTRY_INSERT, &buf)?;
        }

        self.apply_insert(CacheEntry {
            path: path.to_string(),
            response: response.clone(),
        });
        Ok(true)
    }

    /// Removes every entry whose path (query stripped) equals `path`.
    ///
    /// Returns the number of entries dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the log append fails.
    pub fn remove_matching(&mut self, path: &str) -> CacheResult<usize> {
        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.path.split('?').next().unwrap_or(&e.path) == path)
            .map(|e| e.path.clone())
            .collect();

        for victim in &doomed {
            if let Some(log) = &self.log {
                let mut buf = Vec::new();
                ciborium::into_writer(&RemovePayload { path: victim.clone() }, &mut buf)
                    .map_err(CacheError::codec)?;
                log.append(ENTRY_REMOVE, &buf)?;
            }
            self.entries.retain(|e| &e.path != victim);
        }
        Ok(doomed.len())
    }

    /// Insert with FIFO semantics; eviction is re-derived on replay, so it
    /// is never logged.
    fn apply_insert(&mut self, entry: CacheEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.path == entry.path) {
            existing.response = entry.response;
        } else {
            self.entries.push(entry);
        }
        while self.entries.len() > self.max_items {
            self.entries.remove(0);
        }
    }
}

impl std::fmt::Debug for CacheNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheNamespace")
            .field("name", &self.name.render())
            .field("max_items", &self.max_items)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn ephemeral(max_items: usize) -> CacheNamespace {
        CacheNamespace::ephemeral(CacheName::new(CacheKind::Api, "v1"), max_items)
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse::ok_json(&json!({ "body": body }))
    }

    #[test]
    fn names_render_and_parse() {
        let name = CacheName::new(CacheKind::Pages, "2024-06-01");
        assert_eq!(name.render(), "vetsync-pages-2024-06-01");
        assert_eq!(CacheName::parse("vetsync-pages-2024-06-01"), Some(name));

        assert_eq!(CacheName::parse("vetsync-pages-"), None);
        assert_eq!(CacheName::parse("vetsync-bogus-v1"), None);
        assert_eq!(CacheName::parse("other-pages-v1"), None);
    }

    #[test]
    fn only_status_200_is_cached() {
        let mut ns = ephemeral(10);
        assert!(!ns.insert("/api/pets", &HttpResponse::json(201, &json!({}))).unwrap());
        assert!(!ns.insert("/api/pets", &HttpResponse::json(404, &json!({}))).unwrap());
        assert!(!ns.insert("/api/pets", &HttpResponse::json(500, &json!({}))).unwrap());
        assert!(ns.is_empty());

        assert!(ns.insert("/api/pets", &ok("x")).unwrap());
        assert_eq!(ns.len(), 1);
    }

    #[test]
    fn eviction_is_strict_insertion_order() {
        let mut ns = ephemeral(3);
        for i in 0..5 {
            ns.insert(&format!("/p{i}"), &ok("x")).unwrap();
        }
        assert_eq!(ns.paths(), vec!["/p2", "/p3", "/p4"]);
    }

    #[test]
    fn refresh_keeps_original_position() {
        let mut ns = ephemeral(3);
        ns.insert("/a", &ok("1")).unwrap();
        ns.insert("/b", &ok("1")).unwrap();
        ns.insert("/a", &ok("2")).unwrap();
        ns.insert("/c", &ok("1")).unwrap();
        // /a was refreshed, not re-inserted: it is still the oldest
        ns.insert("/d", &ok("1")).unwrap();
        assert_eq!(ns.paths(), vec!["/b", "/c", "/d"]);
    }

    #[test]
    fn remove_matching_ignores_query_strings() {
        let mut ns = ephemeral(10);
        ns.insert("/api/pets", &ok("list")).unwrap();
        ns.insert("/api/pets?page=2", &ok("page2")).unwrap();
        ns.insert("/api/rooms", &ok("rooms")).unwrap();

        assert_eq!(ns.remove_matching("/api/pets").unwrap(), 2);
        assert_eq!(ns.paths(), vec!["/api/rooms"]);
    }

    #[test]
    fn persisted_namespace_replays() {
        use vetsync_storage::{FramedLog, InMemoryBackend};

        let name = CacheName::new(CacheKind::Pages, "v1");
        let mut ns = CacheNamespace::open(
            name.clone(),
            10,
            FramedLog::new(Box::new(InMemoryBackend::new()), false),
        )
        .unwrap();
        ns.insert("/dashboard", &ok("x")).unwrap();
        ns.insert("/pets", &ok("y")).unwrap();
        ns.remove_matching("/pets").unwrap();

        // Re-replay the same backing bytes
        let log = ns.log.take().unwrap();
        let reopened = CacheNamespace::open(name, 10, log).unwrap();
        assert_eq!(reopened.paths(), vec!["/dashboard"]);
    }

    proptest! {
        // FIFO bound: after any insert sequence the namespace holds the
        // last max_items distinct paths, in first-insertion order
        #[test]
        fn fifo_eviction_holds(paths in proptest::collection::vec("/[a-z]{1,6}", 1..40), max in 1usize..8) {
            let mut ns = ephemeral(max);
            let mut model: Vec<String> = Vec::new();
            for p in &paths {
                ns.insert(p, &ok("x")).unwrap();
                if !model.contains(p) {
                    model.push(p.clone());
                }
                while model.len() > max {
                    model.remove(0);
                }
            }
            prop_assert!(ns.len() <= max);
            prop_assert_eq!(ns.paths(), model);
        }
    }
}
