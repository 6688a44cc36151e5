//! The edge cache router.
//!
//! Intercepts every request the client shell issues and answers it from
//! the network, a versioned cache namespace, or a blend of both according
//! to the request's [`RouteClass`]. The router also speaks the shell
//! control protocol and keeps an outbox of notifications for the shell to
//! drain.

use crate::config::RouterConfig;
use crate::error::CacheResult;
use crate::namespace::{CacheKind, CacheName, CacheNamespace};
use crate::routes::{Classification, RouteClass};
use crate::storage::CacheStorage;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use vetsync_protocol::{now_ms, HttpRequest, HttpResponse, RouterMessage, ShellMessage};

/// Errors a fetch implementation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The network is down or the server unreachable.
    #[error("network unreachable")]
    Unreachable,
    /// The request exceeded its timeout budget.
    #[error("fetch timed out")]
    Timeout,
}

/// The router's only path to the network.
///
/// Navigation requests carry the router's timeout budget in
/// [`HttpRequest::timeout_ms`]; implementations are expected to honor it.
pub trait Fetch: Send + Sync {
    /// Performs the request against the real network.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure; HTTP error statuses
    /// come back as `Ok`.
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// A scriptable fetch for tests: fixed responses per path, plus a global
/// offline switch.
#[derive(Default)]
pub struct ScriptedFetch {
    routes: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
    offline: std::sync::atomic::AtomicBool,
}

impl ScriptedFetch {
    /// Creates an online fetch with no routes (everything 404s).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a path to a fixed response.
    #[must_use]
    pub fn with_route(self, path: impl Into<String>, response: HttpResponse) -> Self {
        self.routes.lock().insert(path.into(), response);
        self
    }

    /// Replaces the response for a path after construction.
    pub fn set_route(&self, path: impl Into<String>, response: HttpResponse) {
        self.routes.lock().insert(path.into(), response);
    }

    /// Simulates connectivity loss or recovery.
    pub fn set_online(&self, online: bool) {
        self.offline
            .store(!online, std::sync::atomic::Ordering::SeqCst);
    }

    /// Returns every request fetched so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

impl Fetch for ScriptedFetch {
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        self.requests.lock().push(request.clone());
        if self.offline.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(FetchError::Unreachable);
        }
        Ok(self
            .routes
            .lock()
            .get(&request.path)
            .cloned()
            .unwrap_or_else(|| HttpResponse::json(404, &json!({ "error": "not found" }))))
    }
}

/// Counts from a warming pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmReport {
    /// Routes attempted.
    pub total: usize,
    /// Routes fetched and cached.
    pub cached: usize,
    /// Routes that failed to fetch or were refused by the cache.
    pub failed: usize,
}

/// A queued background refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Revalidation {
    path: String,
    kind: CacheKind,
}

// Fallback placeholder when the online-only page was never cached.
const ONLINE_ONLY_FALLBACK: &str =
    "<html><body><h1>Connection required</h1><p>{{path}} needs a network connection.</p></body></html>";

/// The edge cache router.
pub struct EdgeCacheRouter<F: Fetch> {
    config: RouterConfig,
    storage: CacheStorage,
    fetch: Arc<F>,
    namespaces: Mutex<HashMap<CacheKind, CacheNamespace>>,
    revalidations: Mutex<VecDeque<Revalidation>>,
    outbox: Mutex<Vec<RouterMessage>>,
}

impl<F: Fetch> EdgeCacheRouter<F> {
    /// Creates a router, opening the current version's namespaces.
    ///
    /// # Errors
    ///
    /// Returns an error if a namespace file cannot be created.
    pub fn new(config: RouterConfig, storage: CacheStorage, fetch: Arc<F>) -> CacheResult<Self> {
        let mut namespaces = HashMap::new();
        for kind in CacheKind::ALL {
            let name = CacheName::new(kind, config.version.clone());
            namespaces.insert(kind, storage.open_namespace(&name, config.limits.for_kind(kind))?);
        }
        Ok(Self {
            config,
            storage,
            fetch,
            namespaces: Mutex::new(namespaces),
            revalidations: Mutex::new(VecDeque::new()),
            outbox: Mutex::new(Vec::new()),
        })
    }

    /// Answers one request according to its route class.
    ///
    /// This is total over transport failures: the fallback chains absorb
    /// them, and the worst case is a structured 503 or (for writes) a 202
    /// queued-for-later response.
    ///
    /// # Errors
    ///
    /// Returns an error only if a cache write fails.
    pub fn handle(&self, request: &HttpRequest) -> CacheResult<HttpResponse> {
        let classification = self
            .config
            .routes
            .classify(request.method, &request.path);
        debug!(
            method = %request.method,
            path = %request.path,
            class = ?classification.class,
            "routing request"
        );

        match classification.class {
            RouteClass::Navigation => self.handle_navigation(request, classification),
            RouteClass::ImmutableAsset => self.stale_while_revalidate(request, CacheKind::Static),
            RouteClass::VersionedData => self.stale_while_revalidate(request, CacheKind::Data),
            RouteClass::ApiRead => self.stale_while_revalidate(request, CacheKind::Api),
            RouteClass::ApiWrite => self.handle_api_write(request),
            RouteClass::Media => self.cache_first(request, CacheKind::Media),
            RouteClass::Default => self.network_first(request, CacheKind::Static),
        }
    }

    /// Navigation: network-first with a short timeout; fallback chain is
    /// page cache, static cache, offline page. Online-only routes never
    /// serve stale; their failure is a 503 built from the placeholder.
    fn handle_navigation(
        &self,
        request: &HttpRequest,
        classification: Classification,
    ) -> CacheResult<HttpResponse> {
        let bounded = request
            .clone()
            .with_timeout_ms(self.config.navigation_timeout_ms);

        match self.fetch.fetch(&bounded) {
            Ok(response) => {
                if !classification.online_only {
                    self.insert(CacheKind::Pages, &request.path, &response)?;
                }
                Ok(response)
            }
            Err(err) => {
                debug!(path = %request.path, error = %err, "navigation fetch failed");
                if classification.online_only {
                    return Ok(self.online_only_response(&request.path));
                }
                if let Some(cached) = self.lookup(CacheKind::Pages, &request.path) {
                    return Ok(cached);
                }
                if let Some(cached) = self.lookup(CacheKind::Static, &request.path) {
                    return Ok(cached);
                }
                if let Some(offline) = self.lookup(CacheKind::Pages, &self.config.offline_page) {
                    return Ok(offline);
                }
                Ok(service_unavailable(&request.path))
            }
        }
    }

    /// Serve cached immediately and refresh in the background; go to the
    /// network only on a miss.
    fn stale_while_revalidate(
        &self,
        request: &HttpRequest,
        kind: CacheKind,
    ) -> CacheResult<HttpResponse> {
        if let Some(cached) = self.lookup(kind, &request.path) {
            self.revalidations.lock().push_back(Revalidation {
                path: request.path.clone(),
                kind,
            });
            return Ok(cached);
        }

        match self.fetch.fetch(request) {
            Ok(response) => {
                self.insert(kind, &request.path, &response)?;
                Ok(response)
            }
            Err(err) => {
                debug!(path = %request.path, error = %err, "uncached read failed");
                Ok(service_unavailable(&request.path))
            }
        }
    }

    /// Network-only; a transport failure synthesizes a 202 and notifies
    /// the shell so the operation can be queued.
    fn handle_api_write(&self, request: &HttpRequest) -> CacheResult<HttpResponse> {
        match self.fetch.fetch(request) {
            Ok(response) => Ok(response),
            Err(err) => {
                let timestamp_ms = now_ms();
                info!(
                    method = %request.method,
                    path = %request.path,
                    error = %err,
                    "write failed offline, handing to sync queue"
                );
                self.outbox.lock().push(RouterMessage::RequestFailed {
                    url: request.path.clone(),
                    method: request.method.as_str().to_string(),
                    timestamp_ms,
                });
                Ok(HttpResponse::json(
                    202,
                    &json!({
                        "queued": true,
                        "url": request.path,
                        "method": request.method.as_str(),
                        "timestamp": timestamp_ms,
                    }),
                ))
            }
        }
    }

    fn cache_first(&self, request: &HttpRequest, kind: CacheKind) -> CacheResult<HttpResponse> {
        if let Some(cached) = self.lookup(kind, &request.path) {
            return Ok(cached);
        }
        match self.fetch.fetch(request) {
            Ok(response) => {
                self.insert(kind, &request.path, &response)?;
                Ok(response)
            }
            Err(err) => {
                debug!(path = %request.path, error = %err, "media fetch failed");
                Ok(service_unavailable(&request.path))
            }
        }
    }

    fn network_first(&self, request: &HttpRequest, kind: CacheKind) -> CacheResult<HttpResponse> {
        match self.fetch.fetch(request) {
            Ok(response) => {
                self.insert(kind, &request.path, &response)?;
                Ok(response)
            }
            Err(_) => match self.lookup(kind, &request.path) {
                Some(cached) => Ok(cached),
                None => Ok(service_unavailable(&request.path)),
            },
        }
    }

    /// Drains the deferred revalidation queue.
    ///
    /// Refetches each queued path and overwrites the cache entry on 200;
    /// failures are swallowed, the stale entry stays authoritative.
    /// Returns the number of entries refreshed.
    ///
    /// # Errors
    ///
    /// Returns an error only if a cache write fails.
    pub fn run_revalidations(&self) -> CacheResult<usize> {
        let queued: Vec<Revalidation> = self.revalidations.lock().drain(..).collect();
        let mut refreshed = 0;

        for job in queued {
            match self.fetch.fetch(&HttpRequest::get(&job.path)) {
                Ok(response) if response.status == 200 => {
                    self.insert(job.kind, &job.path, &response)?;
                    refreshed += 1;
                }
                Ok(response) => {
                    debug!(path = %job.path, status = response.status, "revalidation refused");
                }
                Err(err) => {
                    debug!(path = %job.path, error = %err, "revalidation failed, keeping stale entry");
                }
            }
        }
        Ok(refreshed)
    }

    /// Warms the offline allow-list, the offline page and the online-only
    /// placeholder into the current version's namespaces.
    ///
    /// # Errors
    ///
    /// Returns an error only if a cache write fails.
    pub fn install(&self) -> CacheResult<WarmReport> {
        let mut routes: Vec<String> = Vec::new();
        for route in self
            .config
            .routes
            .offline_capable_routes()
            .iter()
            .chain(self.config.warm_routes.iter())
        {
            if !routes.contains(route) {
                routes.push(route.clone());
            }
        }

        let mut report = self.warm(&routes)?;

        // The fallback pages always live in the page namespace, whatever
        // the table would classify them as
        for page in [&self.config.offline_page, &self.config.online_only_page] {
            report.total += 1;
            if self.warm_one(page, CacheKind::Pages)? {
                report.cached += 1;
            } else {
                report.failed += 1;
            }
        }
        info!(
            total = report.total,
            cached = report.cached,
            failed = report.failed,
            "install warming finished"
        );
        Ok(report)
    }

    /// Deletes every namespace belonging to another deployment version.
    ///
    /// Returns the rendered names of the deleted namespaces.
    ///
    /// # Errors
    ///
    /// Returns an error if a namespace file cannot be deleted.
    pub fn activate(&self) -> CacheResult<Vec<String>> {
        let deleted = self.storage.activate(&self.config.version)?;
        Ok(deleted.iter().map(CacheName::render).collect())
    }

    /// Handles one shell control message, replying where the protocol
    /// calls for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying cache operation fails.
    pub fn handle_message(&self, message: ShellMessage) -> CacheResult<Option<RouterMessage>> {
        match message {
            ShellMessage::SkipWaiting => {
                self.activate()?;
                Ok(None)
            }
            ShellMessage::CacheUrl { url } => {
                self.warm_one(&url, CacheKind::Static)?;
                Ok(None)
            }
            ShellMessage::CacheRoutes { routes } => {
                let report = self.warm(&routes)?;
                Ok(Some(RouterMessage::CacheRoutesComplete {
                    total: report.total,
                    cached: report.cached,
                    failed: report.failed,
                }))
            }
            ShellMessage::ClearCache => {
                let cleared = self.storage.clear_all()?;
                let mut namespaces = self.namespaces.lock();
                namespaces.clear();
                for kind in CacheKind::ALL {
                    let name = CacheName::new(kind, self.config.version.clone());
                    namespaces.insert(
                        kind,
                        self.storage
                            .open_namespace(&name, self.config.limits.for_kind(kind))?,
                    );
                }
                info!(cleared, "cleared all cache namespaces");
                Ok(None)
            }
        }
    }

    /// Queues a sync-started notification for the shell.
    pub fn notify_sync_started(&self) {
        self.outbox.lock().push(RouterMessage::SyncStarted);
    }

    /// Queues a sync-completed notification for the shell.
    pub fn notify_sync_completed(&self) {
        self.outbox.lock().push(RouterMessage::SyncCompleted);
    }

    /// Drains the outbox of shell notifications.
    #[must_use]
    pub fn take_messages(&self) -> Vec<RouterMessage> {
        std::mem::take(&mut *self.outbox.lock())
    }

    /// Drops cached API reads for the given paths (query strings ignored).
    ///
    /// The sync engine calls this after confirmed pushes and applied
    /// pulls.
    pub fn invalidate_paths(&self, paths: &[String]) {
        let mut namespaces = self.namespaces.lock();
        let Some(api) = namespaces.get_mut(&CacheKind::Api) else {
            return;
        };
        for path in paths {
            match api.remove_matching(path) {
                Ok(removed) if removed > 0 => {
                    debug!(path = %path, removed, "invalidated cached reads");
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(path = %path, error = %err, "invalidation write failed");
                }
            }
        }
    }

    fn warm(&self, routes: &[String]) -> CacheResult<WarmReport> {
        let mut report = WarmReport {
            total: routes.len(),
            ..WarmReport::default()
        };
        for route in routes {
            let kind = match self.config.routes.classify(vetsync_protocol::Method::Get, route).class
            {
                RouteClass::ApiRead => CacheKind::Api,
                RouteClass::ImmutableAsset | RouteClass::Default => CacheKind::Static,
                RouteClass::VersionedData => CacheKind::Data,
                RouteClass::Media => CacheKind::Media,
                RouteClass::Navigation | RouteClass::ApiWrite => CacheKind::Pages,
            };
            if self.warm_one(route, kind)? {
                report.cached += 1;
            } else {
                report.failed += 1;
            }
        }
        Ok(report)
    }

    fn warm_one(&self, route: &str, kind: CacheKind) -> CacheResult<bool> {
        match self.fetch.fetch(&HttpRequest::get(route)) {
            Ok(response) if response.status == 200 => self.insert(kind, route, &response),
            Ok(response) => {
                debug!(route, status = response.status, "warm fetch refused");
                Ok(false)
            }
            Err(err) => {
                debug!(route, error = %err, "warm fetch failed");
                Ok(false)
            }
        }
    }

    fn online_only_response(&self, path: &str) -> HttpResponse {
        let template = self
            .lookup(CacheKind::Pages, &self.config.online_only_page)
            .map_or_else(|| ONLINE_ONLY_FALLBACK.to_string(), |r| r.body_text());
        HttpResponse::html(503, template.replace("{{path}}", path))
    }

    fn lookup(&self, kind: CacheKind, path: &str) -> Option<HttpResponse> {
        self.namespaces.lock().get(&kind)?.lookup(path)
    }

    fn insert(&self, kind: CacheKind, path: &str, response: &HttpResponse) -> CacheResult<bool> {
        let mut namespaces = self.namespaces.lock();
        match namespaces.get_mut(&kind) {
            Some(namespace) => namespace.insert(path, response),
            None => Ok(false),
        }
    }
}

fn service_unavailable(path: &str) -> HttpResponse {
    HttpResponse::json(
        503,
        &json!({ "error": "offline", "path": path }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetsync_protocol::Method;

    fn router(fetch: Arc<ScriptedFetch>) -> EdgeCacheRouter<ScriptedFetch> {
        EdgeCacheRouter::new(RouterConfig::new("v1"), CacheStorage::in_memory(), fetch).unwrap()
    }

    fn html(body: &str) -> HttpResponse {
        HttpResponse::html(200, body)
    }

    #[test]
    fn navigation_is_network_first_with_cache_fallback() {
        let fetch = Arc::new(ScriptedFetch::new().with_route("/dashboard", html("fresh")));
        let r = router(Arc::clone(&fetch));

        let resp = r.handle(&HttpRequest::get("/dashboard")).unwrap();
        assert_eq!(resp.body_text(), "fresh");
        // The navigation attempt carried the timeout budget
        assert_eq!(fetch.requests()[0].timeout_ms, Some(3_000));

        fetch.set_online(false);
        let resp = r.handle(&HttpRequest::get("/dashboard")).unwrap();
        assert_eq!(resp.body_text(), "fresh");
    }

    #[test]
    fn navigation_falls_back_to_offline_page() {
        let fetch = Arc::new(ScriptedFetch::new().with_route("/offline.html", html("offline")));
        let r = router(Arc::clone(&fetch));
        r.install().unwrap();

        fetch.set_online(false);
        let resp = r.handle(&HttpRequest::get("/never-visited")).unwrap();
        assert_eq!(resp.body_text(), "offline");
    }

    #[test]
    fn navigation_total_miss_is_structured_503() {
        let fetch = Arc::new(ScriptedFetch::new());
        let r = router(Arc::clone(&fetch));
        fetch.set_online(false);

        let resp = r.handle(&HttpRequest::get("/never-visited")).unwrap();
        assert_eq!(resp.status, 503);
        let body: serde_json::Value = resp.decode().unwrap();
        assert_eq!(body["path"], "/never-visited");
    }

    #[test]
    fn online_only_routes_never_serve_stale() {
        let fetch = Arc::new(
            ScriptedFetch::new()
                .with_route("/reports/monthly", html("live numbers"))
                .with_route("/online-only.html", html("<p>{{path}} requires a connection</p>")),
        );
        let r = router(Arc::clone(&fetch));
        r.install().unwrap();

        // Visit online: served but never cached
        let resp = r.handle(&HttpRequest::get("/reports/monthly")).unwrap();
        assert_eq!(resp.body_text(), "live numbers");

        fetch.set_online(false);
        let resp = r.handle(&HttpRequest::get("/reports/monthly")).unwrap();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.content_type, "text/html");
        assert_eq!(
            resp.body_text(),
            "<p>/reports/monthly requires a connection</p>"
        );
    }

    #[test]
    fn get_responses_cache_only_on_exactly_200() {
        let fetch = Arc::new(
            ScriptedFetch::new().with_route("/api/pets", HttpResponse::json(500, &json!({}))),
        );
        let r = router(Arc::clone(&fetch));

        r.handle(&HttpRequest::get("/api/pets")).unwrap();
        fetch.set_online(false);
        // Nothing was cached, so the repeat is a total miss
        let resp = r.handle(&HttpRequest::get("/api/pets")).unwrap();
        assert_eq!(resp.status, 503);

        fetch.set_online(true);
        fetch.set_route("/api/pets", HttpResponse::ok_json(&json!({ "pets": [] })));
        r.handle(&HttpRequest::get("/api/pets")).unwrap();
        fetch.set_online(false);
        let resp = r.handle(&HttpRequest::get("/api/pets")).unwrap();
        assert_eq!(resp.status, 200);
    }

    #[test]
    fn cached_api_reads_serve_stale_and_queue_revalidation() {
        let fetch = Arc::new(
            ScriptedFetch::new().with_route("/api/pets", HttpResponse::ok_json(&json!({ "v": 1 }))),
        );
        let r = router(Arc::clone(&fetch));

        r.handle(&HttpRequest::get("/api/pets")).unwrap();
        fetch.set_route("/api/pets", HttpResponse::ok_json(&json!({ "v": 2 })));

        // Cached copy served immediately, refresh deferred
        let resp = r.handle(&HttpRequest::get("/api/pets")).unwrap();
        let body: serde_json::Value = resp.decode().unwrap();
        assert_eq!(body["v"], 1);

        assert_eq!(r.run_revalidations().unwrap(), 1);
        let resp = r.handle(&HttpRequest::get("/api/pets")).unwrap();
        let body: serde_json::Value = resp.decode().unwrap();
        assert_eq!(body["v"], 2);
    }

    #[test]
    fn failed_revalidation_keeps_stale_entry() {
        let fetch = Arc::new(
            ScriptedFetch::new().with_route("/assets/app.js", html("v1 bundle")),
        );
        let r = router(Arc::clone(&fetch));

        r.handle(&HttpRequest::get("/assets/app.js")).unwrap();
        r.handle(&HttpRequest::get("/assets/app.js")).unwrap();

        fetch.set_online(false);
        assert_eq!(r.run_revalidations().unwrap(), 0);
        let resp = r.handle(&HttpRequest::get("/assets/app.js")).unwrap();
        assert_eq!(resp.body_text(), "v1 bundle");
    }

    #[test]
    fn offline_write_synthesizes_queued_response() {
        let fetch = Arc::new(ScriptedFetch::new());
        let r = router(Arc::clone(&fetch));
        fetch.set_online(false);

        let resp = r
            .handle(&HttpRequest::post("/api/pets", json!({ "name": "Biscuit" })))
            .unwrap();
        assert_eq!(resp.status, 202);
        let body: serde_json::Value = resp.decode().unwrap();
        assert_eq!(body["queued"], true);
        assert_eq!(body["url"], "/api/pets");
        assert_eq!(body["method"], "POST");

        let messages = r.take_messages();
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            &messages[0],
            RouterMessage::RequestFailed { url, method, .. }
                if url == "/api/pets" && method == "POST"
        ));
        // The outbox drains once
        assert!(r.take_messages().is_empty());
    }

    #[test]
    fn online_write_passes_through_untouched() {
        let fetch = Arc::new(ScriptedFetch::new());
        let r = router(Arc::clone(&fetch));
        fetch.set_route("/api/pets", HttpResponse::json(422, &json!({ "error": "bad" })));

        let resp = r
            .handle(&HttpRequest::post("/api/pets", json!({})))
            .unwrap();
        // Server rejections are the shell's problem, not the router's
        assert_eq!(resp.status, 422);
        assert!(r.take_messages().is_empty());
    }

    #[test]
    fn media_is_cache_first() {
        let fetch = Arc::new(
            ScriptedFetch::new().with_route("/uploads/pet.jpg", html("bytes-v1")),
        );
        let r = router(Arc::clone(&fetch));

        r.handle(&HttpRequest::get("/uploads/pet.jpg")).unwrap();
        fetch.set_route("/uploads/pet.jpg", html("bytes-v2"));

        // Cache hit: the network is not consulted again
        let count_before = fetch.requests().len();
        let resp = r.handle(&HttpRequest::get("/uploads/pet.jpg")).unwrap();
        assert_eq!(resp.body_text(), "bytes-v1");
        assert_eq!(fetch.requests().len(), count_before);
    }

    #[test]
    fn cache_routes_message_warms_and_reports() {
        let fetch = Arc::new(
            ScriptedFetch::new()
                .with_route("/dashboard", html("dash"))
                .with_route("/pets", html("pets")),
        );
        let r = router(Arc::clone(&fetch));

        let reply = r
            .handle_message(ShellMessage::CacheRoutes {
                routes: vec![
                    "/dashboard".to_string(),
                    "/pets".to_string(),
                    "/missing".to_string(),
                ],
            })
            .unwrap();
        assert_eq!(
            reply,
            Some(RouterMessage::CacheRoutesComplete {
                total: 3,
                cached: 2,
                failed: 1
            })
        );

        fetch.set_online(false);
        let resp = r.handle(&HttpRequest::get("/pets")).unwrap();
        assert_eq!(resp.body_text(), "pets");
    }

    #[test]
    fn clear_cache_message_empties_everything() {
        let fetch = Arc::new(ScriptedFetch::new().with_route("/dashboard", html("dash")));
        let r = router(Arc::clone(&fetch));
        r.handle(&HttpRequest::get("/dashboard")).unwrap();

        assert_eq!(r.handle_message(ShellMessage::ClearCache).unwrap(), None);

        fetch.set_online(false);
        let resp = r.handle(&HttpRequest::get("/dashboard")).unwrap();
        assert_eq!(resp.status, 503);
    }

    #[test]
    fn sync_notifications_accumulate_in_order() {
        let fetch = Arc::new(ScriptedFetch::new());
        let r = router(fetch);
        r.notify_sync_started();
        r.notify_sync_completed();
        assert_eq!(
            r.take_messages(),
            vec![RouterMessage::SyncStarted, RouterMessage::SyncCompleted]
        );
    }

    #[test]
    fn invalidate_paths_drops_cached_reads() {
        let fetch = Arc::new(
            ScriptedFetch::new().with_route("/api/pets", HttpResponse::ok_json(&json!({ "v": 1 }))),
        );
        let r = router(Arc::clone(&fetch));
        r.handle(&HttpRequest::get("/api/pets")).unwrap();

        r.invalidate_paths(&["/api/pets".to_string()]);

        fetch.set_online(false);
        let resp = r.handle(&HttpRequest::get("/api/pets")).unwrap();
        assert_eq!(resp.status, 503);
    }

    #[test]
    fn version_bump_deletes_old_namespaces() {
        use tempfile::tempdir;

        let temp = tempdir().unwrap();
        let fetch = Arc::new(ScriptedFetch::new().with_route("/dashboard", html("dash")));

        {
            let r = EdgeCacheRouter::new(
                RouterConfig::new("v1"),
                CacheStorage::open(temp.path()).unwrap(),
                Arc::clone(&fetch),
            )
            .unwrap();
            r.handle(&HttpRequest::get("/dashboard")).unwrap();
        }

        let r = EdgeCacheRouter::new(
            RouterConfig::new("v2"),
            CacheStorage::open(temp.path()).unwrap(),
            Arc::clone(&fetch),
        )
        .unwrap();
        let deleted = r.handle_message(ShellMessage::SkipWaiting).unwrap();
        assert_eq!(deleted, None);

        let storage = CacheStorage::open(temp.path()).unwrap();
        let remaining = storage.list().unwrap();
        assert!(remaining.iter().all(|n| n.token == "v2"));
        assert_eq!(remaining.len(), 5);
    }

    #[test]
    fn classify_is_wired_by_method() {
        let fetch = Arc::new(ScriptedFetch::new());
        let r = router(Arc::clone(&fetch));
        fetch.set_online(false);

        // A GET and a DELETE to the same path take different strategies
        let read = r.handle(&HttpRequest::get("/api/pets/p1")).unwrap();
        assert_eq!(read.status, 503);
        let write = r
            .handle(&HttpRequest {
                method: Method::Delete,
                path: "/api/pets/p1".to_string(),
                body: None,
                timeout_ms: None,
            })
            .unwrap();
        assert_eq!(write.status, 202);
    }
}
