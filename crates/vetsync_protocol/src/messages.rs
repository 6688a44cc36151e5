//! Control protocol between the application shell and the cache router.
//!
//! Both directions are sum types handled by exhaustive `match`, so adding a
//! message kind is a compile-time-checked change everywhere it is handled.
//! Wire tags use the shell's SCREAMING_SNAKE_CASE message names.

use serde::{Deserialize, Serialize};

/// A message from the application shell to the cache router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShellMessage {
    /// Activate the new router version immediately.
    SkipWaiting,
    /// Proactively cache one URL into the static namespace.
    CacheUrl {
        /// The URL to fetch and cache.
        url: String,
    },
    /// Proactively warm a list of routes (post-authentication warming).
    ///
    /// The router replies with [`RouterMessage::CacheRoutesComplete`].
    CacheRoutes {
        /// The routes to fetch and cache.
        routes: Vec<String>,
    },
    /// Delete all cache namespaces.
    ClearCache,
}

/// A message from the cache router to the application shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouterMessage {
    /// A non-GET request failed while offline.
    ///
    /// The shell hands the payload to the sync queue manager.
    RequestFailed {
        /// The requested URL.
        url: String,
        /// The HTTP method of the failed request.
        method: String,
        /// Milliseconds since epoch when the failure was observed.
        #[serde(rename = "timestamp")]
        timestamp_ms: u64,
    },
    /// Reply to [`ShellMessage::CacheRoutes`] with warming results.
    CacheRoutesComplete {
        /// Total routes requested.
        total: usize,
        /// Routes fetched and cached successfully.
        cached: usize,
        /// Routes that failed to fetch.
        failed: usize,
    },
    /// A background sync attempt has started.
    SyncStarted,
    /// A background sync attempt has completed.
    SyncCompleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_message_wire_tags() {
        let msg = ShellMessage::CacheRoutes {
            routes: vec!["/dashboard".into()],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "CACHE_ROUTES");
        assert_eq!(json["routes"][0], "/dashboard");

        let back: ShellMessage =
            serde_json::from_str(r#"{"type":"SKIP_WAITING"}"#).unwrap();
        assert_eq!(back, ShellMessage::SkipWaiting);
    }

    #[test]
    fn router_message_wire_tags() {
        let msg = RouterMessage::RequestFailed {
            url: "/api/pets".into(),
            method: "POST".into(),
            timestamp_ms: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "REQUEST_FAILED");
        assert_eq!(json["timestamp"], 1_700_000_000_000u64);

        let complete = RouterMessage::CacheRoutesComplete {
            total: 5,
            cached: 4,
            failed: 1,
        };
        let json = serde_json::to_value(&complete).unwrap();
        assert_eq!(json["type"], "CACHE_ROUTES_COMPLETE");
    }

    #[test]
    fn lifecycle_messages_roundtrip() {
        for msg in [RouterMessage::SyncStarted, RouterMessage::SyncCompleted] {
            let encoded = serde_json::to_string(&msg).unwrap();
            let decoded: RouterMessage = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, msg);
        }
    }
}
