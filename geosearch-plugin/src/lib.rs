//! Search plugin contract and implementations.
//!
//! A plugin host loads search plugins behind the [`SearchPlugin`]
//! capability trait: any datastore-backed implementation (relational,
//! in-memory, file-based) satisfies the same five operations and can be
//! swapped without host changes.
//!
//! # Architecture
//!
//! - [`SearchPlugin`]: the host contract — `init`, `is_request_valid`,
//!   `do_search`, `close`, `default_preferences`
//! - [`NeighborhoodPlugin`]: the concrete plugin searching a
//!   neighborhood table by substring and decoding WKB geometry
//! - [`ResponseAssembler`]: folds result rows into a styled response
//! - [`PluginError`]: the failure taxonomy; its `Display` text is the
//!   message reported in responses
//!
//! # Lifecycle
//!
//! `Uninitialized -> Ready -> Closed`. A failed `init` leaves the plugin
//! uninitialized and may be retried; searching without a usable
//! connection is a reported failure, not a panic. Searches never change
//! lifecycle state.
//!
//! # Example
//!
//! ```ignore
//! use geosearch_plugin::{NeighborhoodPlugin, PluginConfig, SearchPlugin};
//! use geosearch_protocol::{SearchContainer, SearchRequest};
//! use geosearch_store::{MemoryConnector, StoreConfig};
//!
//! let plugin = NeighborhoodPlugin::new(connector);
//! assert!(plugin.init(&PluginConfig::new(StoreConfig::new("memory://"))).await);
//!
//! let request = SearchRequest::new().with_param("neighborhood", "Mission");
//! let mut container = SearchContainer::new(request);
//! let ok = plugin.do_search(&mut container).await;
//! ```

mod assemble;
mod error;
mod neighborhood;

pub use assemble::{format_description, ResponseAssembler};
pub use error::{PluginError, Result};
pub use neighborhood::{
    NeighborhoodPlugin, DATA_STORE_NAME, NEIGHBORHOOD_KEY, NEIGHBORHOOD_STYLE, QUERY_KEY,
};

use async_trait::async_trait;
use geosearch_protocol::{PluginPreferences, SearchContainer, SearchRequest};
use geosearch_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

/// What to do when one row fails mid-iteration.
///
/// `Abort` is fail-closed: the first failure marks the response
/// unsuccessful and stops iteration, keeping any entries already
/// appended. `Skip` drops the bad row with a warning and keeps the
/// response successful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// Fail the whole search on the first bad row.
    #[default]
    Abort,
    /// Skip bad rows, recording a warning per skip.
    Skip,
}

/// Configuration handed to [`SearchPlugin::init`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Datastore connection settings.
    pub store: StoreConfig,

    /// Row-failure policy for `do_search`.
    #[serde(default)]
    pub row_error_policy: RowErrorPolicy,

    /// Per-search deadline covering query execution and row iteration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_timeout_ms: Option<u64>,
}

impl PluginConfig {
    /// Create a config with default policy and no deadline.
    pub fn new(store: StoreConfig) -> Self {
        Self {
            store,
            row_error_policy: RowErrorPolicy::default(),
            search_timeout_ms: None,
        }
    }

    /// Set the row-failure policy.
    pub fn with_row_error_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.row_error_policy = policy;
        self
    }

    /// Set the per-search deadline.
    pub fn with_search_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.search_timeout_ms = Some(timeout_ms);
        self
    }
}

/// The host plugin contract.
///
/// A host may call `do_search` concurrently from independent request
/// contexts; implementations are `Send + Sync` and keep lifecycle state
/// behind interior mutability.
#[async_trait]
pub trait SearchPlugin: Debug + Send + Sync {
    /// Open the datastore connection.
    ///
    /// Returns `false` on any connectivity failure — never panics — and
    /// leaves the plugin uninitialized; calling again re-attempts.
    async fn init(&self, config: &PluginConfig) -> bool;

    /// Whether the request carries a key this plugin recognizes.
    ///
    /// Pure; no side effects.
    fn is_request_valid(&self, request: &SearchRequest) -> bool;

    /// Run the search and append exactly one response to the container.
    ///
    /// Returns `true` only if the query executed and every row was
    /// decoded and assembled. Any failure sets the response's success
    /// flag to `false` with a message — the caller always receives a
    /// response object, never a bare failure.
    async fn do_search(&self, container: &mut SearchContainer) -> bool;

    /// Release the datastore connection. No-op if never opened; must
    /// not fail.
    async fn close(&self);

    /// The plugin's default preferences with `overrides` merged on top.
    ///
    /// Pure with respect to plugin state.
    fn default_preferences(&self, overrides: &HashMap<String, String>) -> PluginPreferences;
}
