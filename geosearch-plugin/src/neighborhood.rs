//! The neighborhood search plugin.
//!
//! Searches a San Francisco neighborhood table by case-insensitive
//! substring, decodes each row's transport-encoded WKB geometry, and
//! returns styled results. The lifecycle, failure handling, and response
//! semantics here are the template for other datastore-backed plugins.

use crate::assemble::ResponseAssembler;
use crate::error::PluginError;
use crate::{PluginConfig, RowErrorPolicy, SearchPlugin};
use async_trait::async_trait;
use futures::StreamExt;
use geosearch_protocol::{
    PluginPreferences, SearchContainer, SearchRequest, SearchResponse, StyleDefinition,
};
use geosearch_store::{AttributeQuery, Connector, Datastore, RowStream};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Primary recognized request key.
pub const NEIGHBORHOOD_KEY: &str = "neighborhood";
/// Alternate free-text key, as sent by generic search boxes.
pub const QUERY_KEY: &str = "q";
/// Style id attached to every result of this plugin.
pub const NEIGHBORHOOD_STYLE: &str = "neighborhood_style";
/// Datastore display name reported in responses.
pub const DATA_STORE_NAME: &str = "San Francisco Neighborhoods";

const TABLE: &str = "san_francisco_neighborhoods";
const MATCH_COLUMN: &str = "nbrhood";
const SNIPPET_COLUMN: &str = "sfar_distr";

/// Built-in style defaults, overridable per request.
const DEFAULT_PREFERENCES: [(&str, &str); 11] = [
    ("balloonstyle.bgcolor", "ffffffff"),
    ("balloonstyle.textcolor", "ff000000"),
    ("balloonstyle.text", "$[description]"),
    ("iconstyle.scale", "1.0"),
    ("iconstyle.href", "icons/placemark_circle.png"),
    ("linestyle.color", "ff00ffff"),
    ("linestyle.width", "2"),
    ("polystyle.color", "7f00ff00"),
    ("polystyle.colormode", "normal"),
    ("polystyle.fill", "1"),
    ("polystyle.outline", "1"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Uninitialized,
    Ready,
    Closed,
}

#[derive(Debug)]
struct Inner {
    state: LifecycleState,
    store: Option<Arc<dyn Datastore>>,
    policy: RowErrorPolicy,
    timeout_ms: Option<u64>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            store: None,
            policy: RowErrorPolicy::default(),
            timeout_ms: None,
        }
    }
}

/// Neighborhood search plugin over any [`Connector`].
///
/// The connector is fixed at construction; the connection handle is
/// established by `init` and owned until `close`. Lifecycle state lives
/// behind a `std::sync::RwLock` that is never held across an `.await`,
/// so a host may run concurrent searches on one instance.
#[derive(Debug)]
pub struct NeighborhoodPlugin<C> {
    connector: C,
    inner: RwLock<Inner>,
}

impl<C: Connector> NeighborhoodPlugin<C> {
    /// Create an uninitialized plugin over `connector`.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Whether `init` has succeeded and `close` has not run.
    pub fn is_ready(&self) -> bool {
        self.inner
            .read()
            .map(|inner| inner.state == LifecycleState::Ready)
            .unwrap_or(false)
    }

    /// The search term, if the request carries a recognized key.
    fn search_term(request: &SearchRequest) -> Option<&str> {
        request.item(NEIGHBORHOOD_KEY).or_else(|| request.item(QUERY_KEY))
    }

    /// Snapshot the state needed for one search invocation.
    fn snapshot(&self) -> (Option<Arc<dyn Datastore>>, RowErrorPolicy, Option<u64>) {
        match self.inner.read() {
            Ok(inner) => {
                let store = match inner.state {
                    LifecycleState::Ready => inner.store.clone(),
                    _ => None,
                };
                (store, inner.policy, inner.timeout_ms)
            }
            Err(_) => (None, RowErrorPolicy::default(), None),
        }
    }

    /// Everything between request validation and the last row.
    ///
    /// Failures return early; the caller folds the error into the
    /// response so the host still gets a response object.
    async fn run_search(
        &self,
        request: &SearchRequest,
        store: Option<Arc<dyn Datastore>>,
        timeout_ms: Option<u64>,
        assembler: &mut ResponseAssembler,
    ) -> Result<(), PluginError> {
        let store = store.ok_or(PluginError::ConnectionUnavailable)?;
        let term = Self::search_term(request).ok_or(PluginError::UnrecognizedRequest)?;
        assembler.set_search_term(term);

        let query = AttributeQuery::substring(TABLE, MATCH_COLUMN, term)
            .with_attribute_column(SNIPPET_COLUMN)
            .with_attribute_column(MATCH_COLUMN);

        let deadline = timeout_ms.map(|ms| (Instant::now() + Duration::from_millis(ms), ms));
        let mut rows = store
            .execute(&query, timeout_ms)
            .await
            .map_err(PluginError::from_query)?;

        while let Some(item) = next_row(&mut rows, deadline).await? {
            let row = item.map_err(|e| PluginError::Results(e.to_string()))?;
            if !assembler.push_row(&row) {
                break;
            }
        }
        Ok(())
    }
}

/// Pull the next row, bounded by the search deadline if one is set.
async fn next_row(
    rows: &mut RowStream,
    deadline: Option<(Instant, u64)>,
) -> Result<Option<geosearch_store::Result<geosearch_store::Row>>, PluginError> {
    match deadline {
        None => Ok(rows.next().await),
        Some((at, ms)) => tokio::time::timeout_at(at, rows.next())
            .await
            .map_err(|_| PluginError::Timeout(ms)),
    }
}

#[async_trait]
impl<C: Connector> SearchPlugin for NeighborhoodPlugin<C> {
    async fn init(&self, config: &PluginConfig) -> bool {
        let store = match self.connector.connect(&config.store).await {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!(url = %config.store.url, error = %err, "Datastore connection failed");
                return false;
            }
        };
        if let Err(err) = store.ping().await {
            tracing::warn!(url = %config.store.url, error = %err, "Datastore ping failed");
            return false;
        }

        match self.inner.write() {
            Ok(mut inner) => {
                inner.state = LifecycleState::Ready;
                inner.store = Some(store);
                inner.policy = config.row_error_policy;
                inner.timeout_ms = config.search_timeout_ms;
                tracing::debug!(url = %config.store.url, "Neighborhood plugin ready");
                true
            }
            Err(_) => false,
        }
    }

    fn is_request_valid(&self, request: &SearchRequest) -> bool {
        Self::search_term(request).is_some()
    }

    async fn do_search(&self, container: &mut SearchContainer) -> bool {
        let request = container.request().clone();
        let preferences = self.default_preferences(request.params());
        let style = StyleDefinition::from_preferences(&preferences);
        let (store, policy, timeout_ms) = self.snapshot();

        let mut assembler = ResponseAssembler::new(
            SearchResponse::new(DATA_STORE_NAME),
            policy,
            NEIGHBORHOOD_STYLE,
            style,
            MATCH_COLUMN,
            SNIPPET_COLUMN,
        );

        if let Err(err) = self
            .run_search(&request, store, timeout_ms, &mut assembler)
            .await
        {
            tracing::debug!(error = %err, "Neighborhood search failed");
            assembler.fail(&err);
        }

        let response = assembler.finish();
        let success = response.success;
        if success {
            tracing::debug!(results = response.results.len(), "Neighborhood search done");
        }
        container.add_response(response);
        success
    }

    async fn close(&self) {
        let store = match self.inner.write() {
            Ok(mut inner) => {
                inner.state = LifecycleState::Closed;
                inner.store.take()
            }
            Err(_) => None,
        };
        if let Some(store) = store {
            if let Err(err) = store.close().await {
                tracing::debug!(error = %err, "Datastore close reported an error");
            }
        }
    }

    fn default_preferences(&self, overrides: &HashMap<String, String>) -> PluginPreferences {
        let mut preferences = PluginPreferences::from_pairs(DEFAULT_PREFERENCES);
        preferences.apply_overrides(overrides);
        preferences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validity() {
        let plugin = NeighborhoodPlugin::new(geosearch_store::MemoryConnector::default());

        let valid = SearchRequest::new().with_param(NEIGHBORHOOD_KEY, "Mission");
        let free_text = SearchRequest::new().with_param(QUERY_KEY, "mission");
        let invalid = SearchRequest::new().with_param("street", "Valencia");

        assert!(plugin.is_request_valid(&valid));
        assert!(plugin.is_request_valid(&free_text));
        assert!(!plugin.is_request_valid(&invalid));
        assert!(!plugin.is_request_valid(&SearchRequest::new()));
    }

    #[test]
    fn test_term_prefers_neighborhood_key() {
        let request = SearchRequest::new()
            .with_param(QUERY_KEY, "fallback")
            .with_param(NEIGHBORHOOD_KEY, "primary");
        assert_eq!(
            NeighborhoodPlugin::<geosearch_store::MemoryConnector>::search_term(&request),
            Some("primary")
        );
    }

    #[test]
    fn test_default_preferences_merge() {
        let plugin = NeighborhoodPlugin::new(geosearch_store::MemoryConnector::default());

        let defaults = plugin.default_preferences(&HashMap::new());
        assert_eq!(defaults.get("linestyle.width"), Some("2"));
        assert_eq!(defaults.len(), DEFAULT_PREFERENCES.len());

        let overridden = plugin.default_preferences(&HashMap::from([
            ("linestyle.width".to_string(), "5".to_string()),
            ("renderer.special".to_string(), "on".to_string()),
        ]));
        assert_eq!(overridden.get("linestyle.width"), Some("5"));
        assert_eq!(overridden.get("linestyle.color"), Some("ff00ffff"));
        assert_eq!(overridden.get("renderer.special"), Some("on"));
    }
}
