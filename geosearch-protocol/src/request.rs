//! Search request types.

use crate::response::SearchResponse;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A search request: a flat mapping from parameter name to value.
///
/// Keys are unique and insertion order is irrelevant. A request is only
/// meaningful to a plugin that recognizes at least one of its keys;
/// validity is the plugin's call (`is_request_valid`), not a property of
/// the map itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchRequest {
    params: HashMap<String, String>,
}

impl SearchRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a request from parameter pairs.
    pub fn from_params<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Add a parameter, replacing any existing value for the key.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Look up a parameter value.
    pub fn item(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Whether the request carries the given parameter.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Whether the request carries no parameters at all.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The raw parameter map.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }
}

/// Host-owned container handed to a plugin's `do_search`.
///
/// Owns the request plus every response accumulated during the search
/// phase. A plugin appends exactly one response per invocation, success
/// or failure — the host always gets a response object back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchContainer {
    request: SearchRequest,
    responses: Vec<SearchResponse>,
}

impl SearchContainer {
    /// Create a container for one request.
    pub fn new(request: SearchRequest) -> Self {
        Self {
            request,
            responses: Vec::new(),
        }
    }

    /// The search request under evaluation.
    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    /// Append a plugin's response.
    pub fn add_response(&mut self, response: SearchResponse) {
        self.responses.push(response);
    }

    /// Responses accumulated so far, in plugin invocation order.
    pub fn responses(&self) -> &[SearchResponse] {
        &self.responses
    }

    /// Consume the container, yielding its responses.
    pub fn into_responses(self) -> Vec<SearchResponse> {
        self.responses
    }
}
