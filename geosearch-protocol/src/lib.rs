//! Wire types for geosearch plugins.
//!
//! This crate defines the contract between a plugin host and the search
//! plugins it loads: the parameter-map request, the response envelope
//! with its result entries and style registry, and the preference set a
//! plugin resolves per request. These types are shared by:
//!
//! - The plugin host (request construction, response consumption)
//! - Plugin implementations (response assembly)
//! - The presentation layer that serializes responses for a map client
//!
//! Serialization of a [`SearchResponse`] to a client format (KML,
//! GeoJSON) is the presentation layer's job; everything here is plain
//! data with serde derives.
//!
//! # Example
//!
//! ```
//! use geosearch_protocol::{SearchContainer, SearchRequest};
//!
//! let request = SearchRequest::new().with_param("neighborhood", "Mission");
//! assert!(request.contains("neighborhood"));
//!
//! let container = SearchContainer::new(request);
//! assert!(container.responses().is_empty());
//! ```

mod preferences;
mod request;
mod response;
mod style;

pub use preferences::PluginPreferences;
pub use request::{SearchContainer, SearchRequest};
pub use response::{GeomMetadata, ResultEntry, SearchResponse};
pub use style::{keys, StyleDefinition, StyleRegistry};
