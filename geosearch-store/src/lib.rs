//! Datastore abstraction for geosearch plugins.
//!
//! A plugin talks to its spatial datastore through two traits:
//!
//! - [`Connector`]: establishes a connection from a [`StoreConfig`] —
//!   owned by the plugin's `init` phase
//! - [`Datastore`]: executes parameterized [`AttributeQuery`] values and
//!   streams [`Row`]s back — owned by the search phase
//!
//! The split keeps connection establishment (which may fail and be
//! retried across `init` calls) out of the query path, and lets tests
//! and embedded deployments swap in [`MemoryDatastore`] without touching
//! plugin code.
//!
//! Queries are always parameterized: the search term travels as a bound
//! parameter, never interpolated into query text. Rows expose typed
//! named-column accessors; the geometry column carries transport-encoded
//! WKB exactly as a SQL-backed store would return it.

mod config;
mod datastore;
mod error;
mod memory;
mod query;
mod row;

pub use config::{StoreConfig, DEFAULT_POOL_SIZE};
pub use datastore::{Connector, Datastore, RowStream};
pub use error::{Result, StoreError};
pub use memory::{MemoryConnector, MemoryDatastore};
pub use query::{AttributeQuery, AREA_COLUMN, GEOMETRY_COLUMN, PERIMETER_COLUMN};
pub use row::{ColumnValue, Row};
