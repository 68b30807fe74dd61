//! Datastore and connector traits.

use crate::config::StoreConfig;
use crate::error::Result;
use crate::query::AttributeQuery;
use crate::row::Row;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt::Debug;
use std::sync::Arc;

/// Lazy sequence of result rows.
///
/// Row-level errors (a backend hiccup mid-scan) surface as stream items;
/// query-level failures are the `execute` result itself — execution is
/// all-or-nothing at the query level.
pub type RowStream = BoxStream<'static, Result<Row>>;

/// A live datastore connection.
///
/// Implementations own their concurrency discipline: a SQL-backed store
/// is expected to pool physical connections so concurrent searches do
/// not serialize on one handle; the in-memory store locks internally.
#[async_trait]
pub trait Datastore: Debug + Send + Sync {
    /// Execute a parameterized attribute query.
    ///
    /// `timeout_ms` bounds execution; expiry is reported as a query
    /// error carrying the elapsed bound. Returns the row stream, or the
    /// datastore's diagnostic on failure — never a partial stream.
    async fn execute(&self, query: &AttributeQuery, timeout_ms: Option<u64>) -> Result<RowStream>;

    /// Cheap liveness probe, used at plugin init.
    async fn ping(&self) -> Result<()>;

    /// Release the connection. Idempotent; later `execute` calls fail.
    async fn close(&self) -> Result<()>;
}

/// Connection factory, owned by the plugin's init phase.
///
/// Kept separate from [`Datastore`] so a failed `init` can be retried —
/// the connector is long-lived, connections are not necessarily so.
#[async_trait]
pub trait Connector: Debug + Send + Sync {
    /// Open a connection per `config`.
    async fn connect(&self, config: &StoreConfig) -> Result<Arc<dyn Datastore>>;
}
