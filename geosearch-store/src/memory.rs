//! In-memory datastore.
//!
//! Serves two jobs: the fixture backend for plugin tests, and an
//! embedded datastore for deployments without an external spatial
//! database. Features are held as attribute maps plus geometry; `execute`
//! evaluates the substring query in process and emits rows shaped
//! exactly like a SQL-backed store would return them — geometry in
//! base64/XDR transport form, `area` and `perimeter` computed.

use crate::config::StoreConfig;
use crate::datastore::{Connector, Datastore, RowStream};
use crate::error::{Result, StoreError};
use crate::query::{AttributeQuery, AREA_COLUMN, GEOMETRY_COLUMN, PERIMETER_COLUMN};
use crate::row::{ColumnValue, Row};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use geo::Area;
use geo_types::Geometry;
use geosearch_wkb::{encode_transport, perimeter, ByteOrder};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Geometry payload of a stored feature.
#[derive(Debug, Clone)]
enum GeomSource {
    /// Parsed geometry, transport-encoded on demand.
    Geometry(Geometry<f64>),
    /// Pre-encoded transport bytes, emitted verbatim.
    ///
    /// Lets tests seed rows whose geometry bytes are deliberately
    /// malformed, which no parsed-geometry path can produce.
    Transport(Vec<u8>),
}

#[derive(Debug, Clone)]
struct Feature {
    attributes: HashMap<String, String>,
    geom: GeomSource,
}

#[derive(Debug, Default)]
struct Inner {
    features: Vec<Feature>,
    closed: bool,
    fail_next: Option<String>,
    latency: Option<Duration>,
}

/// In-process [`Datastore`] over a feature table.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    inner: RwLock<Inner>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a feature with parsed geometry. Rows produced from it get
    /// computed `area`/`perimeter` columns, like a spatial database.
    pub fn insert_feature<K, V>(
        &self,
        attributes: impl IntoIterator<Item = (K, V)>,
        geometry: Geometry<f64>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        self.push(Feature {
            attributes: collect_attrs(attributes),
            geom: GeomSource::Geometry(geometry),
        });
    }

    /// Insert a feature whose geometry column is raw transport bytes.
    pub fn insert_raw_geometry<K, V>(
        &self,
        attributes: impl IntoIterator<Item = (K, V)>,
        transport: Vec<u8>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        self.push(Feature {
            attributes: collect_attrs(attributes),
            geom: GeomSource::Transport(transport),
        });
    }

    /// Make the next `execute` fail with the given diagnostic.
    pub fn fail_next_query(&self, diagnostic: impl Into<String>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.fail_next = Some(diagnostic.into());
        }
    }

    /// Delay every query by `latency`, for timeout exercises.
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut inner) = self.inner.write() {
            inner.latency = Some(latency);
        }
    }

    /// Number of stored features.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.features.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, feature: Feature) {
        if let Ok(mut inner) = self.inner.write() {
            inner.features.push(feature);
        }
    }

    fn lock_err() -> StoreError {
        StoreError::connection("datastore state lock poisoned")
    }

    /// Evaluate the query against the feature table.
    fn collect_rows(&self, query: &AttributeQuery) -> Result<Vec<Row>> {
        let mut inner = self.inner.write().map_err(|_| Self::lock_err())?;
        if inner.closed {
            return Err(StoreError::Closed);
        }
        if let Some(diagnostic) = inner.fail_next.take() {
            return Err(StoreError::query(diagnostic));
        }

        let mut rows = Vec::new();
        for feature in &inner.features {
            let matched = feature
                .attributes
                .get(query.match_column())
                .is_some_and(|value| query.matches(value));
            if !matched {
                continue;
            }
            rows.push(feature_row(feature)?);
            if query.limit().is_some_and(|limit| rows.len() >= limit) {
                break;
            }
        }
        tracing::debug!(
            table = query.table(),
            matched = rows.len(),
            "Memory datastore query"
        );
        Ok(rows)
    }

    async fn run_query(&self, query: &AttributeQuery) -> Result<RowStream> {
        let latency = self
            .inner
            .read()
            .map_err(|_| Self::lock_err())?
            .latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let rows = self.collect_rows(query)?;
        Ok(stream::iter(rows.into_iter().map(Ok)).boxed())
    }
}

fn collect_attrs<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> HashMap<String, String>
where
    K: Into<String>,
    V: Into<String>,
{
    attributes
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn feature_row(feature: &Feature) -> Result<Row> {
    let mut row = Row::new();
    match &feature.geom {
        GeomSource::Geometry(geom) => {
            let transport = encode_transport(geom, ByteOrder::BigEndian)
                .map_err(|e| StoreError::query(format!("geometry encoding failed: {e}")))?;
            row.set(GEOMETRY_COLUMN, ColumnValue::Bytes(transport));
            row.set(AREA_COLUMN, ColumnValue::Float(geom.unsigned_area()));
            row.set(PERIMETER_COLUMN, ColumnValue::Float(perimeter(geom)));
        }
        GeomSource::Transport(bytes) => {
            row.set(GEOMETRY_COLUMN, ColumnValue::Bytes(bytes.clone()));
            row.set(AREA_COLUMN, ColumnValue::Float(0.0));
            row.set(PERIMETER_COLUMN, ColumnValue::Float(0.0));
        }
    }
    for (name, value) in &feature.attributes {
        row.set(name.clone(), ColumnValue::Text(value.clone()));
    }
    Ok(row)
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn execute(&self, query: &AttributeQuery, timeout_ms: Option<u64>) -> Result<RowStream> {
        match timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), self.run_query(query))
                .await
                .map_err(|_| StoreError::query(format!("query timed out after {ms}ms")))?,
            None => self.run_query(query).await,
        }
    }

    async fn ping(&self) -> Result<()> {
        let inner = self.inner.read().map_err(|_| Self::lock_err())?;
        if inner.closed {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| Self::lock_err())?;
        inner.closed = true;
        Ok(())
    }
}

/// [`Connector`] yielding a shared [`MemoryDatastore`].
///
/// Can be told to refuse connections, so init-failure and init-retry
/// paths are exercisable without a real unreachable database.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    datastore: Arc<MemoryDatastore>,
    refusal: Arc<RwLock<Option<String>>>,
}

impl MemoryConnector {
    /// Connector serving the given datastore.
    pub fn new(datastore: Arc<MemoryDatastore>) -> Self {
        Self {
            datastore,
            refusal: Arc::new(RwLock::new(None)),
        }
    }

    /// Connector that refuses every connection with `message`.
    pub fn refusing(message: impl Into<String>) -> Self {
        let connector = Self::default();
        connector.set_refusal(Some(message.into()));
        connector
    }

    /// Change the refusal state; `None` lets connections through again.
    pub fn set_refusal(&self, message: Option<String>) {
        if let Ok(mut refusal) = self.refusal.write() {
            *refusal = message;
        }
    }

    /// The backing datastore.
    pub fn datastore(&self) -> Arc<MemoryDatastore> {
        Arc::clone(&self.datastore)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, config: &StoreConfig) -> Result<Arc<dyn Datastore>> {
        let refusal = self
            .refusal
            .read()
            .ok()
            .and_then(|guard| guard.clone());
        if let Some(message) = refusal {
            tracing::debug!(url = %config.url, "Memory connector refusing connection");
            return Err(StoreError::connection(message));
        }
        Ok(Arc::clone(&self.datastore) as Arc<dyn Datastore>)
    }
}
