//! Graph store handle over SurrealDB.

use crate::connection::ConnectionConfig;
use crate::traversal::{CountRow, Params, Traversal, VertexSelection};
use codegraph_core::error::{CodeGraphError, Result};
use codegraph_core::model::{keys, EdgeKind};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::future::Future;
use surrealdb::engine::any::Any;
use surrealdb::{Response, Surreal};
use tokio::time::timeout;
use tracing::{debug, info};

/// Owns the connection to the graph engine.
///
/// The handle is acquired by `connect` and released exactly once by
/// `close`; any traversal after that fails with a store error.
pub struct GraphStore {
    config: ConnectionConfig,
    db: RwLock<Option<Surreal<Any>>>,
}

impl GraphStore {
    /// Connect, select namespace/database, apply the schema and verify the
    /// connection with one lightweight query.
    ///
    /// # Errors
    /// `CodeGraphError::Connection` carrying the underlying cause. No retry.
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let conn_str = config.connection_string();

        debug!(endpoint = %conn_str, "Connecting to graph store");

        let db = surrealdb::engine::any::connect(conn_str.as_str())
            .await
            .map_err(|e| CodeGraphError::connection(format!("Failed to connect to {}: {}", conn_str, e)))?;

        // Authenticate if credentials are provided
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            db.signin(surrealdb::opt::auth::Root {
                username,
                password,
            })
            .await
            .map_err(|e| CodeGraphError::connection(format!("Authentication failed: {}", e)))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                CodeGraphError::connection(format!("Failed to use namespace/database: {}", e))
            })?;

        crate::schema::init_schema(&db).await?;

        let store = Self {
            config,
            db: RwLock::new(Some(db)),
        };

        store
            .run_traversal::<serde_json::Value>(&Traversal::new().select_values(
                &VertexSelection::all(),
                keys::NODE_ID,
                Some(1),
            ))
            .await
            .map_err(|e| CodeGraphError::connection(format!("Verification query failed: {}", e)))?;

        info!(
            endpoint = %conn_str,
            namespace = %store.config.namespace,
            database = %store.config.database,
            "Connected to graph store"
        );
        Ok(store)
    }

    /// Connect to a fresh embedded in-memory engine
    pub async fn memory() -> Result<Self> {
        Self::connect(ConnectionConfig::memory()).await
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.db.read().is_none()
    }

    fn handle(&self) -> Result<Surreal<Any>> {
        self.db
            .read()
            .clone()
            .ok_or_else(|| CodeGraphError::store("store is closed"))
    }

    async fn within_deadline<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.config.query_timeout {
            Some(limit) => timeout(limit, fut).await.map_err(|_| {
                CodeGraphError::timeout(format!("{} did not finish within {:?}", what, limit))
            })?,
            None => fut.await,
        }
    }

    async fn send(&self, traversal: &Traversal) -> Result<Response> {
        debug!(
            statements = traversal.statement_count(),
            params = traversal.params().len(),
            "Running traversal"
        );
        self.send_text(traversal.text(), traversal.params()).await
    }

    async fn send_text(&self, text: String, params: &Params) -> Result<Response> {
        let db = self.handle()?;

        let mut query = db.query(text);
        for (name, value) in params {
            query = query.bind((name.clone(), value.clone()));
        }

        let response = self
            .within_deadline("traversal", async move {
                query
                    .await
                    .map_err(|e| CodeGraphError::store(format!("Traversal failed: {}", e)))
            })
            .await?;

        response
            .check()
            .map_err(|e| CodeGraphError::store(format!("Traversal failed: {}", e)))
    }

    /// Run a read traversal and deserialize the rows of its last statement
    ///
    /// # Errors
    /// `CodeGraphError::Store` if the traversal fails or a row does not match `T`
    pub async fn run_traversal<T: DeserializeOwned>(&self, traversal: &Traversal) -> Result<Vec<T>> {
        if traversal.is_empty() {
            return Ok(Vec::new());
        }

        let mut response = self.send(traversal).await?;
        let last = response.num_statements().saturating_sub(1);
        let rows: Vec<serde_json::Value> = response
            .take(last)
            .map_err(|e| CodeGraphError::store(format!("Failed to read traversal result: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    CodeGraphError::store(format!("Failed to parse traversal result: {}", e))
                })
            })
            .collect()
    }

    /// Run a mutation; an error in any statement fails the call
    pub async fn execute(&self, traversal: &Traversal) -> Result<()> {
        if traversal.is_empty() {
            return Ok(());
        }
        self.send(traversal).await.map(|_| ())
    }

    /// Run literal SurrealQL such as schema extensions or maintenance
    /// statements. Never splice user data into `statement`; traversals bind it.
    pub async fn execute_statement(&self, statement: &str) -> Result<()> {
        debug!(statement, "Running statement");
        self.send_text(statement.to_string(), &Params::new()).await.map(|_| ())
    }

    /// Delete every vertex and edge
    pub async fn clear_all(&self) -> Result<()> {
        self.execute(&Traversal::new().clear_all()).await?;
        info!("Graph store cleared");
        Ok(())
    }

    /// Number of vertices
    pub async fn count_vertices(&self) -> Result<u64> {
        let rows: Vec<CountRow> = self
            .run_traversal(&Traversal::new().count_vertices(&VertexSelection::all()))
            .await?;
        Ok(rows.first().map(|row| row.count).unwrap_or(0))
    }

    /// Number of edges of one kind
    pub async fn count_edges(&self, edge: EdgeKind) -> Result<u64> {
        let rows: Vec<CountRow> = self
            .run_traversal(&Traversal::new().count_edges(edge))
            .await?;
        Ok(rows.first().map(|row| row.count).unwrap_or(0))
    }

    /// Release the handle; later calls are no-ops
    pub fn close(&self) {
        match self.db.write().take() {
            Some(db) => {
                drop(db);
                info!("Graph store closed");
            }
            None => debug!("Graph store already closed"),
        }
    }
}

impl Drop for GraphStore {
    fn drop(&mut self) {
        if self.db.get_mut().take().is_some() {
            debug!("Graph store handle released on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::model::NodeKind;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_memory() {
        let store = GraphStore::memory().await.unwrap();
        assert!(store.config().is_memory());
        assert_eq!(store.count_vertices().await.unwrap(), 0);
        assert_eq!(store.count_edges(EdgeKind::Contains).await.unwrap(), 0);
        store.close();
    }

    #[tokio::test]
    async fn test_connect_unreachable_endpoint() {
        let config = ConnectionConfig::remote("ws://127.0.0.1:1");
        let err = GraphStore::connect(config).await.err().unwrap();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let store = GraphStore::memory().await.unwrap();
        store.close();
        store.close();
        assert!(store.is_closed());

        let err = store.count_vertices().await.unwrap_err();
        assert!(err.is_store());
        assert!(err.to_string().contains("store is closed"));
    }

    #[tokio::test]
    async fn test_execute_and_count() {
        let store = GraphStore::memory().await.unwrap();

        let mut properties = serde_json::Map::new();
        properties.insert(keys::NODE_ID.to_string(), "F1".into());
        store
            .execute(&Traversal::new().add_vertex(NodeKind::File, properties))
            .await
            .unwrap();
        assert_eq!(store.count_vertices().await.unwrap(), 1);

        store.clear_all().await.unwrap();
        assert_eq!(store.count_vertices().await.unwrap(), 0);
        store.close();
    }

    #[tokio::test]
    async fn test_slow_query_hits_deadline() {
        let config = ConnectionConfig::memory().with_query_timeout(Duration::from_millis(200));
        let store = GraphStore::connect(config).await.unwrap();

        let err = store.execute_statement("SLEEP 2s").await.unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {}", err);
        assert!(err.to_string().contains("did not finish within"));

        // The handle stays usable after a deadline miss.
        assert_eq!(store.count_vertices().await.unwrap(), 0);
        store.close();
    }

    #[tokio::test]
    async fn test_statement_errors_surface_as_store() {
        let store = GraphStore::memory().await.unwrap();
        let err = store
            .execute_statement("THROW \"rejected\"")
            .await
            .unwrap_err();
        assert!(err.is_store());
        assert!(err.to_string().contains("rejected"));
        store.close();
    }
}
