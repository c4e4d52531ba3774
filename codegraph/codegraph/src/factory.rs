//! Service construction from configuration.
//!
//! Picks the `GraphQueryService` implementation named by `[service] backend`
//! and connects the graph store it needs.

use crate::{MemoryGraphService, SurrealGraphService};
use codegraph_core::config::{CodeGraphConfig, ServiceBackend};
use codegraph_core::error::Result;
use codegraph_core::traits::GraphQueryService;
use codegraph_storage::{ConnectionConfig, GraphStore};
use std::sync::Arc;

/// Create the graph query service selected by `config.service.backend`.
///
/// For `ServiceBackend::SurrealDb` the store is connected (embedded `mem://`
/// when `store.use_in_memory` is set, `store.endpoint` otherwise) and the
/// schema applied before the service is returned.
///
/// # Errors
///
/// * `CodeGraphError::Config` if the configuration does not validate
/// * `CodeGraphError::Connection` if the store cannot be reached
///
/// # Examples
///
/// ```rust,no_run
/// use codegraph::factory::create_service;
/// use codegraph_core::CodeGraphConfig;
///
/// # async fn example() -> codegraph_core::Result<()> {
/// let service = create_service(&CodeGraphConfig::in_memory()).await?;
/// println!("{}", service.stats().await?.nodes);
/// # Ok(())
/// # }
/// ```
pub async fn create_service(config: &CodeGraphConfig) -> Result<Arc<dyn GraphQueryService>> {
    config.validate()?;

    match config.service.backend {
        ServiceBackend::SurrealDb => {
            let store = GraphStore::connect(ConnectionConfig::from(&config.store)).await?;
            tracing::info!(
                in_memory = config.store.use_in_memory,
                "Using SurrealDB graph service"
            );
            Ok(Arc::new(SurrealGraphService::new(Arc::new(store))))
        }
        ServiceBackend::Reference => {
            tracing::info!("Using in-memory reference graph service");
            Ok(Arc::new(MemoryGraphService::new()))
        }
    }
}
