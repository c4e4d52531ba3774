//! Graph store adapter for CodeGraph using SurrealDB.
//!
//! This crate owns the connection to the graph engine and the traversal
//! builder the services use to read and mutate the graph. `mem://` and remote
//! endpoints run the same engine, so both modes accept the same traversals.

pub mod connection;
pub mod schema;
pub mod store;
pub mod traversal;

pub use connection::{ConnectionConfig, ConnectionMode};
pub use store::GraphStore;
pub use traversal::{CountRow, EdgeEndpoints, Params, Traversal, VertexSelection};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::connection::{ConnectionConfig, ConnectionMode};
    pub use crate::schema::{edge_table, NODE_TABLE};
    pub use crate::store::GraphStore;
    pub use crate::traversal::{CountRow, EdgeEndpoints, Traversal, VertexSelection};
}
