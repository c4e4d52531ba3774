//! CodeGraph: ingestion and querying of a code structure graph.
//!
//! Parsers hand over one `ParsedCodeModel` per source file; the services turn
//! it into File, Function and Class nodes joined by CONTAINS edges and answer
//! node, adjacency and per-file snapshot queries.
//!
//! Two implementations of `GraphQueryService` are provided:
//! - `SurrealGraphService`, backed by a SurrealDB `GraphStore`
//! - `MemoryGraphService`, an in-process reference implementation
//!
//! `factory::create_service` picks one from configuration.

pub mod commands;
pub mod factory;
pub mod flatten;
pub mod locks;
pub mod memory_service;
pub mod output;
pub mod surreal_service;

pub use factory::create_service;
pub use memory_service::MemoryGraphService;
pub use output::OutputFormat;
pub use surreal_service::SurrealGraphService;

pub use codegraph_core::prelude::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::factory::create_service;
    pub use crate::memory_service::MemoryGraphService;
    pub use crate::surreal_service::SurrealGraphService;
    pub use codegraph_core::prelude::*;
}
