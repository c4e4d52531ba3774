//! Core types and abstractions for CodeGraph.
//!
//! This crate provides the code graph model, the service trait, configuration
//! and error handling shared by the storage adapter and the services.

pub mod config;
pub mod error;
pub mod model;
pub mod traits;

pub use config::{CodeGraphConfig, ServiceBackend};
pub use error::{CodeGraphError, Result};
pub use model::*;
pub use traits::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{CodeGraphConfig, ServiceBackend};
    pub use crate::error::{CodeGraphError, Result};
    pub use crate::model::*;
    pub use crate::traits::*;
}
