//! Portrait daemon library
//!
//! This module re-exports the daemon's modules for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod gpu;
pub mod renderer;
pub mod state;

pub use api::create_router;
pub use config::ServiceConfig;
pub use error::ApiError;
pub use renderer::{PassthroughRenderer, PortraitRenderer};
pub use state::AppState;
