//! HTTP surface
//!
//! Content requests are resolved by [`crate::routing::RouteResolver`]; the
//! `/api` routes expose the manual overrides and lifecycle operations.

pub mod api;
pub mod server;

pub use api::{create_router, gone_page, outcome_response, ApiResponse, ErrorResponse};
pub use server::{AppState, PermalinkServer, ServerError, ServerInfo};
