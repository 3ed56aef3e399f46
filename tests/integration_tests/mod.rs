//! Integration tests module
//!
//! End-to-end tests for seqlink over both repository backends, including:
//! - Sequence uniqueness under concurrent saves
//! - Path routing, aliases and canonical redirects
//! - Item and category cleanup
//! - The axum router

pub mod error_scenarios;
pub mod fixtures;
pub mod lifecycle_test;
pub mod routing_test;
pub mod sequence_test;
