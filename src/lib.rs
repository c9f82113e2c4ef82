// Library root module for xchain-router
// This file defines the public API and module structure: the route operator and
// classifier, the route strategies and the transaction submission engine

pub mod config;
pub mod context;
pub mod errors;
pub mod execution;
pub mod message;
pub mod metrics;
pub mod router;
pub mod routes;
pub mod signing;
pub mod transport;
pub mod types;
