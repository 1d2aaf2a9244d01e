//! SPMC API server library.
//!
//! Exposes config, state, error handling, routes and the ingestion glue so
//! integration tests and the binary entrypoint can both access them.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
