//! Library crate for kickoff-back, exposing modules for binaries and integration tests.

pub mod config;
/// Persistence: entity models and roster stores.
pub mod dao;
/// Request and response bodies of the HTTP API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum routers and handlers.
pub mod routes;
/// Business operations behind the routes.
pub mod services;
/// Shared application state and the pure roster rules.
pub mod state;
