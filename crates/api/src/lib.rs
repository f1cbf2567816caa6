//! HTTP API: routing, the access gate middleware and request/response mapping.

pub mod app;
pub mod config;
pub mod middleware;
