//! API Module
//!
//! HTTP handlers and routing for the calculation service REST API.
//!
//! # Endpoints
//! - `POST /calculate` - Evaluate a calculation (cached)
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
