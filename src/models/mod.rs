//! Request and Response models for the calculation service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::CalculateRequest;
pub use responses::{CalculateResponse, ErrorResponse, HealthResponse, StatsResponse};
