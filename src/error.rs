//! Error types for the calculation service
//!
//! Provides unified error handling using thiserror. Every variant maps to a
//! stable machine-readable kind so the HTTP layer can pick a status code
//! without inspecting free-text messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Calc Error Enum ==
/// Unified error type for the calculation service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// Expression text could not be parsed, or the request body was not a
    /// well-formed calculation
    #[error("parse error: {0}")]
    Parse(String),

    /// Operand count does not match the operator's arity
    #[error("arity error: {0}")]
    Arity(String),

    /// Division with a zero divisor
    #[error("division by zero")]
    DivisionByZero,

    /// Operand is not a finite number
    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    /// I/O failure in the cache store
    #[error("storage error: {0}")]
    Storage(String),

    /// An in-flight evaluation was abandoned before producing an outcome
    #[error("calculation cancelled")]
    Cancelled,
}

impl CalcError {
    // == Kind ==
    /// Stable identifier for the error kind, used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CalcError::Parse(_) => "parse_error",
            CalcError::Arity(_) => "arity_error",
            CalcError::DivisionByZero => "division_by_zero",
            CalcError::InvalidOperand(_) => "invalid_operand",
            CalcError::Storage(_) => "storage_error",
            CalcError::Cancelled => "cancelled",
        }
    }

    /// HTTP status code for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CalcError::Parse(_) | CalcError::Arity(_) => StatusCode::BAD_REQUEST,
            CalcError::DivisionByZero | CalcError::InvalidOperand(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CalcError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CalcError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CalcError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::new(self.to_string(), self.kind()));
        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the calculation service.
pub type Result<T> = std::result::Result<T, CalcError>;
