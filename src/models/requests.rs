//! Request DTOs for the calculation service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::calc::{CalculationRequest, Operator};
use crate::error::{CalcError, Result};

/// Request body for the calculate operation (POST /calculate)
///
/// Exactly one calculation form must be present: either `op` with
/// `operands`, or `expression`.
///
/// # Fields
/// - `op`: operator name (`add`, `subtract`, `multiply`, `divide`)
/// - `operands`: ordered list of numbers for `op`
/// - `expression`: free-form arithmetic text
/// - `ttl`: optional TTL in seconds for the cached result
/// - `no_cache`: bypass the cached value and force re-evaluation
#[derive(Debug, Clone, Deserialize)]
pub struct CalculateRequest {
    /// Operator for the structured form
    #[serde(default)]
    pub op: Option<Operator>,
    /// Ordered operands for the structured form
    #[serde(default)]
    pub operands: Option<Vec<f64>>,
    /// Free-form expression text
    #[serde(default)]
    pub expression: Option<String>,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
    /// Skip the cache lookup and re-evaluate
    #[serde(default)]
    pub no_cache: bool,
}

impl CalculateRequest {
    /// Validates the request and converts it into the domain type.
    pub fn validate(&self) -> Result<CalculationRequest> {
        match (&self.op, &self.operands, &self.expression) {
            (None, None, Some(expression)) => {
                if expression.trim().is_empty() {
                    return Err(CalcError::Parse("expression is empty".to_string()));
                }
                Ok(CalculationRequest::expression(expression.clone()))
            }
            (Some(op), Some(operands), None) => {
                Ok(CalculationRequest::operation(*op, operands.clone()))
            }
            (Some(_), None, None) => Err(CalcError::Parse(
                "'op' requires an 'operands' list".to_string(),
            )),
            (None, Some(_), None) => Err(CalcError::Parse(
                "'operands' requires an 'op'".to_string(),
            )),
            (None, None, None) => Err(CalcError::Parse(
                "request must provide 'op' with 'operands', or 'expression'".to_string(),
            )),
            _ => Err(CalcError::Parse(
                "request cannot mix 'expression' with 'op'/'operands'".to_string(),
            )),
        }
    }
}
