//! Calculation Request Module
//!
//! Domain types for incoming calculations and their canonical fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// == Operator ==
/// The four supported arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// Canonical token used in fingerprints.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Subtract => "subtract",
            Operator::Multiply => "multiply",
            Operator::Divide => "divide",
        }
    }
}

// == Calculation Request ==
/// A calculation to perform, either as an operator with an ordered operand
/// list or as free-form expression text.
///
/// Immutable once constructed; all cache identity derives from
/// [`CalculationRequest::fingerprint`].
#[derive(Debug, Clone, PartialEq)]
pub enum CalculationRequest {
    /// Structured form: one operator applied to an ordered operand list
    Operation { op: Operator, operands: Vec<f64> },
    /// Free-form arithmetic expression text
    Expression(String),
}

impl CalculationRequest {
    /// Creates a structured operation request.
    pub fn operation(op: Operator, operands: Vec<f64>) -> Self {
        Self::Operation { op, operands }
    }

    /// Creates an expression request.
    pub fn expression(text: impl Into<String>) -> Self {
        Self::Expression(text.into())
    }

    // == Fingerprint ==
    /// Canonical cache key for this request: lowercase hex SHA-256 over a
    /// normalized serialization.
    ///
    /// Normalization rules:
    /// - operator identified by its lowercase token
    /// - operands formatted with the shortest round-trip representation,
    ///   with `-0.0` collapsed to `0.0`
    /// - expression text stripped of all whitespace
    ///
    /// Operand order is part of the identity (subtraction and division are
    /// order-sensitive). The hex digest is filesystem-safe and doubles as
    /// the on-disk file name in the cache store.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        match self {
            CalculationRequest::Operation { op, operands } => {
                hasher.update(op.token().as_bytes());
                hasher.update(b"\n");
                for operand in operands {
                    hasher.update(canonical_number(*operand).as_bytes());
                    hasher.update(b"\n");
                }
            }
            CalculationRequest::Expression(text) => {
                hasher.update(b"expr\n");
                let normalized: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                hasher.update(normalized.as_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

// == Utility Functions ==
/// Canonical text form of an operand for fingerprinting.
///
/// Uses Rust's shortest round-trip float formatting, so `2`, `2.0` and
/// `2.00` all map to `"2"`. Negative zero compares equal to zero and is
/// normalized so both produce the same key.
fn canonical_number(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{}", value)
}
