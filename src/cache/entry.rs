//! Cache Entry Module
//!
//! Defines the structure of individual cache entries: the evaluation
//! outcome plus TTL metadata, in the JSON form written to disk.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::CalcError;

// == Eval Error Kind ==
/// Deterministic evaluation failures that are cacheable outcomes.
///
/// The evaluator is pure, so an input that fails once fails the same way
/// forever; caching the kind avoids re-running the evaluator for inputs
/// known to be bad. Storage and cancellation errors are transient and are
/// never represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalErrorKind {
    Parse,
    Arity,
    DivisionByZero,
    InvalidOperand,
}

// == Cached Outcome ==
/// What a completed evaluation produced: a value or a typed failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachedOutcome {
    /// Successful numeric result
    Value(f64),
    /// Deterministic evaluation failure
    Error(EvalErrorKind),
}

impl CachedOutcome {
    /// Captures an evaluation result as a cacheable outcome.
    ///
    /// Returns `None` for error kinds that must not be cached
    /// (storage failures, cancellation).
    pub fn from_result(result: &Result<f64, CalcError>) -> Option<Self> {
        match result {
            Ok(value) => Some(CachedOutcome::Value(*value)),
            Err(CalcError::Parse(_)) => Some(CachedOutcome::Error(EvalErrorKind::Parse)),
            Err(CalcError::Arity(_)) => Some(CachedOutcome::Error(EvalErrorKind::Arity)),
            Err(CalcError::DivisionByZero) => {
                Some(CachedOutcome::Error(EvalErrorKind::DivisionByZero))
            }
            Err(CalcError::InvalidOperand(_)) => {
                Some(CachedOutcome::Error(EvalErrorKind::InvalidOperand))
            }
            Err(CalcError::Storage(_)) | Err(CalcError::Cancelled) => None,
        }
    }

    /// Converts the outcome back into an evaluation result.
    ///
    /// Cached errors lose their original free-text message; the kind is
    /// what the HTTP layer maps to a status, so a generic message suffices.
    pub fn into_result(self) -> Result<f64, CalcError> {
        match self {
            CachedOutcome::Value(value) => Ok(value),
            CachedOutcome::Error(EvalErrorKind::Parse) => {
                Err(CalcError::Parse("expression could not be parsed".to_string()))
            }
            CachedOutcome::Error(EvalErrorKind::Arity) => {
                Err(CalcError::Arity("operand count does not match operator".to_string()))
            }
            CachedOutcome::Error(EvalErrorKind::DivisionByZero) => Err(CalcError::DivisionByZero),
            CachedOutcome::Error(EvalErrorKind::InvalidOperand) => {
                Err(CalcError::InvalidOperand("operand is not a finite number".to_string()))
            }
        }
    }
}

// == Cache Entry ==
/// A single cache entry: outcome plus creation and expiry metadata.
///
/// Entries are never mutated after creation; a re-computation for the same
/// fingerprint stores a fresh entry with new timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The evaluation outcome
    pub outcome: CachedOutcome,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    pub fn new(outcome: CachedOutcome, ttl_seconds: Option<u64>) -> Self {
        let now = current_timestamp_ms();
        let expires_at = ttl_seconds.map(|ttl| now + ttl * 1000);

        Self {
            outcome,
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to the expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in seconds, or None if no expiration is set.
    ///
    /// Returns `Some(0)` once the entry has expired.
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let now = current_timestamp_ms();
            if expires > now {
                (expires - now) / 1000
            } else {
                0
            }
        })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
