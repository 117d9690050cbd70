//! Cache Coordinator Module
//!
//! Mediates concurrent access to the cache store and enforces the
//! single-flight guarantee: at most one in-flight evaluation per
//! fingerprint, with duplicate concurrent callers joining the same outcome.
//!
//! Per-fingerprint lifecycle:
//! - Absent: no cache entry and no in-flight slot; the first caller
//!   registers a slot and becomes the sole evaluator.
//! - Pending: a slot exists; other callers await its broadcast outcome
//!   instead of evaluating.
//! - Ready: the outcome is in the store; callers are served without
//!   evaluation until TTL expiry returns the fingerprint to Absent.
//!
//! Cancellation policy: the evaluate-and-commit step runs on a detached
//! task, so a caller disconnecting mid-request can never strand a
//! fingerprint in Pending. If a slot closes without an outcome (the task
//! panicked), waiters loop back and resolve from Absent again.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStore, CachedOutcome};
use crate::calc::{self, CalculationRequest};
use crate::error::{CalcError, Result};

/// Broadcast slot for one in-flight evaluation.
type InflightSlot = watch::Receiver<Option<CachedOutcome>>;

/// What a resolve call turned out to be for a Pending fingerprint.
enum Role {
    /// Another caller is evaluating; await its broadcast outcome
    Waiter(InflightSlot),
    /// This caller started the evaluation; await the task directly
    Leader(JoinHandle<Result<f64>>),
}

// == Resolved ==
/// Successful outcome of a resolve call.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// The numeric result
    pub value: f64,
    /// Canonical fingerprint of the request
    pub fingerprint: String,
    /// True when the result was served without this call triggering a new
    /// evaluation (cache hit, or joined an evaluation already in flight)
    pub cached: bool,
}

// == Coordinator ==
/// Single-flight front end over the cache store.
pub struct Coordinator {
    /// Shared durable store
    store: Arc<RwLock<CacheStore>>,
    /// In-flight evaluations keyed by fingerprint. Shared with the
    /// detached evaluation tasks so slots are cleared even when the
    /// originating request has gone away.
    inflight: Arc<Mutex<HashMap<String, InflightSlot>>>,
    /// TTL applied to entries whose request carries no explicit TTL
    default_ttl: u64,
}

impl Coordinator {
    /// Creates a coordinator over a shared store.
    pub fn new(store: Arc<RwLock<CacheStore>>, default_ttl: u64) -> Self {
        Self {
            store,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            default_ttl,
        }
    }

    // == Resolve ==
    /// Resolves a calculation request to its result.
    ///
    /// Checks the store first; on a miss, either becomes the sole
    /// evaluator for the fingerprint or awaits an evaluation already in
    /// flight. With `no_cache` the store lookup is skipped and the
    /// evaluation re-runs (its fresh entry still replaces the cached one).
    ///
    /// Evaluation errors propagate identically to the leader and every
    /// waiter. A failed store write is logged and does not fail the
    /// request; the next caller simply evaluates again.
    pub async fn resolve(
        &self,
        request: &CalculationRequest,
        ttl: Option<u64>,
        no_cache: bool,
    ) -> Result<Resolved> {
        let fingerprint = request.fingerprint();

        loop {
            if !no_cache {
                let mut store = self.store.write().await;
                if let Some(entry) = store.get(&fingerprint) {
                    drop(store);
                    let value = entry.outcome.into_result()?;
                    return Ok(Resolved {
                        value,
                        fingerprint,
                        cached: true,
                    });
                }
            }

            // Register as leader or join the existing in-flight slot.
            let role = {
                let mut inflight = self.inflight.lock().await;
                match inflight.get(&fingerprint) {
                    Some(slot) => Role::Waiter(slot.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        inflight.insert(fingerprint.clone(), rx);
                        Role::Leader(self.spawn_evaluation(&fingerprint, request, ttl, tx))
                    }
                }
            };

            match role {
                // Waiter: await the broadcast outcome.
                Role::Waiter(mut slot) => {
                    match slot.wait_for(|outcome| outcome.is_some()).await {
                        Ok(outcome) => {
                            let outcome = outcome.clone().expect("slot resolved with outcome");
                            let value = outcome.into_result()?;
                            return Ok(Resolved {
                                value,
                                fingerprint,
                                cached: true,
                            });
                        }
                        Err(_) => {
                            // leader vanished without an outcome; start over
                            debug!(fingerprint = %fingerprint, "in-flight slot closed, retrying");
                            continue;
                        }
                    }
                }
                // Leader: await our own evaluation task, keeping the
                // precise error message for the first caller.
                Role::Leader(handle) => {
                    return match handle.await {
                        Ok(result) => result.map(|value| Resolved {
                            value,
                            fingerprint,
                            cached: false,
                        }),
                        Err(_) => Err(CalcError::Cancelled),
                    };
                }
            }
        }
    }

    /// Runs evaluate-and-commit on a detached task and broadcasts the
    /// outcome, clearing the in-flight slot when done. The returned handle
    /// carries the precise evaluation result for the leader; dropping it
    /// does not cancel the task.
    fn spawn_evaluation(
        &self,
        fingerprint: &str,
        request: &CalculationRequest,
        ttl: Option<u64>,
        tx: watch::Sender<Option<CachedOutcome>>,
    ) -> JoinHandle<Result<f64>> {
        let store = self.store.clone();
        let inflight = self.inflight.clone();
        let fingerprint = fingerprint.to_string();
        let request = request.clone();
        let ttl = ttl.unwrap_or(self.default_ttl);

        tokio::spawn(async move {
            let result = calc::evaluate(&request);
            let outcome =
                CachedOutcome::from_result(&result).expect("evaluation outcomes are cacheable");

            {
                let mut store = store.write().await;
                store.record_evaluation();
                let entry = CacheEntry::new(outcome.clone(), Some(ttl));
                if let Err(e) = store.put(&fingerprint, entry) {
                    // returning the outcome is still correct; with no entry
                    // on disk the next caller re-evaluates
                    warn!(fingerprint = %fingerprint, error = %e, "failed to persist outcome");
                }
            }

            // Clear Pending before broadcasting so late arrivals read the
            // store instead of a stale slot.
            inflight.lock().await.remove(&fingerprint);
            let _ = tx.send(Some(outcome));

            result
        })
    }
}
