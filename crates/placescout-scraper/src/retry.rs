//! Retry controller: the rotate-or-abort state machine around each
//! operation against the target.
//!
//! Each outcome is classified and handled by category: input faults abort
//! the run, proxy faults report against the identity and rotate, target
//! faults back off exponentially (±25 % jitter, capped at 60 s) and retry
//! the same identity. Independently of faults, the controller rotates the
//! identity proactively every N-th successful operation.

use std::future::Future;
use std::time::Duration;

use placescout_core::AppConfig;

use crate::classify::FailureClassifier;
use crate::error::{PoolError, ScrapeError};
use crate::pool::{ProxyEndpoint, ProxyLease, ProxyPool};
use crate::signal::{FaultKind, OperationOutcome, Signal};

const MAX_BACKOFF_MS: u64 = 60_000;

/// Retry and rotation knobs, derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Ceiling on operation attempts per [`RetryController::execute`].
    pub max_attempts: u32,
    /// Base delay for exponential backoff on target faults.
    pub backoff_base_ms: u64,
    /// Proactive rotation period, in successful operations.
    pub rotation_interval: u32,
    /// Disables both proactive rotation and the expectation of a
    /// populated pool.
    pub rotation_enabled: bool,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_base_ms: config.backoff_base_ms,
            rotation_interval: config.rotation_interval,
            rotation_enabled: config.rotation_enabled,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1_000,
            rotation_interval: 4,
            rotation_enabled: true,
        }
    }
}

/// Executes operations against the target, consulting the classifier and
/// the pool to decide retry, rotate, or abort.
///
/// One controller per run; successful-operation counting for proactive
/// rotation spans `execute` calls.
#[derive(Debug)]
pub struct RetryController {
    classifier: FailureClassifier,
    policy: RetryPolicy,
    /// Successful operations completed this run. Failed attempts do not
    /// count toward proactive rotation.
    completed_ops: u64,
}

impl RetryController {
    #[must_use]
    pub fn new(classifier: FailureClassifier, policy: RetryPolicy) -> Self {
        Self {
            classifier,
            policy,
            completed_ops: 0,
        }
    }

    /// Runs `operation` until it succeeds, its fault category rules out
    /// another attempt, or the attempt ceiling is reached.
    ///
    /// The operation receives the endpoint of the identity to use, or
    /// `None` when the pool is empty (rotation disabled). It reports what
    /// it observed as a [`Signal`]; classification happens here.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::InvalidTarget`] — input fault; surfaced after a
    ///   single attempt, no rotation.
    /// - [`ScrapeError::IdentitiesExhausted`] — the pool has no usable
    ///   identity left.
    /// - [`ScrapeError::RetriesExceeded`] — the attempt ceiling was
    ///   reached; carries the last fault category and identity.
    pub async fn execute<T, F, Fut>(
        &mut self,
        pool: &mut ProxyPool,
        mut operation: F,
    ) -> Result<T, ScrapeError>
    where
        F: FnMut(Option<ProxyEndpoint>) -> Fut,
        Fut: Future<Output = Result<T, Signal>>,
    {
        let mut lease: Option<ProxyLease> = if pool.is_empty() {
            None
        } else {
            Some(pool.current().map_err(|PoolError::Exhausted| {
                ScrapeError::IdentitiesExhausted {
                    attempts: 0,
                    last_identity: None,
                }
            })?)
        };

        let mut attempts: u32 = 0;
        let mut last_identity: Option<String> = None;

        loop {
            attempts += 1;
            if let Some(l) = &lease {
                last_identity = Some(l.endpoint.address.clone());
            }
            let endpoint = lease.as_ref().map(|l| l.endpoint.clone());

            match self.classifier.resolve(operation(endpoint).await) {
                OperationOutcome::Success(payload) => {
                    if let Some(l) = &lease {
                        pool.report_success(l);
                    }
                    self.completed_ops += 1;
                    if self.policy.rotation_enabled
                        && self.policy.rotation_interval > 0
                        && self.completed_ops % u64::from(self.policy.rotation_interval) == 0
                    {
                        pool.force_rotate();
                    }
                    return Ok(payload);
                }
                OperationOutcome::InputFault(signal) => {
                    let reason = match signal {
                        Signal::MalformedTarget { reason } => reason,
                        other => other.to_string(),
                    };
                    return Err(ScrapeError::InvalidTarget { reason });
                }
                OperationOutcome::ProxyFault(signal) => {
                    if let Some(l) = lease.take() {
                        pool.report_error(&l, &signal);
                        if attempts >= self.policy.max_attempts {
                            return Err(ScrapeError::RetriesExceeded {
                                attempts,
                                category: FaultKind::Proxy,
                                last_identity,
                            });
                        }
                        match pool.next() {
                            Ok(next_lease) => {
                                tracing::warn!(
                                    attempt = attempts,
                                    signal = %signal,
                                    from = %l.endpoint.address,
                                    to = %next_lease.endpoint.address,
                                    "proxy fault — rotating identity"
                                );
                                lease = Some(next_lease);
                            }
                            Err(PoolError::Exhausted) => {
                                return Err(ScrapeError::IdentitiesExhausted {
                                    attempts,
                                    last_identity,
                                });
                            }
                        }
                    } else {
                        // No identities to rotate through: wait instead.
                        if attempts >= self.policy.max_attempts {
                            return Err(ScrapeError::RetriesExceeded {
                                attempts,
                                category: FaultKind::Proxy,
                                last_identity,
                            });
                        }
                        self.backoff(attempts, &signal).await;
                    }
                }
                OperationOutcome::TargetFault(signal) => {
                    if attempts >= self.policy.max_attempts {
                        return Err(ScrapeError::RetriesExceeded {
                            attempts,
                            category: FaultKind::Target,
                            last_identity,
                        });
                    }
                    self.backoff(attempts, &signal).await;
                }
            }
        }
    }

    /// Sleeps `backoff_base_ms * 2^(attempt-1)` ± 25 % jitter, capped at
    /// 60 s.
    async fn backoff(&self, attempt: u32, signal: &Signal) {
        let computed = self
            .policy
            .backoff_base_ms
            .saturating_mul(1u64 << (attempt - 1).min(10));
        let capped = computed.min(MAX_BACKOFF_MS);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        tracing::warn!(
            attempt,
            max_attempts = self.policy.max_attempts,
            delay_ms,
            signal = %signal,
            "transient target fault — retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
