use thiserror::Error;

use crate::signal::FaultKind;

/// Terminal failures surfaced by the retry controller.
///
/// Every variant carries enough structure for the caller to log a precise
/// cause; nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The caller's target reference was invalid. Aborted on the first
    /// attempt; no retry, no rotation.
    #[error("invalid target: {reason}")]
    InvalidTarget { reason: String },

    /// Every identity in the pool is dead.
    #[error(
        "all proxy identities exhausted after {attempts} attempt(s) (last identity: {})",
        last_identity.as_deref().unwrap_or("none")
    )]
    IdentitiesExhausted {
        attempts: u32,
        last_identity: Option<String>,
    },

    /// The attempt ceiling was reached without success.
    #[error(
        "gave up after {attempts} attempt(s) on a {category} fault (last identity: {})",
        last_identity.as_deref().unwrap_or("none")
    )]
    RetriesExceeded {
        attempts: u32,
        category: FaultKind,
        last_identity: Option<String>,
    },

    /// The proxy list produced no usable identities while rotation was
    /// requested.
    #[error("proxy list is empty but identity rotation was requested")]
    EmptyProxyList,

    /// The proxy list file could not be read.
    #[error("cannot read proxy list {path}: {source}")]
    ProxyListUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Signal returned by the pool when no usable identity remains.
///
/// Callers must treat this as a hard stop, not retry indefinitely.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("no usable proxy identities remain")]
    Exhausted,
}
