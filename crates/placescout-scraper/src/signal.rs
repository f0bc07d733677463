//! Raw operation signals and classified outcomes.
//!
//! A [`Signal`] is what the automation layer observed when an operation
//! did not produce a payload; [`crate::classify::FailureClassifier`]
//! turns a signal into a fault category, and the retry controller
//! consumes the resulting [`OperationOutcome`].

use std::fmt;

/// What the automation layer observed for a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The operation did not complete within its deadline, or the
    /// connection could not be established.
    TimedOut,
    /// The target answered with an HTTP-like status code.
    HttpStatus(u16),
    /// A marker string detected in retrieved content (e.g. a CAPTCHA or
    /// verification interstitial).
    ContentSignature(String),
    /// The target reference could not be parsed as a valid request.
    MalformedTarget { reason: String },
    /// The page loaded but produced no result where one was expected.
    EmptyResult,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::TimedOut => write!(f, "operation timed out"),
            Signal::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Signal::ContentSignature(marker) => write!(f, "content signature \"{marker}\""),
            Signal::MalformedTarget { reason } => write!(f, "malformed target: {reason}"),
            Signal::EmptyResult => write!(f, "empty result"),
        }
    }
}

/// Fault category assigned to a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Recoverable by switching identity.
    Proxy,
    /// Recoverable by waiting; the identity is not at fault.
    Target,
    /// The caller's request was invalid; retrying cannot help.
    Input,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::Proxy => write!(f, "proxy"),
            FaultKind::Target => write!(f, "target"),
            FaultKind::Input => write!(f, "input"),
        }
    }
}

/// Classified outcome of one attempted operation.
///
/// Produced once per attempt and consumed immediately by the retry
/// controller; never persisted.
#[derive(Debug)]
pub enum OperationOutcome<T> {
    Success(T),
    ProxyFault(Signal),
    TargetFault(Signal),
    InputFault(Signal),
}
