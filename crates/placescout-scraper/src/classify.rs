//! Failure classification: raw [`Signal`]s to fault categories.
//!
//! Classification rules, in priority order:
//! 1. A target reference that cannot be parsed → [`FaultKind::Input`].
//!    Never retried.
//! 2. Timeout, HTTP 403/429, or a recognized block/verification marker →
//!    [`FaultKind::Proxy`]. Retried with identity rotation.
//! 3. Anything else (unexpected status, unrecognized signature, empty
//!    result) → [`FaultKind::Target`]. Retried with backoff, same
//!    identity.

use crate::signal::{FaultKind, OperationOutcome, Signal};

/// Markers that indicate the target is actively blocking this identity.
///
/// Matched case-insensitively as substrings of the reported signature.
const DEFAULT_BLOCK_MARKERS: &[&str] = &[
    "captcha",
    "unusual traffic",
    "automated requests",
    "verify you",
    "not a robot",
];

/// Maps raw operation signals to fault categories.
///
/// The block-marker list is data, not control flow: callers may extend it
/// for targets with their own interstitial wording.
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    block_markers: Vec<String>,
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self {
            block_markers: DEFAULT_BLOCK_MARKERS
                .iter()
                .map(|m| (*m).to_owned())
                .collect(),
        }
    }
}

impl FailureClassifier {
    /// Classifier with the default marker set plus `extra_markers`.
    #[must_use]
    pub fn with_markers<I, S>(extra_markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classifier = Self::default();
        classifier
            .block_markers
            .extend(extra_markers.into_iter().map(|m| m.into().to_lowercase()));
        classifier
    }

    /// Assigns a fault category to a raw signal.
    #[must_use]
    pub fn classify(&self, signal: &Signal) -> FaultKind {
        match signal {
            Signal::MalformedTarget { .. } => FaultKind::Input,
            Signal::TimedOut => FaultKind::Proxy,
            Signal::HttpStatus(code) => match code {
                403 | 429 => FaultKind::Proxy,
                _ => FaultKind::Target,
            },
            Signal::ContentSignature(marker) => {
                if self.is_block_marker(marker) {
                    FaultKind::Proxy
                } else {
                    tracing::debug!(marker, "unrecognized content signature");
                    FaultKind::Target
                }
            }
            Signal::EmptyResult => FaultKind::Target,
        }
    }

    /// Builds the tagged outcome for one attempt from the operation's raw
    /// result.
    #[must_use]
    pub fn resolve<T>(&self, result: Result<T, Signal>) -> OperationOutcome<T> {
        match result {
            Ok(payload) => OperationOutcome::Success(payload),
            Err(signal) => match self.classify(&signal) {
                FaultKind::Input => OperationOutcome::InputFault(signal),
                FaultKind::Proxy => OperationOutcome::ProxyFault(signal),
                FaultKind::Target => OperationOutcome::TargetFault(signal),
            },
        }
    }

    fn is_block_marker(&self, marker: &str) -> bool {
        let lower = marker.to_lowercase();
        self.block_markers.iter().any(|m| lower.contains(m.as_str()))
    }
}
