//! Proxy identity pool with health tracking and round-robin rotation.
//!
//! Identities are loaded once from a proxy list (`host:port` or
//! `host:port:username:password`, one per line) and never removed — a
//! failing identity is marked dead so end-of-run diagnostics can account
//! for every entry. Selection is round-robin with dead entries skipped;
//! health state removes bad identities outright rather than
//! down-weighting them.

use std::path::Path;

use crate::error::{PoolError, ScrapeError};
use crate::signal::Signal;

/// Username/password pair for an authenticated proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

/// The connectable part of an identity, handed to the automation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    /// `host:port`.
    pub address: String,
    pub credentials: Option<ProxyCredentials>,
}

/// One network egress identity with its health state.
///
/// `is_dead` becomes true exactly when `consecutive_errors` reaches the
/// pool's threshold and never resets: an explicit success zeroes the
/// counter, but reaching zero does not revive a dead identity.
#[derive(Debug, Clone)]
pub struct ProxyIdentity {
    pub endpoint: ProxyEndpoint,
    pub consecutive_errors: u32,
    pub is_dead: bool,
    pub total_uses: u64,
}

impl ProxyIdentity {
    fn new(endpoint: ProxyEndpoint) -> Self {
        Self {
            endpoint,
            consecutive_errors: 0,
            is_dead: false,
            total_uses: 0,
        }
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.endpoint.address
    }
}

/// A selection returned by the pool: slot index plus a cloned endpoint,
/// so the caller never holds a borrow across `report_*` calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyLease {
    pub slot: usize,
    pub endpoint: ProxyEndpoint,
}

/// Round-robin pool over proxy identities.
///
/// Owned by exactly one run; no internal locking (the run is strictly
/// sequential).
#[derive(Debug)]
pub struct ProxyPool {
    identities: Vec<ProxyIdentity>,
    /// Slot of the identity currently in use; `None` before first acquire.
    cursor: Option<usize>,
    dead_threshold: u32,
}

impl ProxyPool {
    /// Builds a pool from proxy-list lines.
    ///
    /// Blank lines and `#` comments are skipped silently; lines that split
    /// into anything other than 2 or 4 colon-separated fields are skipped
    /// with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::EmptyProxyList`] if no identity parses while
    /// `rotation_required` is true.
    pub fn from_lines<I, S>(
        lines: I,
        rotation_required: bool,
        dead_threshold: u32,
    ) -> Result<Self, ScrapeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut identities = Vec::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_proxy_line(line) {
                Some(endpoint) => identities.push(ProxyIdentity::new(endpoint)),
                None => {
                    tracing::warn!(line, "skipping malformed proxy entry");
                }
            }
        }

        if identities.is_empty() && rotation_required {
            return Err(ScrapeError::EmptyProxyList);
        }

        tracing::info!(count = identities.len(), "loaded proxy identities");
        Ok(Self {
            identities,
            cursor: None,
            dead_threshold,
        })
    }

    /// Reads a proxy list file and delegates to [`ProxyPool::from_lines`].
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::ProxyListUnreadable`] if the file cannot be
    /// read, plus anything `from_lines` returns.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        rotation_required: bool,
        dead_threshold: u32,
    ) -> Result<Self, ScrapeError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ScrapeError::ProxyListUnreadable {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_lines(contents.lines(), rotation_required, dead_threshold)
    }

    /// The identity currently at the cursor, acquiring the first non-dead
    /// one if none is held yet. Skips ahead if the current identity has
    /// died since it was acquired.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] when every identity is dead (or
    /// the pool is empty).
    pub fn current(&mut self) -> Result<ProxyLease, PoolError> {
        match self.cursor {
            Some(slot) if !self.identities[slot].is_dead => Ok(self.lease(slot)),
            _ => self.advance(),
        }
    }

    /// The next non-dead identity in round-robin order, starting after the
    /// last returned slot.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] when every identity is dead.
    pub fn next(&mut self) -> Result<ProxyLease, PoolError> {
        self.advance()
    }

    /// Advances the round-robin cursor without requiring an error.
    ///
    /// Used for proactive identity rotation on a fixed schedule, to reduce
    /// detectability even when the current identity is healthy. A no-op
    /// (logged) when no other identity is usable.
    pub fn force_rotate(&mut self) {
        match self.advance() {
            Ok(lease) => {
                tracing::debug!(identity = %lease.endpoint.address, "proactive identity rotation");
            }
            Err(PoolError::Exhausted) => {
                tracing::debug!("proactive rotation skipped: pool exhausted");
            }
        }
    }

    /// Records a successful operation: zeroes the consecutive error count
    /// and bumps `total_uses`. Does not revive a dead identity.
    pub fn report_success(&mut self, lease: &ProxyLease) {
        if let Some(identity) = self.identities.get_mut(lease.slot) {
            identity.consecutive_errors = 0;
            identity.total_uses += 1;
        }
    }

    /// Records a failed operation against an identity. On the configured
    /// consecutive-error threshold the identity is marked dead, one-way,
    /// and a diagnostic event names it and the triggering signal.
    pub fn report_error(&mut self, lease: &ProxyLease, signal: &Signal) {
        let threshold = self.dead_threshold;
        if let Some(identity) = self.identities.get_mut(lease.slot) {
            identity.consecutive_errors += 1;
            if !identity.is_dead && identity.consecutive_errors >= threshold {
                identity.is_dead = true;
                tracing::warn!(
                    identity = %identity.endpoint.address,
                    consecutive_errors = identity.consecutive_errors,
                    signal = %signal,
                    "proxy identity marked dead"
                );
            }
        }
    }

    /// All identities, dead entries included, for end-of-run diagnostics.
    #[must_use]
    pub fn identities(&self) -> &[ProxyIdentity] {
        &self.identities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    #[must_use]
    pub fn dead_count(&self) -> usize {
        self.identities.iter().filter(|i| i.is_dead).count()
    }

    fn lease(&self, slot: usize) -> ProxyLease {
        ProxyLease {
            slot,
            endpoint: self.identities[slot].endpoint.clone(),
        }
    }

    /// Moves the cursor to the next non-dead slot, wrapping once around
    /// the pool. Starts from slot 0 when no identity has been returned
    /// yet.
    fn advance(&mut self) -> Result<ProxyLease, PoolError> {
        if self.identities.is_empty() {
            return Err(PoolError::Exhausted);
        }
        let len = self.identities.len();
        let start = self.cursor.map_or(0, |c| (c + 1) % len);
        for offset in 0..len {
            let slot = (start + offset) % len;
            if !self.identities[slot].is_dead {
                self.cursor = Some(slot);
                return Ok(self.lease(slot));
            }
        }
        Err(PoolError::Exhausted)
    }
}

/// Parses one trimmed, non-comment proxy-list line.
///
/// Accepts exactly 2 fields (`host:port`) or 4 fields
/// (`host:port:username:password`); anything else is malformed.
fn parse_proxy_line(line: &str) -> Option<ProxyEndpoint> {
    let parts: Vec<&str> = line.split(':').collect();
    match parts.as_slice() {
        [host, port] => {
            if host.is_empty() || port.is_empty() {
                return None;
            }
            Some(ProxyEndpoint {
                address: format!("{host}:{port}"),
                credentials: None,
            })
        }
        [host, port, username, password] => {
            if host.is_empty() || port.is_empty() {
                return None;
            }
            Some(ProxyEndpoint {
                address: format!("{host}:{port}"),
                credentials: Some(ProxyCredentials {
                    username: (*username).to_owned(),
                    password: (*password).to_owned(),
                }),
            })
        }
        _ => None,
    }
}
