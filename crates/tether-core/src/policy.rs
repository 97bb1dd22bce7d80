//! Effective expiration and usage-limit resolution.
//!
//! A binding carries its own policy (from the request) and inherits the
//! global one from [`BindingSettings`][crate::settings::BindingSettings].
//! Local policy overrides global policy as a whole: if the request yields
//! any expiration, the global TTL and date are never looked at.

use crate::error::{Error, Result};
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// A TTL and/or an explicit expiration date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationPolicy {
    /// Seconds after the bind time. Zero counts as unset.
    pub ttl: Option<u64>,
    /// Absolute expiration date.
    pub expire_at: Option<Timestamp>,
}

impl ExpirationPolicy {
    pub fn new(ttl: Option<u64>, expire_at: Option<Timestamp>) -> Self {
        Self { ttl, expire_at }
    }

    /// The later of `bound_at + ttl` and `expire_at`.
    ///
    /// An unset component never wins over a set one; `None` means this
    /// policy has nothing to say.
    pub fn expiration(&self, bound_at: Timestamp) -> Result<Option<Timestamp>> {
        let by_ttl = match self.ttl.filter(|ttl| *ttl > 0) {
            Some(ttl) => Some(add_ttl(bound_at, ttl)?),
            None => None,
        };
        // `None < Some(_)` for `Option`, so `max` keeps the set value.
        Ok(by_ttl.max(self.expire_at))
    }
}

fn add_ttl(bound_at: Timestamp, ttl: u64) -> Result<Timestamp> {
    let secs = i64::try_from(ttl)
        .map_err(|_| Error::ExpirationOutOfRange(format!("ttl of {ttl}s is too large")))?;
    bound_at
        .checked_add(SignedDuration::from_secs(secs))
        .map_err(|e| Error::ExpirationOutOfRange(format!("{bound_at} + {ttl}s: {e}")))
}

/// Resolves the effective expiration of a binding.
///
/// The local policy is evaluated first; the global one only if the local
/// policy yields nothing. `Ok(None)` means the binding never expires by time.
pub fn resolve_expiration(
    bound_at: Timestamp,
    local: &ExpirationPolicy,
    global: &ExpirationPolicy,
) -> Result<Option<Timestamp>> {
    match local.expiration(bound_at)? {
        Some(expire_at) => Ok(Some(expire_at)),
        None => global.expiration(bound_at),
    }
}

/// Resolves the effective max-access count: local if non-zero, else global
/// if non-zero, else unlimited (`None`).
pub fn resolve_max_access(local: Option<u64>, global: Option<u64>) -> Option<u64> {
    local
        .filter(|max| *max > 0)
        .or_else(|| global.filter(|max| *max > 0))
}
