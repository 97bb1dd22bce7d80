use crate::policy::ExpirationPolicy;
use crate::short_id::ShortId;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// A request to bind a URL to an id.
///
/// Only `url` is required. Callers that predate fallback URLs simply leave
/// those fields unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct BindRequest {
    /// The target URL; must be absolute.
    #[builder(setter(into))]
    pub url: String,
    /// Caller-chosen id. Unset or blank means "generate one".
    #[builder(default, setter(strip_option, into))]
    pub id: Option<String>,
    /// Seconds the binding lives after its bind time.
    #[builder(default, setter(strip_option))]
    pub ttl: Option<u64>,
    /// Explicit expiration date.
    #[builder(default, setter(strip_option))]
    pub expire_at: Option<Timestamp>,
    /// How many reads the binding serves before it is exhausted.
    #[builder(default, setter(strip_option))]
    pub max_access: Option<u64>,
    /// Redirect target once the binding has expired.
    #[builder(default, setter(strip_option, into))]
    pub expired_url: Option<String>,
    /// Redirect target once the binding is exhausted.
    #[builder(default, setter(strip_option, into))]
    pub exhausted_url: Option<String>,
}

impl BindRequest {
    /// A request with no id and no policy of its own.
    pub fn new(url: impl Into<String>) -> Self {
        Self::builder().url(url).build()
    }

    /// The request's own expiration policy.
    pub fn expiration_policy(&self) -> ExpirationPolicy {
        ExpirationPolicy::new(self.ttl, self.expire_at)
    }
}

/// A stored binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub id: ShortId,
    /// The primary redirect target.
    pub url: String,
    /// When the binding was first created. Never changes afterwards.
    pub bound_at: Timestamp,
    /// Effective expiration; `None` never expires by time.
    pub expire_at: Option<Timestamp>,
    /// Effective max-access count; `None` is unlimited.
    pub max_access: Option<u64>,
    /// Counting reads served so far.
    pub counter: u64,
    pub expired_url: Option<String>,
    pub exhausted_url: Option<String>,
}
