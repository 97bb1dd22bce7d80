use crate::error::{Error, Result};
use crate::policy::ExpirationPolicy;
use crate::target::validate_optional_url;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use typed_builder::TypedBuilder;

/// Alphanumerics without the easily confused `0 O 1 l I i j o`.
pub const DEFAULT_ALPHABET: &str = "abcdefghkmnpqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const DEFAULT_LENGTH: usize = 6;

/// Global binding configuration.
///
/// Handed to the services at construction and consulted on every call; the
/// policy fields apply whenever a request brings no policy of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct BindingSettings {
    /// Characters generated ids are drawn from, and that strict binds accept.
    #[builder(default = DEFAULT_ALPHABET.to_string(), setter(into))]
    pub alphabet: String,
    /// Length of generated ids, and the length strict binds require.
    #[builder(default = DEFAULT_LENGTH)]
    pub length: usize,
    /// Default TTL in seconds.
    #[builder(default, setter(strip_option))]
    pub ttl: Option<u64>,
    /// Default explicit expiration date.
    #[builder(default, setter(strip_option))]
    pub expire_at: Option<Timestamp>,
    /// Default max-access count.
    #[builder(default, setter(strip_option))]
    pub max_access: Option<u64>,
    /// Where expired bindings without their own fallback redirect to.
    #[builder(default, setter(strip_option, into))]
    pub expired_redirect_url: Option<String>,
    /// Where exhausted bindings without their own fallback redirect to.
    #[builder(default, setter(strip_option, into))]
    pub exhausted_redirect_url: Option<String>,
}

impl Default for BindingSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BindingSettings {
    /// The global expiration policy.
    pub fn expiration_policy(&self) -> ExpirationPolicy {
        ExpirationPolicy::new(self.ttl, self.expire_at)
    }

    /// Checks the settings can drive the generator and the redirects.
    pub fn validate(&self) -> Result<()> {
        if self.alphabet.is_empty() {
            return Err(Error::InvalidSettings("alphabet is empty".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(c) = self.alphabet.chars().find(|c| !seen.insert(*c)) {
            return Err(Error::InvalidSettings(format!(
                "alphabet contains '{c}' more than once"
            )));
        }

        if self.length == 0 {
            return Err(Error::InvalidSettings(
                "id length must be positive".to_string(),
            ));
        }

        validate_optional_url(self.expired_redirect_url.as_deref())?;
        validate_optional_url(self.exhausted_redirect_url.as_deref())?;
        Ok(())
    }
}
