use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The identifier a binding is stored under.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortId(String);

/// Which identifier constraints a bind call enforces.
///
/// Interactive binds enforce both; bulk import relaxes both so any
/// well-formed identifier is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enforcement {
    /// Reject ids containing characters outside the configured alphabet.
    pub alphabet: bool,
    /// Reject ids whose length differs from the configured length.
    pub length: bool,
}

impl Enforcement {
    pub const STRICT: Self = Self {
        alphabet: true,
        length: true,
    };

    pub const RELAXED: Self = Self {
        alphabet: false,
        length: false,
    };
}

impl Default for Enforcement {
    fn default() -> Self {
        Self::STRICT
    }
}

impl ShortId {
    /// Parses a caller-supplied id.
    ///
    /// Surrounding whitespace is trimmed. An empty id yields `Ok(None)`,
    /// meaning the caller wants one generated.
    pub fn parse(
        raw: &str,
        alphabet: &str,
        required_length: usize,
        enforcement: Enforcement,
    ) -> Result<Option<Self>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        validate(trimmed, alphabet, required_length, enforcement)?;
        Ok(Some(Self(trimmed.to_string())))
    }

    /// Creates a `ShortId` without validation.
    ///
    /// Use this only for ids produced by trusted sources, such as the
    /// generator or a store returning what it was given.
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates the full short URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Checks an id against the alphabet and length constraints.
///
/// The id is trimmed first and an empty id always passes: it stands for
/// "generate one", and the generator is trusted with both constraints.
/// Length is counted in characters.
pub fn validate(
    id: &str,
    alphabet: &str,
    required_length: usize,
    enforcement: Enforcement,
) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        return Ok(());
    }

    if enforcement.alphabet && id.chars().any(|c| !alphabet.contains(c)) {
        return Err(Error::InvalidAlphabet(id.to_string()));
    }

    if enforcement.length {
        let actual = id.chars().count();
        if actual != required_length {
            return Err(Error::InvalidLength {
                id: id.to_string(),
                actual,
                required: required_length,
            });
        }
    }

    Ok(())
}

impl Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
