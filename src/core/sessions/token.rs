//! Session tokens.
use std::fmt;

use rand::Rng;

/// Number of random bytes behind a token; rendered as twice as many hex
/// characters.
const TOKEN_BYTES: usize = 16;

/// An opaque session token.
///
/// Tokens are issued on login, rotated on resume, and must accompany every
/// other tracker request together with the user name. They are derived from
/// a cryptographically strong source and rendered as lowercase hexadecimal.
///
/// Uniqueness among live sessions is checked by the issuer as a safety net;
/// the randomness is the primary guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// It generates a fresh random token.
    #[must_use]
    pub fn random() -> Self {
        let bytes: [u8; TOKEN_BYTES] = rand::thread_rng().gen();
        Self(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
