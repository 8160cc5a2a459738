//! Opaque share-link token.

use core::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShareToken`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareTokenError {
    /// The token does not have the expected length.
    #[error("share token must be {expected} characters")]
    InvalidLength {
        /// Expected token length.
        expected: usize,
    },
    /// The token contains a character outside the base64url alphabet.
    #[error("share token contains an invalid character")]
    InvalidCharacter,
}

/// Token embedded in a list's invitation link.
///
/// Generated from [`ShareToken::ENTROPY_BYTES`] random bytes encoded as
/// base64url without padding. The core crate does no I/O, so the caller
/// supplies the random bytes.
///
/// ```
/// use basket_core::ShareToken;
///
/// let token = ShareToken::from_entropy(&[7u8; 32]);
/// assert_eq!(token.as_str().len(), ShareToken::LENGTH);
/// assert_eq!(ShareToken::parse(token.as_str()).unwrap(), token);
///
/// assert!(ShareToken::parse("short").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareToken(String);

impl ShareToken {
    /// Number of random bytes behind a token.
    pub const ENTROPY_BYTES: usize = 32;

    /// Encoded length of a token.
    pub const LENGTH: usize = 43;

    /// Encode random bytes as a token.
    #[must_use]
    pub fn from_entropy(bytes: &[u8; Self::ENTROPY_BYTES]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Parse a token taken from a URL path.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not 43 characters of the base64url
    /// alphabet.
    pub fn parse(s: &str) -> Result<Self, ShareTokenError> {
        if s.len() != Self::LENGTH {
            return Err(ShareTokenError::InvalidLength {
                expected: Self::LENGTH,
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ShareTokenError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are bearer credentials; keep them out of logs.
impl fmt::Debug for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShareToken([REDACTED])")
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShareToken {
    type Error = ShareTokenError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ShareToken> for String {
    fn from(token: ShareToken) -> Self {
        token.0
    }
}

impl AsRef<str> for ShareToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShareToken {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShareToken {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShareToken {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
