//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("email cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain an @ symbol.
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    /// The part before the @ is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The part after the @ is empty.
    #[error("email domain cannot be empty")]
    EmptyDomain,
    /// The address contains whitespace.
    #[error("email cannot contain whitespace")]
    ContainsWhitespace,
}

/// Cheap check used while the shopper is still typing.
///
/// Anything containing an `@` is worth snapshotting for abandoned-cart
/// reminders; full validation happens at submission through [`Email::parse`].
#[must_use]
pub fn looks_like_email(input: &str) -> bool {
    input.contains('@')
}

/// A validated contact email address.
///
/// Surrounding whitespace is trimmed before validation, so values copied out of
/// a form field parse cleanly.
///
/// ## Examples
///
/// ```
/// use annya_core::Email;
///
/// assert!(Email::parse("priya@example.in").is_ok());
/// assert!(Email::parse("  priya@example.in ").is_ok());
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("priya").is_err());
/// assert!(Email::parse("priya@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, contains
    /// whitespace, or lacks a local part or domain around the `@`.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::ContainsWhitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::MissingAtSymbol)?;
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
