//! Contact email collected at signup.

use core::fmt;

/// Errors raised while parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// Nothing left after trimming.
    #[error("email is required")]
    Empty,
    /// Longer than the RFC 5321 path limit.
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    /// Not of the form `local@domain`.
    #[error("email must look like name@example.com")]
    Malformed,
}

/// A user's contact email address.
///
/// Only the shape is checked: exactly one `@` with text on both sides and no
/// whitespace. Nothing is ever sent to it.
///
/// ```
/// use pixel_vault_core::Email;
///
/// assert_eq!(Email::parse(" player@example.com ").unwrap().as_str(), "player@example.com");
/// assert!(Email::parse("player@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Longest accepted address.
    pub const MAX_LENGTH: usize = 254;

    /// Parse form input into an `Email`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the input is blank, too long or not of the
    /// form `local@domain`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let well_formed = s.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }) && !s.chars().any(char::is_whitespace);
        if !well_formed {
            return Err(EmailError::Malformed);
        }

        Ok(Self(s.to_owned()))
    }

    /// The address as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
