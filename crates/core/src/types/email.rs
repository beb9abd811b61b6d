//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty (after trimming).
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain exactly one @ symbol")]
    AtSymbol,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain part (after @) is empty or has no dot.
    #[error("email domain is not valid")]
    InvalidDomain,
    /// The input contains whitespace.
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// An email address as accepted by the sign-up and checkout forms.
///
/// Surrounding whitespace is trimmed and the domain is lower-cased; the local
/// part is kept as typed. Deeper checks are the identity provider's job.
///
/// ## Examples
///
/// ```
/// use souq_core::Email;
///
/// let email = Email::parse("  Sara@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "Sara@example.com");
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from user input.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first rule the input breaks.
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
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let Some((local, domain)) = s.split_once('@') else {
            return Err(EmailError::AtSymbol);
        };
        if domain.contains('@') {
            return Err(EmailError::AtSymbol);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty()
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
        {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(format!("{local}@{}", domain.to_ascii_lowercase())))
    }

    /// Returns the email address as a string slice.
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

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user.name+tag@example.co.uk").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
    }

    #[test]
    fn test_parse_normalizes_domain_only() {
        let email = Email::parse(" Layla.H@Mail.Example.ORG\n").unwrap();
        assert_eq!(email.as_str(), "Layla.H@mail.example.org");
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("nobody"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("a@b@c.com"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("@example.com"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("user@"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("user@localhost"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("us er@example.com"), Err(EmailError::Whitespace));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let email: Email = serde_json::from_str("\"user@Example.com\"").unwrap();
        assert_eq!(email.to_string(), "user@example.com");
        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
    }
}
