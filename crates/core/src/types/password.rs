//! Account password type.

use secrecy::{ExposeSecret, SecretString};

/// Errors that can occur when accepting a [`Password`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The input is empty.
    #[error("password cannot be empty")]
    Empty,
    /// The input is shorter than the backend accepts.
    #[error("password must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The input is longer than the backend accepts.
    #[error("password must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A password held as a secret.
///
/// The value is never printed by `Debug` and must be exposed explicitly with
/// [`Password::expose`] when building a backend request.
#[derive(Debug, Clone)]
pub struct Password(SecretString);

impl Password {
    /// Minimum length accepted by the account service.
    pub const MIN_LENGTH: usize = 8;
    /// Maximum length accepted by the account service.
    pub const MAX_LENGTH: usize = 256;

    /// Accept a password typed by the user.
    ///
    /// Whitespace is significant and is not trimmed.
    ///
    /// # Errors
    ///
    /// Returns a [`PasswordError`] if the length is out of range.
    pub fn parse(s: &str) -> Result<Self, PasswordError> {
        let len = s.chars().count();
        if len == 0 {
            return Err(PasswordError::Empty);
        }
        if len < Self::MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if len > Self::MAX_LENGTH {
            return Err(PasswordError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(SecretString::from(s.to_owned())))
    }

    /// Expose the raw password.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_length_bounds() {
        assert_eq!(Password::parse("").unwrap_err(), PasswordError::Empty);
        assert_eq!(
            Password::parse("short").unwrap_err(),
            PasswordError::TooShort { min: 8 }
        );
        assert!(Password::parse("exactly8").is_ok());
        assert!(matches!(
            Password::parse(&"x".repeat(257)),
            Err(PasswordError::TooLong { max: 256 })
        ));
    }

    #[test]
    fn test_whitespace_is_kept() {
        let password = Password::parse("  padded pass  ").unwrap();
        assert_eq!(password.expose(), "  padded pass  ");
    }

    #[test]
    fn test_debug_redacts() {
        let password = Password::parse("hunter2hunter2").unwrap();
        let debug = format!("{password:?}");
        assert!(!debug.contains("hunter2"));
    }
}
