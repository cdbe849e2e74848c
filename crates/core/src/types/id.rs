//! Newtype IDs for type-safe entity references.
//!
//! Backend documents are keyed by opaque strings. Use the `define_id!` macro to
//! create wrappers that prevent accidentally mixing IDs from different
//! collections (a menu item id is never a customization id).

use thiserror::Error;

/// Maximum length of a backend document ID.
pub const MAX_ID_LENGTH: usize = 36;

/// Errors that can occur when parsing an ID.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty.
    #[error("id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `a-z A-Z 0-9 . - _`.
    #[error("id contains invalid character {0:?}")]
    InvalidChar(char),
    /// The input starts with a special character.
    #[error("id must start with a letter or digit")]
    LeadingSpecialChar,
}

/// Validate a document ID against the backend's ID rules.
///
/// # Errors
///
/// Returns an [`IdError`] describing the first rule the input breaks.
pub fn validate_id(s: &str) -> Result<(), IdError> {
    let first = s.chars().next().ok_or(IdError::Empty)?;

    if s.len() > MAX_ID_LENGTH {
        return Err(IdError::TooLong { max: MAX_ID_LENGTH });
    }

    if !first.is_ascii_alphanumeric() {
        return Err(IdError::LeadingSpecialChar);
    }

    if let Some(bad) = s
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
    {
        return Err(IdError::InvalidChar(bad));
    }

    Ok(())
}

/// Generate a fresh client-side document ID (32 lowercase hex characters).
#[must_use]
pub fn unique_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Constructors: `new()` (trusted input), `parse()` (validated), `unique()`
/// - `From<String>`, `From<&str>`, `AsRef<str>` and `Display`
///
/// # Example
///
/// ```rust
/// # use food_order_core::define_id;
/// define_id!(DishId);
/// define_id!(SauceId);
///
/// let dish = DishId::parse("burger-01").unwrap();
/// assert_eq!(dish.as_str(), "burger-01");
///
/// // These are different types, so this won't compile:
/// // let _: SauceId = dish;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an ID that came from a trusted source (e.g. a backend response).
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Parse and validate an ID supplied by a user.
            ///
            /// # Errors
            ///
            /// Returns an error if the input breaks the backend's ID rules.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                $crate::types::id::validate_id(s)?;
                Ok(Self(s.to_owned()))
            }

            /// Generate a new random ID.
            #[must_use]
            pub fn unique() -> Self {
                Self($crate::types::id::unique_id())
            }

            /// Get the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the ID is empty (only possible via `new`).
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Backend entity IDs
define_id!(AccountId);
define_id!(UserId);
define_id!(MenuItemId);
define_id!(CategoryId);
define_id!(CustomizationId);
define_id!(FileId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_backend_ids() {
        assert!(MenuItemId::parse("68d177bb002675c010d4").is_ok());
        assert!(MenuItemId::parse("classic-cheeseburger").is_ok());
        assert!(MenuItemId::parse("a.b_c-d").is_ok());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(MenuItemId::parse(""), Err(IdError::Empty));
    }

    #[test]
    fn test_parse_rejects_long() {
        let long = "a".repeat(MAX_ID_LENGTH + 1);
        assert_eq!(
            CategoryId::parse(&long),
            Err(IdError::TooLong { max: MAX_ID_LENGTH })
        );
    }

    #[test]
    fn test_parse_rejects_leading_special() {
        assert_eq!(
            CustomizationId::parse("_cheese"),
            Err(IdError::LeadingSpecialChar)
        );
    }

    #[test]
    fn test_parse_rejects_invalid_char() {
        assert_eq!(
            CustomizationId::parse("extra cheese"),
            Err(IdError::InvalidChar(' '))
        );
    }

    #[test]
    fn test_unique_is_valid_and_distinct() {
        let a = UserId::unique();
        let b = UserId::unique();
        assert_ne!(a, b);
        assert!(validate_id(a.as_str()).is_ok());
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_ids_order_by_string() {
        let mut ids = vec![
            CustomizationId::from("t2"),
            CustomizationId::from("s1"),
            CustomizationId::from("t1"),
        ];
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(CustomizationId::as_str).collect();
        assert_eq!(sorted, ["s1", "t1", "t2"]);
    }

    #[test]
    fn test_serde_transparent() {
        let id = MenuItemId::from("pizza");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"pizza\"");
        let back: MenuItemId = serde_json::from_str("\"pizza\"").unwrap();
        assert_eq!(back, id);
    }
}
