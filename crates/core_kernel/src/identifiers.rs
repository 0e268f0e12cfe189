//! Strongly-typed identifiers for domain entities
//!
//! Claims, patients, and plans are keyed by the opaque string codes found in the
//! source tables (`C20003`, `P1001`, `MedicareB`). Newtype wrappers keep the three
//! key spaces from being mixed up while still allowing `&str` lookups through
//! `Borrow<str>`.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty or whitespace only
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Returns the entity label used in log and error messages
            pub fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ClaimId, "Claim");
define_id!(PatientId, "Patient");
define_id!(PlanId, "Plan");

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_display_is_raw_code() {
        let id = ClaimId::new("C20003");
        assert_eq!(id.to_string(), "C20003");
    }

    #[test]
    fn test_borrow_allows_str_lookup() {
        let mut map = HashMap::new();
        map.insert(PatientId::new("P1001"), 1);
        assert_eq!(map.get("P1001"), Some(&1));
    }

    #[test]
    fn test_blank_detection() {
        assert!(PlanId::new("   ").is_blank());
        assert!(!PlanId::new("MedicareA").is_blank());
    }
}
