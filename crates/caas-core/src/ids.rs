//! Identifier types for CaaS resources.
//!
//! The backend assigns opaque string identifiers to clusters and blueprints,
//! and scopes them by site (appliance) and space. Each gets its own newtype so
//! a site ID can never be passed where a space ID is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier without validation.
            ///
            /// Use this for values that come from the backend, which is
            /// authoritative for its own identifiers.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Parse a user-supplied identifier.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is empty or only whitespace.
            pub fn parse(value: &str) -> Result<Self, IdError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(IdError::Empty(stringify!($name)));
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
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

opaque_id!(
    /// Identifier of a cluster, assigned by the backend on creation.
    ClusterId
);

opaque_id!(
    /// Identifier of a site (appliance) where clusters are provisioned.
    SiteId
);

opaque_id!(
    /// Identifier of the space (tenancy scope) that owns a cluster.
    SpaceId
);

opaque_id!(
    /// Identifier of a machine blueprint.
    MachineBlueprintId
);

opaque_id!(
    /// Identifier of a cluster blueprint.
    ClusterBlueprintId
);

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier was empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}
