//! Strongly-typed record identifiers used across the domain.
//!
//! Records get autoincrement-like numeric ids from the record store. Each
//! bounded context wraps [`RecordId`] in its own newtype via [`record_id!`] so a
//! `PartId` can never be passed where an `OrderId` is expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Raw store-assigned identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("RecordId: {e}")))
    }
}

/// Declare a typed identifier newtype over [`RecordId`].
///
/// The calling crate must depend on `serde`.
#[macro_export]
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $crate::RecordId);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self($crate::RecordId::new(raw))
            }

            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$crate::RecordId> for $name {
            fn from(value: $crate::RecordId) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $crate::RecordId {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl core::str::FromStr for $name {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<$crate::RecordId>()
                    .map(Self)
                    .map_err(|_| $crate::DomainError::invalid_id(
                        format!("{}: {:?}", stringify!($name), s),
                    ))
            }
        }
    };
}
