//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `StudentId` where a `TeacherId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

typed_id!(TeacherId, "Unique identifier for a teacher.");
typed_id!(StudentId, "Unique identifier for a student.");
typed_id!(
    SubjectOfferingId,
    "Unique identifier for a subject a teacher offers at a price."
);
typed_id!(
    AvailabilityRuleId,
    "Unique identifier for a recurring or exception availability rule."
);
typed_id!(BookingId, "Unique identifier for a lesson booking.");
typed_id!(WalletEntryId, "Unique identifier for a wallet ledger entry.");
typed_id!(PayoutRequestId, "Unique identifier for a payout request.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ids_are_time_ordered() {
        let first = BookingId::new();
        let second = BookingId::new();
        assert!(first <= second);
    }

    #[test]
    fn test_id_roundtrips_through_display() {
        let id = TeacherId::new();
        let parsed = TeacherId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert!(WalletEntryId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let uuid = Uuid::nil();
        let id = PayoutRequestId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
