//! Newtype identifiers for the data model (`spec.md` §3).
//!
//! Mirrors the teacher's habit of wrapping a primitive representation in a
//! small `Clone`/`Eq`/`Hash` newtype (`Timestamp` wraps a tick count,
//! `TimeValue` wraps an `i64`) instead of passing bare `String`s around.

use std::fmt;

macro_rules! id_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub String);

        impl $name {
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

id_type!(WorkOrderId, "Stable identity of a [`crate::model::WorkOrder`].");
id_type!(WorkCenterId, "Stable identity of a [`crate::model::WorkCenter`].");
id_type!(
    ManufacturingOrderId,
    "Stable identity of a [`crate::model::ManufacturingOrder`]."
);
