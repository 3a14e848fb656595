//! Typed database ids for CDF tables.
//!
//! Ids are plain `i64` newtypes; id 0 is reserved for the pre-seeded
//! "none or unknown" record in every table that has one.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
        )]
        pub struct $name(pub i64);

        impl $name {
            /// The pre-seeded fallback record.
            pub const NONE_OR_UNKNOWN: Self = Self(0);

            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ElectionId);
id_type!(ReportingUnitId);
id_type!(ContestId);
id_type!(CandidateId);
id_type!(PartyId);
id_type!(SelectionId);
id_type!(DatafileId);
