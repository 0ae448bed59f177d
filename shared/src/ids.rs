//! Strongly-typed identifiers for ledger records.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Raw integer value.
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Account identifier issued by the auth subsystem.
    UserId
);
define_id!(
    /// Level identifier issued by the level-management subsystem.
    LevelId
);
define_id!(
    /// Score entry identifier. Assigned in insertion order, so it doubles as a
    /// stable pagination cursor.
    ScoreId
);

impl LevelId {
    /// Converts the signed level id stored in a replay header.
    ///
    /// Replays recorded outside a published level carry `-1`, which maps to `None`.
    pub fn from_header(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().map(Self)
    }
}
