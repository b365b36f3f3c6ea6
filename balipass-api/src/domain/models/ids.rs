use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(i32);

        impl $name {
            pub fn new(id: i32) -> Self {
                Self(id)
            }

            pub fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_type!(
    /// A validated user identifier.
    ///
    /// Wraps i32 to match the database SERIAL type.
    UserId
);

id_type!(
    /// Identifier of a trip itinerary.
    ItineraryId
);

id_type!(
    /// Identifier of one day within an itinerary.
    ItineraryDayId
);

id_type!(
    /// Identifier of an offer planned onto a day.
    PlannedOfferId
);

id_type!(
    /// Identifier of a catalog offer. The catalog is never written by this
    /// service.
    OfferId
);

id_type!(
    /// Identifier of a catalog partner.
    PartnerId
);

id_type!(
    /// Identifier of a destination city.
    CityId
);
