use serde::Serialize;
use time::{Date, OffsetDateTime};

use super::{timefmt, ItineraryId, UserId};

/// A user's planned trip, bounded by an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub id: ItineraryId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "timefmt::date")]
    pub start_date: Date,
    #[serde(with = "timefmt::date")]
    pub end_date: Date,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewItinerary {
    pub title: String,
    pub description: Option<String>,
    pub start_date: Date,
    pub end_date: Date,
    pub is_active: bool,
}

/// Partial patch; `None` fields keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct ItineraryPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub is_active: Option<bool>,
}

impl ItineraryPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.is_active.is_none()
    }
}
