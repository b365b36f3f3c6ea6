use serde::Serialize;
use time::{OffsetDateTime, Time};

use super::{timefmt, ItineraryDayId, OfferId, OfferSummary, PlannedOfferId};

/// A catalog offer attached to a specific day. The offer itself is a
/// non-owning reference; detaching never touches the catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlannedOffer {
    pub id: PlannedOfferId,
    pub day_id: ItineraryDayId,
    pub offer_id: OfferId,
    #[serde(with = "timefmt::option_time")]
    pub planned_time: Option<Time>,
    pub notes: Option<String>,
    pub visited: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub visited_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

/// A planned offer enriched with its catalog offer + partner summary, as
/// returned by the day view and the planned list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedOfferDetail {
    #[serde(flatten)]
    pub planned: PlannedOffer,
    pub offer: OfferSummary,
}

#[derive(Debug, Clone)]
pub struct NewPlannedOffer {
    pub day_id: ItineraryDayId,
    pub offer_id: OfferId,
    pub planned_time: Option<Time>,
    pub notes: Option<String>,
}

/// Partial patch; `None` fields keep the stored value. Setting `visited`
/// also maintains `visited_at` server-side.
#[derive(Debug, Clone, Default)]
pub struct PlannedOfferPatch {
    pub planned_time: Option<Time>,
    pub notes: Option<String>,
    pub visited: Option<bool>,
}
