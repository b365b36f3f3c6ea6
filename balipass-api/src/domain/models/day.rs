use serde::Serialize;
use time::Date;

use super::{timefmt, City, CityId, ItineraryDayId, ItineraryId, PlannedOfferDetail};

/// One calendar day within an itinerary, optionally bound to a destination
/// city. `day_order` sequences days for display independently of the date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    pub id: ItineraryDayId,
    pub itinerary_id: ItineraryId,
    #[serde(with = "timefmt::date")]
    pub day_date: Date,
    pub day_order: i32,
    pub city: Option<City>,
    pub notes: Option<String>,
}

/// A day together with everything the day view renders: the destination
/// city and the full planned-offer list. Assembled in a composite read
/// rather than per-day follow-up queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWithPlans {
    #[serde(flatten)]
    pub day: ItineraryDay,
    pub planned_offers: Vec<PlannedOfferDetail>,
}

#[derive(Debug, Clone)]
pub struct NewDay {
    pub itinerary_id: ItineraryId,
    pub day_date: Date,
    pub day_order: i32,
    pub city_id: Option<CityId>,
    pub notes: Option<String>,
}

/// Partial patch; `None` fields keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct DayPatch {
    pub day_date: Option<Date>,
    pub day_order: Option<i32>,
    pub city_id: Option<CityId>,
    pub notes: Option<String>,
}
