mod catalog;
mod day;
mod ids;
mod itinerary;
mod planned_offer;
pub mod timefmt;

pub use catalog::{City, OfferSummary};
pub use day::{DayPatch, DayWithPlans, ItineraryDay, NewDay};
pub use ids::{
    CityId, ItineraryDayId, ItineraryId, OfferId, PartnerId, PlannedOfferId, UserId,
};
pub use itinerary::{Itinerary, ItineraryPatch, NewItinerary};
pub use planned_offer::{NewPlannedOffer, PlannedOffer, PlannedOfferDetail, PlannedOfferPatch};
