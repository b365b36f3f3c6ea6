mod days;
mod itineraries;
mod list_cache;
mod offers;

pub use days::DayScheduler;
pub use itineraries::ItineraryService;
pub use list_cache::ListCache;
pub use offers::{OfferPlanner, RECOMMENDATION_LIMIT};
