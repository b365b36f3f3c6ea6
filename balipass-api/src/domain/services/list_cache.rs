use std::time::Duration;

use moka::sync::Cache;

use crate::domain::models::{
    DayWithPlans, Itinerary, ItineraryDayId, ItineraryId, PlannedOfferDetail, UserId,
};

/// Explicit keyed cache for the three list families, replacing what the
/// client app held as ambient per-query state. Each family is keyed by its
/// scoping id and dropped when a mutation touches that key; TTL bounds
/// staleness for anything invalidation misses.
pub struct ListCache {
    itineraries: Cache<UserId, Vec<Itinerary>>,
    days: Cache<ItineraryId, Vec<DayWithPlans>>,
    planned: Cache<ItineraryDayId, Vec<PlannedOfferDetail>>,
}

impl ListCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            itineraries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            days: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            planned: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn itineraries(&self, user_id: UserId) -> Option<Vec<Itinerary>> {
        self.itineraries.get(&user_id)
    }

    pub fn put_itineraries(&self, user_id: UserId, lists: Vec<Itinerary>) {
        self.itineraries.insert(user_id, lists);
    }

    pub fn days(&self, itinerary_id: ItineraryId) -> Option<Vec<DayWithPlans>> {
        self.days.get(&itinerary_id)
    }

    pub fn put_days(&self, itinerary_id: ItineraryId, days: Vec<DayWithPlans>) {
        self.days.insert(itinerary_id, days);
    }

    pub fn planned(&self, day_id: ItineraryDayId) -> Option<Vec<PlannedOfferDetail>> {
        self.planned.get(&day_id)
    }

    pub fn put_planned(&self, day_id: ItineraryDayId, planned: Vec<PlannedOfferDetail>) {
        self.planned.insert(day_id, planned);
    }

    /// An itinerary was created, patched or deleted.
    pub fn invalidate_user(&self, user_id: UserId) {
        self.itineraries.invalidate(&user_id);
    }

    /// A day under the itinerary changed, or the itinerary went away.
    pub fn invalidate_itinerary(&self, itinerary_id: ItineraryId) {
        self.days.invalidate(&itinerary_id);
    }

    /// A planned offer under the day changed. The composite day view embeds
    /// planned offers, so the parent family drops too.
    pub fn invalidate_day(&self, day_id: ItineraryDayId, itinerary_id: ItineraryId) {
        self.planned.invalidate(&day_id);
        self.days.invalidate(&itinerary_id);
    }
}
