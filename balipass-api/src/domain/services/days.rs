use std::sync::Arc;

use itertools::Itertools;

use crate::domain::models::{
    DayPatch, DayWithPlans, ItineraryDay, ItineraryDayId, ItineraryId, NewDay, UserId,
};
use crate::domain::write_sequencer::WriteSequencer;
use crate::domain::PlannerError;
use crate::repositories::{DayRepository, ItineraryRepository, PlannedOfferRepository};

use super::list_cache::ListCache;

/// Ordered days of one itinerary, each carrying its destination city and
/// planned offers. The day view is assembled in a composite read: one days
/// query plus one batched planned-offers query, never a query per day.
pub struct DayScheduler<D, P, I> {
    days: Arc<D>,
    planned: Arc<P>,
    itineraries: Arc<I>,
    cache: Arc<ListCache>,
    sequencer: WriteSequencer<ItineraryDayId>,
}

impl<D, P, I> DayScheduler<D, P, I>
where
    D: DayRepository,
    P: PlannedOfferRepository,
    I: ItineraryRepository,
{
    pub fn new(days: Arc<D>, planned: Arc<P>, itineraries: Arc<I>, cache: Arc<ListCache>) -> Self {
        Self {
            days,
            planned,
            itineraries,
            cache,
            sequencer: WriteSequencer::new(),
        }
    }

    /// Days ordered by date ascending. An itinerary that does not exist or
    /// belongs to someone else yields an empty sequence, matching how a
    /// row-filtered store answers the same query.
    pub async fn list(
        &self,
        user_id: UserId,
        itinerary_id: ItineraryId,
    ) -> Result<Vec<DayWithPlans>, PlannerError> {
        match self.itineraries.get(itinerary_id).await {
            Ok(itinerary) if itinerary.user_id == user_id => {}
            Ok(_) => return Ok(Vec::new()),
            Err(crate::repositories::RepositoryError::NotFound(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        }

        if let Some(cached) = self.cache.days(itinerary_id) {
            return Ok(cached);
        }

        let days = self.days.list_for_itinerary(itinerary_id).await?;
        let day_ids: Vec<ItineraryDayId> = days.iter().map(|d| d.id).collect();
        let mut plans_by_day = self
            .planned
            .list_for_days(&day_ids)
            .await?
            .into_iter()
            .map(|detail| (detail.planned.day_id, detail))
            .into_group_map();

        let composed: Vec<DayWithPlans> = days
            .into_iter()
            .map(|day| {
                let planned_offers = plans_by_day.remove(&day.id).unwrap_or_default();
                DayWithPlans {
                    day,
                    planned_offers,
                }
            })
            .collect();

        self.cache.put_days(itinerary_id, composed.clone());
        Ok(composed)
    }

    pub async fn get(
        &self,
        user_id: UserId,
        id: ItineraryDayId,
    ) -> Result<ItineraryDay, PlannerError> {
        let day = self.days.get(id).await?;
        self.owned_itinerary(user_id, day.itinerary_id).await?;
        Ok(day)
    }

    /// Inserts under the parent itinerary. The day's date is intentionally
    /// not checked against the itinerary's range.
    pub async fn create(&self, user_id: UserId, day: NewDay) -> Result<ItineraryDay, PlannerError> {
        self.owned_itinerary(user_id, day.itinerary_id).await?;
        let created = self.days.insert(&day).await?;
        self.cache.invalidate_itinerary(day.itinerary_id);
        Ok(created)
    }

    pub async fn update(
        &self,
        user_id: UserId,
        id: ItineraryDayId,
        patch: DayPatch,
    ) -> Result<ItineraryDay, PlannerError> {
        let _slot = self.sequencer.acquire(id).await;

        let current = self.days.get(id).await?;
        self.owned_itinerary(user_id, current.itinerary_id).await?;

        let updated = self.days.update(id, &patch).await?;
        self.cache.invalidate_itinerary(current.itinerary_id);
        Ok(updated)
    }

    /// Single delete; the day's planned offers fall to the schema cascade.
    pub async fn delete(&self, user_id: UserId, id: ItineraryDayId) -> Result<(), PlannerError> {
        let _slot = self.sequencer.acquire(id).await;

        let current = self.days.get(id).await?;
        self.owned_itinerary(user_id, current.itinerary_id).await?;

        self.days.delete(id).await?;
        self.cache.invalidate_day(id, current.itinerary_id);
        Ok(())
    }

    async fn owned_itinerary(
        &self,
        user_id: UserId,
        itinerary_id: ItineraryId,
    ) -> Result<(), PlannerError> {
        let itinerary = self.itineraries.get(itinerary_id).await?;
        if itinerary.user_id != user_id {
            return Err(PlannerError::NotFound(format!("itinerary {itinerary_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::Date;

    use crate::domain::models::{CityId, NewItinerary, NewPlannedOffer, OfferId};
    use crate::repositories::mock::InMemoryStore;

    use super::*;

    fn date(year: i32, month: u8, day: u8) -> Date {
        Date::from_calendar_date(year, time::Month::try_from(month).unwrap(), day).unwrap()
    }

    fn scheduler(store: &InMemoryStore) -> DayScheduler<InMemoryStore, InMemoryStore, InMemoryStore> {
        let shared = Arc::new(store.clone());
        DayScheduler::new(
            Arc::clone(&shared),
            Arc::clone(&shared),
            shared,
            Arc::new(ListCache::new(100, Duration::from_secs(60))),
        )
    }

    async fn seed_itinerary(store: &InMemoryStore, user: UserId) -> ItineraryId {
        ItineraryRepository::insert(
            store,
            user,
            &NewItinerary {
                title: "Bali Trip".to_string(),
                description: None,
                start_date: date(2025, 6, 1),
                end_date: date(2025, 6, 5),
                is_active: true,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn new_day(itinerary_id: ItineraryId, day: u8, city_id: Option<i32>) -> NewDay {
        NewDay {
            itinerary_id,
            day_date: date(2025, 6, day),
            day_order: 0,
            city_id: city_id.map(CityId::new),
            notes: None,
        }
    }

    #[tokio::test]
    async fn days_come_back_date_ascending_with_city_and_plans() {
        let store = InMemoryStore::new()
            .with_city(1, "Ubud")
            .with_partner(1, "Warung Sari", 1)
            .with_offer(1, 1, "2-for-1 lunch", true);
        let user = UserId::new(1);
        let itinerary_id = seed_itinerary(&store, user).await;
        let scheduler = scheduler(&store);

        let later = scheduler
            .create(user, new_day(itinerary_id, 4, None))
            .await
            .unwrap();
        let earlier = scheduler
            .create(user, new_day(itinerary_id, 2, Some(1)))
            .await
            .unwrap();
        PlannedOfferRepository::insert(
            &store,
            &NewPlannedOffer {
                day_id: earlier.id,
                offer_id: OfferId::new(1),
                planned_time: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        let listed = scheduler.list(user, itinerary_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].day.id, earlier.id);
        assert_eq!(listed[0].day.city.as_ref().unwrap().name, "Ubud");
        assert_eq!(listed[0].planned_offers.len(), 1);
        assert_eq!(listed[0].planned_offers[0].offer.partner_name, "Warung Sari");
        assert_eq!(listed[1].day.id, later.id);
        assert!(listed[1].planned_offers.is_empty());
    }

    #[tokio::test]
    async fn listing_a_foreign_itinerary_yields_nothing() {
        let store = InMemoryStore::new();
        let owner = UserId::new(1);
        let itinerary_id = seed_itinerary(&store, owner).await;
        let scheduler = scheduler(&store);
        scheduler
            .create(owner, new_day(itinerary_id, 2, None))
            .await
            .unwrap();

        let listed = scheduler.list(UserId::new(2), itinerary_id).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn day_outside_the_itinerary_range_is_accepted() {
        let store = InMemoryStore::new();
        let user = UserId::new(1);
        let itinerary_id = seed_itinerary(&store, user).await;
        let scheduler = scheduler(&store);

        // 2025-07-15 is well outside 2025-06-01..=05; kept by design.
        let created = scheduler
            .create(
                user,
                NewDay {
                    itinerary_id,
                    day_date: date(2025, 7, 15),
                    day_order: 0,
                    city_id: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.day_date, date(2025, 7, 15));
    }

    #[tokio::test]
    async fn deleting_a_day_takes_its_planned_offers_with_it() {
        let store = InMemoryStore::new()
            .with_city(1, "Ubud")
            .with_partner(1, "Warung Sari", 1)
            .with_offer(1, 1, "2-for-1 lunch", true);
        let user = UserId::new(1);
        let itinerary_id = seed_itinerary(&store, user).await;
        let scheduler = scheduler(&store);

        let day = scheduler
            .create(user, new_day(itinerary_id, 2, Some(1)))
            .await
            .unwrap();
        PlannedOfferRepository::insert(
            &store,
            &NewPlannedOffer {
                day_id: day.id,
                offer_id: OfferId::new(1),
                planned_time: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        scheduler.delete(user, day.id).await.unwrap();

        assert_eq!(store.planned_count(), 0);
        assert!(scheduler.list(user, itinerary_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn day_list_reflects_new_day_after_cache_hit() {
        let store = InMemoryStore::new();
        let user = UserId::new(1);
        let itinerary_id = seed_itinerary(&store, user).await;
        let scheduler = scheduler(&store);

        assert!(scheduler.list(user, itinerary_id).await.unwrap().is_empty());

        scheduler
            .create(user, new_day(itinerary_id, 3, None))
            .await
            .unwrap();

        assert_eq!(scheduler.list(user, itinerary_id).await.unwrap().len(), 1);
    }
}
