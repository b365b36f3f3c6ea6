use std::sync::Arc;

use crate::domain::models::{
    CityId, ItineraryDay, ItineraryDayId, NewPlannedOffer, OfferSummary, PlannedOffer,
    PlannedOfferDetail, PlannedOfferId, PlannedOfferPatch, UserId,
};
use crate::domain::write_sequencer::WriteSequencer;
use crate::domain::PlannerError;
use crate::repositories::{
    CatalogRepository, DayRepository, ItineraryRepository, PlannedOfferRepository,
};

use super::list_cache::ListCache;

/// How many catalog offers a day's recommendation feed returns. There is no
/// ranking beyond catalog order; this is a filtered fetch, not a
/// recommendation engine.
pub const RECOMMENDATION_LIMIT: i64 = 20;

/// Attach/detach lifecycle of offers planned onto a day, plus the per-city
/// recommendation feed.
pub struct OfferPlanner<D, P, C, I> {
    days: Arc<D>,
    planned: Arc<P>,
    catalog: Arc<C>,
    itineraries: Arc<I>,
    cache: Arc<ListCache>,
    /// Orders attaches per day, which also keeps the uniqueness probe and
    /// the insert together when the constraint is on.
    attach_sequencer: WriteSequencer<ItineraryDayId>,
    edit_sequencer: WriteSequencer<PlannedOfferId>,
    unique_offer_per_day: bool,
}

impl<D, P, C, I> OfferPlanner<D, P, C, I>
where
    D: DayRepository,
    P: PlannedOfferRepository,
    C: CatalogRepository,
    I: ItineraryRepository,
{
    pub fn new(
        days: Arc<D>,
        planned: Arc<P>,
        catalog: Arc<C>,
        itineraries: Arc<I>,
        cache: Arc<ListCache>,
        unique_offer_per_day: bool,
    ) -> Self {
        Self {
            days,
            planned,
            catalog,
            itineraries,
            cache,
            attach_sequencer: WriteSequencer::new(),
            edit_sequencer: WriteSequencer::new(),
            unique_offer_per_day,
        }
    }

    /// Active offers around the day's destination city, capped at
    /// [`RECOMMENDATION_LIMIT`].
    pub async fn recommend(&self, city_id: CityId) -> Result<Vec<OfferSummary>, PlannerError> {
        Ok(self
            .catalog
            .active_offers_in_city(city_id, RECOMMENDATION_LIMIT)
            .await?)
    }

    /// Planned offers of the day, timed entries first in time order,
    /// untimed ones after them. A day that no longer exists answers
    /// `NotFound`, never an empty list.
    pub async fn list_planned(
        &self,
        user_id: UserId,
        day_id: ItineraryDayId,
    ) -> Result<Vec<PlannedOfferDetail>, PlannerError> {
        self.owned_day(user_id, day_id).await?;

        if let Some(cached) = self.cache.planned(day_id) {
            return Ok(cached);
        }
        let planned = self.planned.list_for_day(day_id).await?;
        self.cache.put_planned(day_id, planned.clone());
        Ok(planned)
    }

    pub async fn get(
        &self,
        user_id: UserId,
        id: PlannedOfferId,
    ) -> Result<PlannedOffer, PlannerError> {
        let planned = self.planned.get(id).await?;
        self.owned_day(user_id, planned.day_id).await?;
        Ok(planned)
    }

    pub async fn attach(
        &self,
        user_id: UserId,
        new_planned: NewPlannedOffer,
    ) -> Result<PlannedOffer, PlannerError> {
        let day = self.owned_day(user_id, new_planned.day_id).await?;
        let _slot = self.attach_sequencer.acquire(day.id).await;

        if self.unique_offer_per_day
            && self
                .planned
                .exists(new_planned.day_id, new_planned.offer_id)
                .await?
        {
            return Err(PlannerError::Constraint(format!(
                "offer {} is already planned for day {}",
                new_planned.offer_id, new_planned.day_id
            )));
        }

        let created = self.planned.insert(&new_planned).await?;
        self.cache.invalidate_day(day.id, day.itinerary_id);
        Ok(created)
    }

    pub async fn update(
        &self,
        user_id: UserId,
        id: PlannedOfferId,
        patch: PlannedOfferPatch,
    ) -> Result<PlannedOffer, PlannerError> {
        let _slot = self.edit_sequencer.acquire(id).await;

        let current = self.planned.get(id).await?;
        let day = self.owned_day(user_id, current.day_id).await?;

        let updated = self.planned.update(id, &patch).await?;
        self.cache.invalidate_day(day.id, day.itinerary_id);
        Ok(updated)
    }

    /// Removes the planned row only; the referenced catalog offer is
    /// untouched.
    pub async fn detach(&self, user_id: UserId, id: PlannedOfferId) -> Result<(), PlannerError> {
        let _slot = self.edit_sequencer.acquire(id).await;

        let current = self.planned.get(id).await?;
        let day = self.owned_day(user_id, current.day_id).await?;

        self.planned.delete(id).await?;
        self.cache.invalidate_day(day.id, day.itinerary_id);
        Ok(())
    }

    async fn owned_day(
        &self,
        user_id: UserId,
        day_id: ItineraryDayId,
    ) -> Result<ItineraryDay, PlannerError> {
        let day = self.days.get(day_id).await?;
        let itinerary = self.itineraries.get(day.itinerary_id).await?;
        if itinerary.user_id != user_id {
            return Err(PlannerError::NotFound(format!("day {day_id}")));
        }
        Ok(day)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::{Date, Time};

    use crate::domain::models::{ItineraryId, NewDay, NewItinerary, OfferId};
    use crate::repositories::mock::InMemoryStore;

    use super::*;

    type Planner = OfferPlanner<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore>;

    fn date(year: i32, month: u8, day: u8) -> Date {
        Date::from_calendar_date(year, time::Month::try_from(month).unwrap(), day).unwrap()
    }

    fn hm(hour: u8, minute: u8) -> Time {
        Time::from_hms(hour, minute, 0).unwrap()
    }

    fn planner_with(store: &InMemoryStore, unique: bool) -> Planner {
        let shared = Arc::new(store.clone());
        OfferPlanner::new(
            Arc::clone(&shared),
            Arc::clone(&shared),
            Arc::clone(&shared),
            shared,
            Arc::new(ListCache::new(100, Duration::from_secs(60))),
            unique,
        )
    }

    fn ubud_catalog() -> InMemoryStore {
        InMemoryStore::new()
            .with_city(1, "Ubud")
            .with_partner(1, "Warung Sari", 1)
            .with_offer(1, 1, "2-for-1 lunch", true)
            .with_offer(2, 1, "Spa discount", true)
            .with_offer(3, 1, "Rice terrace tour", true)
    }

    async fn seed_day(store: &InMemoryStore, user: UserId) -> (ItineraryId, ItineraryDayId) {
        let itinerary = ItineraryRepository::insert(
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
        .unwrap();
        let day = DayRepository::insert(
            store,
            &NewDay {
                itinerary_id: itinerary.id,
                day_date: date(2025, 6, 2),
                day_order: 0,
                city_id: Some(CityId::new(1)),
                notes: None,
            },
        )
        .await
        .unwrap();
        (itinerary.id, day.id)
    }

    fn attach_req(day_id: ItineraryDayId, offer: i32, at: Option<Time>) -> NewPlannedOffer {
        NewPlannedOffer {
            day_id,
            offer_id: OfferId::new(offer),
            planned_time: at,
            notes: None,
        }
    }

    #[tokio::test]
    async fn plan_a_day_in_ubud() {
        // Bali Trip -> day in Ubud -> O1 at 10:00 and O2 untimed -> [O1, O2].
        let store = ubud_catalog();
        let user = UserId::new(1);
        let (_, day_id) = seed_day(&store, user).await;
        let planner = planner_with(&store, false);

        planner
            .attach(user, attach_req(day_id, 1, Some(hm(10, 0))))
            .await
            .unwrap();
        planner
            .attach(user, attach_req(day_id, 2, None))
            .await
            .unwrap();

        let listed = planner.list_planned(user, day_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].planned.offer_id, OfferId::new(1));
        assert_eq!(listed[0].planned.planned_time, Some(hm(10, 0)));
        assert_eq!(listed[1].planned.offer_id, OfferId::new(2));
        assert_eq!(listed[1].planned.planned_time, None);
    }

    #[tokio::test]
    async fn untimed_entries_sort_after_all_timed_ones() {
        let store = ubud_catalog();
        let user = UserId::new(1);
        let (_, day_id) = seed_day(&store, user).await;
        let planner = planner_with(&store, false);

        planner
            .attach(user, attach_req(day_id, 1, None))
            .await
            .unwrap();
        planner
            .attach(user, attach_req(day_id, 2, Some(hm(14, 30))))
            .await
            .unwrap();
        planner
            .attach(user, attach_req(day_id, 3, Some(hm(9, 15))))
            .await
            .unwrap();

        let listed = planner.list_planned(user, day_id).await.unwrap();
        let times: Vec<Option<Time>> =
            listed.iter().map(|p| p.planned.planned_time).collect();
        assert_eq!(
            times,
            vec![Some(hm(9, 15)), Some(hm(14, 30)), None],
        );
    }

    #[tokio::test]
    async fn attaching_the_same_offer_twice_is_allowed_by_default() {
        // Duplicates are the observed product behavior; likely unintended,
        // but pinned here until the constraint flag flips.
        let store = ubud_catalog();
        let user = UserId::new(1);
        let (_, day_id) = seed_day(&store, user).await;
        let planner = planner_with(&store, false);

        planner
            .attach(user, attach_req(day_id, 1, None))
            .await
            .unwrap();
        planner
            .attach(user, attach_req(day_id, 1, None))
            .await
            .unwrap();

        let listed = planner.list_planned(user, day_id).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn constraint_flag_rejects_duplicate_attach() {
        let store = ubud_catalog();
        let user = UserId::new(1);
        let (_, day_id) = seed_day(&store, user).await;
        let planner = planner_with(&store, true);

        planner
            .attach(user, attach_req(day_id, 1, None))
            .await
            .unwrap();
        let result = planner.attach(user, attach_req(day_id, 1, None)).await;

        assert!(matches!(result, Err(PlannerError::Constraint(_))));
        assert_eq!(store.planned_count(), 1);
    }

    #[tokio::test]
    async fn listing_a_deleted_day_is_not_found() {
        let store = ubud_catalog();
        let user = UserId::new(1);
        let (_, day_id) = seed_day(&store, user).await;
        let planner = planner_with(&store, false);

        planner
            .attach(user, attach_req(day_id, 1, Some(hm(10, 0))))
            .await
            .unwrap();
        DayRepository::delete(&store, day_id).await.unwrap();

        let result = planner.list_planned(user, day_id).await;
        assert!(matches!(result, Err(PlannerError::NotFound(_))));
    }

    #[tokio::test]
    async fn detach_leaves_the_catalog_offer_alone() {
        let store = ubud_catalog();
        let user = UserId::new(1);
        let (_, day_id) = seed_day(&store, user).await;
        let planner = planner_with(&store, false);

        let planned = planner
            .attach(user, attach_req(day_id, 1, None))
            .await
            .unwrap();
        planner.detach(user, planned.id).await.unwrap();

        assert_eq!(store.planned_count(), 0);
        // Still recommendable: the catalog row survived the detach.
        let recommended = planner.recommend(CityId::new(1)).await.unwrap();
        assert!(recommended.iter().any(|o| o.id == OfferId::new(1)));
    }

    #[tokio::test]
    async fn visited_stamping_follows_the_flag() {
        let store = ubud_catalog();
        let user = UserId::new(1);
        let (_, day_id) = seed_day(&store, user).await;
        let planner = planner_with(&store, false);

        let planned = planner
            .attach(user, attach_req(day_id, 1, None))
            .await
            .unwrap();

        let visited = planner
            .update(
                user,
                planned.id,
                PlannedOfferPatch {
                    visited: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(visited.visited);
        assert!(visited.visited_at.is_some());

        let unvisited = planner
            .update(
                user,
                planned.id,
                PlannedOfferPatch {
                    visited: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!unvisited.visited);
        assert!(unvisited.visited_at.is_none());
    }

    #[tokio::test]
    async fn recommendations_skip_inactive_and_foreign_city_offers() {
        let store = ubud_catalog()
            .with_city(2, "Canggu")
            .with_partner(2, "Beach Club", 2)
            .with_offer(10, 2, "Sunset deal", true)
            .with_offer(11, 1, "Expired deal", false);
        let planner = planner_with(&store, false);

        let recommended = planner.recommend(CityId::new(1)).await.unwrap();
        assert_eq!(recommended.len(), 3);
        assert!(recommended.iter().all(|o| o.city_id == CityId::new(1)));
    }

    #[tokio::test]
    async fn foreign_days_are_invisible() {
        let store = ubud_catalog();
        let owner = UserId::new(1);
        let (_, day_id) = seed_day(&store, owner).await;
        let planner = planner_with(&store, false);

        let result = planner
            .attach(UserId::new(2), attach_req(day_id, 1, None))
            .await;
        assert!(matches!(result, Err(PlannerError::NotFound(_))));
    }
}
