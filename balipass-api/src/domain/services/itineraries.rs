use std::sync::Arc;

use time::Date;

use crate::domain::models::{Itinerary, ItineraryId, ItineraryPatch, NewItinerary, UserId};
use crate::domain::write_sequencer::WriteSequencer;
use crate::domain::PlannerError;
use crate::repositories::ItineraryRepository;

use super::list_cache::ListCache;

/// CRUD over a user's itinerary collection.
///
/// Validation runs before anything touches the store; the cache is only
/// invalidated after a successful round trip, so readers keep
/// last-known-good on failure. Mutations against the same itinerary are
/// sequenced so the last issued write wins.
pub struct ItineraryService<R> {
    repo: Arc<R>,
    cache: Arc<ListCache>,
    sequencer: WriteSequencer<ItineraryId>,
}

impl<R: ItineraryRepository> ItineraryService<R> {
    pub fn new(repo: Arc<R>, cache: Arc<ListCache>) -> Self {
        Self {
            repo,
            cache,
            sequencer: WriteSequencer::new(),
        }
    }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<Itinerary>, PlannerError> {
        if let Some(cached) = self.cache.itineraries(user_id) {
            return Ok(cached);
        }
        let itineraries = self.repo.list_for_user(user_id).await?;
        self.cache.put_itineraries(user_id, itineraries.clone());
        Ok(itineraries)
    }

    pub async fn get(&self, user_id: UserId, id: ItineraryId) -> Result<Itinerary, PlannerError> {
        let itinerary = self.repo.get(id).await?;
        owned_by(&itinerary, user_id)?;
        Ok(itinerary)
    }

    pub async fn create(
        &self,
        user_id: UserId,
        itinerary: NewItinerary,
    ) -> Result<Itinerary, PlannerError> {
        validate(
            &itinerary.title,
            itinerary.start_date,
            itinerary.end_date,
        )?;
        let created = self.repo.insert(user_id, &itinerary).await?;
        self.cache.invalidate_user(user_id);
        Ok(created)
    }

    pub async fn update(
        &self,
        user_id: UserId,
        id: ItineraryId,
        patch: ItineraryPatch,
    ) -> Result<Itinerary, PlannerError> {
        let _slot = self.sequencer.acquire(id).await;

        let current = self.repo.get(id).await?;
        owned_by(&current, user_id)?;

        // Validate the merged state, so a partial patch cannot break the
        // title/date invariants against the stored half.
        let title = patch.title.as_deref().unwrap_or(&current.title);
        let start = patch.start_date.unwrap_or(current.start_date);
        let end = patch.end_date.unwrap_or(current.end_date);
        validate(title, start, end)?;

        let updated = self.repo.update(id, &patch).await?;
        self.cache.invalidate_user(user_id);
        Ok(updated)
    }

    pub async fn delete(&self, user_id: UserId, id: ItineraryId) -> Result<(), PlannerError> {
        let _slot = self.sequencer.acquire(id).await;

        let current = self.repo.get(id).await?;
        owned_by(&current, user_id)?;

        // Single delete; days and planned offers fall to the schema cascade.
        self.repo.delete(id).await?;
        self.cache.invalidate_user(user_id);
        self.cache.invalidate_itinerary(id);
        Ok(())
    }
}

fn validate(title: &str, start_date: Date, end_date: Date) -> Result<(), PlannerError> {
    if title.trim().is_empty() {
        return Err(PlannerError::Validation("title must not be empty".into()));
    }
    if end_date < start_date {
        return Err(PlannerError::Validation(
            "end date must not precede start date".into(),
        ));
    }
    Ok(())
}

/// Rows of other users are indistinguishable from absent rows.
fn owned_by(itinerary: &Itinerary, user_id: UserId) -> Result<(), PlannerError> {
    if itinerary.user_id != user_id {
        return Err(PlannerError::NotFound(format!(
            "itinerary {}",
            itinerary.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::Date;

    use crate::repositories::mock::InMemoryStore;

    use super::*;

    fn date(year: i32, month: u8, day: u8) -> Date {
        Date::from_calendar_date(year, time::Month::try_from(month).unwrap(), day).unwrap()
    }

    fn service(store: &InMemoryStore) -> ItineraryService<InMemoryStore> {
        ItineraryService::new(
            Arc::new(store.clone()),
            Arc::new(ListCache::new(100, Duration::from_secs(60))),
        )
    }

    fn new_itinerary(title: &str, start: Date, end: Date) -> NewItinerary {
        NewItinerary {
            title: title.to_string(),
            description: None,
            start_date: start,
            end_date: end,
            is_active: false,
        }
    }

    #[tokio::test]
    async fn create_rejects_reversed_date_range_without_writing() {
        let store = InMemoryStore::new();
        let service = service(&store);

        let result = service
            .create(
                UserId::new(1),
                new_itinerary("Bali Trip", date(2025, 6, 5), date(2025, 6, 1)),
            )
            .await;

        assert!(matches!(result, Err(PlannerError::Validation(_))));
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn create_rejects_whitespace_title_without_writing() {
        let store = InMemoryStore::new();
        let service = service(&store);

        let result = service
            .create(
                UserId::new(1),
                new_itinerary("   ", date(2025, 6, 1), date(2025, 6, 5)),
            )
            .await;

        assert!(matches!(result, Err(PlannerError::Validation(_))));
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn single_day_trip_is_a_valid_range() {
        let store = InMemoryStore::new();
        let service = service(&store);

        let created = service
            .create(
                UserId::new(1),
                new_itinerary("Day trip", date(2025, 6, 1), date(2025, 6, 1)),
            )
            .await
            .unwrap();

        assert_eq!(created.start_date, created.end_date);
    }

    #[tokio::test]
    async fn list_is_ordered_by_start_date_descending() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let user = UserId::new(1);

        service
            .create(user, new_itinerary("Earlier", date(2025, 3, 1), date(2025, 3, 5)))
            .await
            .unwrap();
        service
            .create(user, new_itinerary("Later", date(2025, 9, 1), date(2025, 9, 5)))
            .await
            .unwrap();

        let listed = service.list(user).await.unwrap();
        assert_eq!(listed[0].title, "Later");
        assert_eq!(listed[1].title, "Earlier");
    }

    #[tokio::test]
    async fn list_does_not_leak_other_users_trips() {
        let store = InMemoryStore::new();
        let service = service(&store);

        service
            .create(
                UserId::new(1),
                new_itinerary("Mine", date(2025, 6, 1), date(2025, 6, 5)),
            )
            .await
            .unwrap();

        let other = service.list(UserId::new(2)).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn update_to_empty_title_fails_and_leaves_stored_title() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let user = UserId::new(1);

        let created = service
            .create(user, new_itinerary("Bali Trip", date(2025, 6, 1), date(2025, 6, 5)))
            .await
            .unwrap();

        let result = service
            .update(
                user,
                created.id,
                ItineraryPatch {
                    title: Some(String::new()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(PlannerError::Validation(_))));
        assert_eq!(store.stored_itinerary(created.id).unwrap().title, "Bali Trip");
    }

    #[tokio::test]
    async fn update_validates_patched_date_against_stored_one() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let user = UserId::new(1);

        let created = service
            .create(user, new_itinerary("Bali Trip", date(2025, 6, 1), date(2025, 6, 5)))
            .await
            .unwrap();

        // Moving only the end date before the stored start must fail.
        let result = service
            .update(
                user,
                created.id,
                ItineraryPatch {
                    end_date: Some(date(2025, 5, 30)),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(PlannerError::Validation(_))));
    }

    #[tokio::test]
    async fn update_of_missing_itinerary_is_not_found() {
        let store = InMemoryStore::new();
        let service = service(&store);

        let result = service
            .update(
                UserId::new(1),
                ItineraryId::new(99),
                ItineraryPatch {
                    title: Some("New".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(PlannerError::NotFound(_))));
    }

    #[tokio::test]
    async fn foreign_itinerary_reads_as_not_found() {
        let store = InMemoryStore::new();
        let service = service(&store);

        let created = service
            .create(
                UserId::new(1),
                new_itinerary("Mine", date(2025, 6, 1), date(2025, 6, 5)),
            )
            .await
            .unwrap();

        let result = service.delete(UserId::new(2), created.id).await;
        assert!(matches!(result, Err(PlannerError::NotFound(_))));
        assert_eq!(store.itinerary_count(), 1);
    }

    #[tokio::test]
    async fn delete_of_missing_itinerary_is_not_found() {
        let store = InMemoryStore::new();
        let service = service(&store);

        let result = service.delete(UserId::new(1), ItineraryId::new(42)).await;
        assert!(matches!(result, Err(PlannerError::NotFound(_))));
    }

    #[tokio::test]
    async fn active_flag_is_not_mutually_exclusive() {
        // Two trips can both be flagged active; the UI treats the flag as
        // exclusive but the model never enforced it.
        let store = InMemoryStore::new();
        let service = service(&store);
        let user = UserId::new(1);

        let mut first = new_itinerary("One", date(2025, 6, 1), date(2025, 6, 5));
        first.is_active = true;
        let mut second = new_itinerary("Two", date(2025, 7, 1), date(2025, 7, 5));
        second.is_active = true;

        service.create(user, first).await.unwrap();
        service.create(user, second).await.unwrap();

        let listed = service.list(user).await.unwrap();
        assert!(listed.iter().all(|i| i.is_active));
    }

    #[tokio::test]
    async fn list_reflects_creation_after_cache_hit() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let user = UserId::new(1);

        assert!(service.list(user).await.unwrap().is_empty());

        service
            .create(user, new_itinerary("Bali Trip", date(2025, 6, 1), date(2025, 6, 5)))
            .await
            .unwrap();

        // The cached empty list must have been dropped by the create.
        let listed = service.list(user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Bali Trip");
    }
}
