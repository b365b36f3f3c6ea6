//! In-memory backing store for tests. One store implements every
//! repository trait so that cross-table behavior (foreign keys, cascade
//! deletes) matches what the Postgres schema declares.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::domain::models::{
    City, CityId, DayPatch, Itinerary, ItineraryDay, ItineraryDayId, ItineraryId, ItineraryPatch,
    NewDay, NewItinerary, NewPlannedOffer, OfferId, OfferSummary, PartnerId, PlannedOffer,
    PlannedOfferDetail, PlannedOfferId, PlannedOfferPatch, UserId,
};

use super::repo_error::RepositoryError;
use super::{CatalogRepository, DayRepository, ItineraryRepository, PlannedOfferRepository};

#[derive(Debug, Clone)]
struct StoredDay {
    id: ItineraryDayId,
    itinerary_id: ItineraryId,
    day_date: time::Date,
    day_order: i32,
    city_id: Option<CityId>,
    notes: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredPartner {
    id: PartnerId,
    name: String,
    city_id: CityId,
}

#[derive(Debug, Clone)]
struct StoredOffer {
    id: OfferId,
    partner_id: PartnerId,
    title: String,
    description: Option<String>,
    discount_percent: Option<i32>,
    is_active: bool,
}

#[derive(Default)]
struct Tables {
    itineraries: HashMap<i32, Itinerary>,
    days: HashMap<i32, StoredDay>,
    planned: HashMap<i32, PlannedOffer>,
    cities: HashMap<i32, City>,
    partners: HashMap<i32, StoredPartner>,
    offers: HashMap<i32, StoredOffer>,
    next_id: i32,
    insert_calls: usize,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn offer_summary(&self, offer_id: OfferId) -> Option<OfferSummary> {
        let offer = self.offers.get(&offer_id.as_i32())?;
        let partner = self.partners.get(&offer.partner_id.as_i32())?;
        Some(OfferSummary {
            id: offer.id,
            partner_id: partner.id,
            partner_name: partner.name.clone(),
            city_id: partner.city_id,
            title: offer.title.clone(),
            description: offer.description.clone(),
            discount_percent: offer.discount_percent,
        })
    }

    fn day_with_city(&self, day: &StoredDay) -> ItineraryDay {
        ItineraryDay {
            id: day.id,
            itinerary_id: day.itinerary_id,
            day_date: day.day_date,
            day_order: day.day_order,
            city: day
                .city_id
                .and_then(|id| self.cities.get(&id.as_i32()).cloned()),
            notes: day.notes.clone(),
        }
    }

    fn planned_details_for(&self, day_ids: &[ItineraryDayId]) -> Vec<PlannedOfferDetail> {
        let mut details: Vec<PlannedOfferDetail> = self
            .planned
            .values()
            .filter(|p| day_ids.contains(&p.day_id))
            .filter_map(|p| {
                self.offer_summary(p.offer_id).map(|offer| PlannedOfferDetail {
                    planned: p.clone(),
                    offer,
                })
            })
            .collect();

        // planned_time ASC NULLS LAST, then added_at, then id
        details.sort_by(|a, b| {
            let time_order = match (a.planned.planned_time, b.planned.planned_time) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };
            time_order
                .then(a.planned.added_at.cmp(&b.planned.added_at))
                .then(a.planned.id.as_i32().cmp(&b.planned.id.as_i32()))
        });
        details
    }
}

/// Shared in-memory store. Clones see the same tables, so the itinerary,
/// day and planner services under test all observe one database.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

#[allow(dead_code)]
impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(self, id: i32, name: &str) -> Self {
        self.tables.write().unwrap().cities.insert(
            id,
            City {
                id: CityId::new(id),
                name: name.to_string(),
                center_lat: 0.0,
                center_lng: 0.0,
            },
        );
        self
    }

    pub fn with_partner(self, id: i32, name: &str, city_id: i32) -> Self {
        self.tables.write().unwrap().partners.insert(
            id,
            StoredPartner {
                id: PartnerId::new(id),
                name: name.to_string(),
                city_id: CityId::new(city_id),
            },
        );
        self
    }

    pub fn with_offer(self, id: i32, partner_id: i32, title: &str, is_active: bool) -> Self {
        self.tables.write().unwrap().offers.insert(
            id,
            StoredOffer {
                id: OfferId::new(id),
                partner_id: PartnerId::new(partner_id),
                title: title.to_string(),
                description: None,
                discount_percent: None,
                is_active,
            },
        );
        self
    }

    /// Number of write calls that reached the store, for asserting that
    /// failed validation issues none.
    pub fn insert_calls(&self) -> usize {
        self.tables.read().unwrap().insert_calls
    }

    pub fn itinerary_count(&self) -> usize {
        self.tables.read().unwrap().itineraries.len()
    }

    pub fn day_count(&self) -> usize {
        self.tables.read().unwrap().days.len()
    }

    pub fn planned_count(&self) -> usize {
        self.tables.read().unwrap().planned.len()
    }

    pub fn stored_itinerary(&self, id: ItineraryId) -> Option<Itinerary> {
        self.tables
            .read()
            .unwrap()
            .itineraries
            .get(&id.as_i32())
            .cloned()
    }
}

#[async_trait]
impl ItineraryRepository for InMemoryStore {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Itinerary>, RepositoryError> {
        let tables = self.tables.read().unwrap();
        let mut itineraries: Vec<Itinerary> = tables
            .itineraries
            .values()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        itineraries.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(itineraries)
    }

    async fn get(&self, id: ItineraryId) -> Result<Itinerary, RepositoryError> {
        self.tables
            .read()
            .unwrap()
            .itineraries
            .get(&id.as_i32())
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("itinerary {id}")))
    }

    async fn insert(
        &self,
        user_id: UserId,
        itinerary: &NewItinerary,
    ) -> Result<Itinerary, RepositoryError> {
        let mut tables = self.tables.write().unwrap();
        tables.insert_calls += 1;
        let id = tables.next_id();
        let now = OffsetDateTime::now_utc();
        let stored = Itinerary {
            id: ItineraryId::new(id),
            user_id,
            title: itinerary.title.clone(),
            description: itinerary.description.clone(),
            start_date: itinerary.start_date,
            end_date: itinerary.end_date,
            is_active: itinerary.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.itineraries.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: ItineraryId,
        patch: &ItineraryPatch,
    ) -> Result<Itinerary, RepositoryError> {
        let mut tables = self.tables.write().unwrap();
        let stored = tables
            .itineraries
            .get_mut(&id.as_i32())
            .ok_or_else(|| RepositoryError::NotFound(format!("itinerary {id}")))?;
        if let Some(title) = &patch.title {
            stored.title = title.clone();
        }
        if let Some(description) = &patch.description {
            stored.description = Some(description.clone());
        }
        if let Some(start_date) = patch.start_date {
            stored.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            stored.end_date = end_date;
        }
        if let Some(is_active) = patch.is_active {
            stored.is_active = is_active;
        }
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }

    async fn delete(&self, id: ItineraryId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().unwrap();
        if tables.itineraries.remove(&id.as_i32()).is_none() {
            return Err(RepositoryError::NotFound(format!("itinerary {id}")));
        }
        // Declared cascades: days of the itinerary, then their planned offers.
        let day_ids: Vec<ItineraryDayId> = tables
            .days
            .values()
            .filter(|d| d.itinerary_id == id)
            .map(|d| d.id)
            .collect();
        tables.days.retain(|_, d| d.itinerary_id != id);
        tables.planned.retain(|_, p| !day_ids.contains(&p.day_id));
        Ok(())
    }
}

#[async_trait]
impl DayRepository for InMemoryStore {
    async fn list_for_itinerary(
        &self,
        itinerary_id: ItineraryId,
    ) -> Result<Vec<ItineraryDay>, RepositoryError> {
        let tables = self.tables.read().unwrap();
        let mut days: Vec<&StoredDay> = tables
            .days
            .values()
            .filter(|d| d.itinerary_id == itinerary_id)
            .collect();
        days.sort_by(|a, b| {
            a.day_date
                .cmp(&b.day_date)
                .then(a.day_order.cmp(&b.day_order))
        });
        Ok(days.into_iter().map(|d| tables.day_with_city(d)).collect())
    }

    async fn get(&self, id: ItineraryDayId) -> Result<ItineraryDay, RepositoryError> {
        let tables = self.tables.read().unwrap();
        tables
            .days
            .get(&id.as_i32())
            .map(|d| tables.day_with_city(d))
            .ok_or_else(|| RepositoryError::NotFound(format!("day {id}")))
    }

    async fn insert(&self, day: &NewDay) -> Result<ItineraryDay, RepositoryError> {
        let mut tables = self.tables.write().unwrap();
        tables.insert_calls += 1;
        if !tables.itineraries.contains_key(&day.itinerary_id.as_i32()) {
            return Err(RepositoryError::Constraint(format!(
                "itinerary {} does not exist",
                day.itinerary_id
            )));
        }
        let id = tables.next_id();
        let stored = StoredDay {
            id: ItineraryDayId::new(id),
            itinerary_id: day.itinerary_id,
            day_date: day.day_date,
            day_order: day.day_order,
            city_id: day.city_id,
            notes: day.notes.clone(),
        };
        let result = tables.day_with_city(&stored);
        tables.days.insert(id, stored);
        Ok(result)
    }

    async fn update(
        &self,
        id: ItineraryDayId,
        patch: &DayPatch,
    ) -> Result<ItineraryDay, RepositoryError> {
        let mut tables = self.tables.write().unwrap();
        let stored = tables
            .days
            .get_mut(&id.as_i32())
            .ok_or_else(|| RepositoryError::NotFound(format!("day {id}")))?;
        if let Some(day_date) = patch.day_date {
            stored.day_date = day_date;
        }
        if let Some(day_order) = patch.day_order {
            stored.day_order = day_order;
        }
        if let Some(city_id) = patch.city_id {
            stored.city_id = Some(city_id);
        }
        if let Some(notes) = &patch.notes {
            stored.notes = Some(notes.clone());
        }
        let updated = stored.clone();
        Ok(tables.day_with_city(&updated))
    }

    async fn delete(&self, id: ItineraryDayId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().unwrap();
        if tables.days.remove(&id.as_i32()).is_none() {
            return Err(RepositoryError::NotFound(format!("day {id}")));
        }
        tables.planned.retain(|_, p| p.day_id != id);
        Ok(())
    }
}

#[async_trait]
impl PlannedOfferRepository for InMemoryStore {
    async fn list_for_day(
        &self,
        day_id: ItineraryDayId,
    ) -> Result<Vec<PlannedOfferDetail>, RepositoryError> {
        Ok(self.tables.read().unwrap().planned_details_for(&[day_id]))
    }

    async fn list_for_days(
        &self,
        day_ids: &[ItineraryDayId],
    ) -> Result<Vec<PlannedOfferDetail>, RepositoryError> {
        Ok(self.tables.read().unwrap().planned_details_for(day_ids))
    }

    async fn get(&self, id: PlannedOfferId) -> Result<PlannedOffer, RepositoryError> {
        self.tables
            .read()
            .unwrap()
            .planned
            .get(&id.as_i32())
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("planned offer {id}")))
    }

    async fn exists(
        &self,
        day_id: ItineraryDayId,
        offer_id: OfferId,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .planned
            .values()
            .any(|p| p.day_id == day_id && p.offer_id == offer_id))
    }

    async fn insert(&self, planned: &NewPlannedOffer) -> Result<PlannedOffer, RepositoryError> {
        let mut tables = self.tables.write().unwrap();
        tables.insert_calls += 1;
        if !tables.days.contains_key(&planned.day_id.as_i32()) {
            return Err(RepositoryError::Constraint(format!(
                "day {} does not exist",
                planned.day_id
            )));
        }
        if !tables.offers.contains_key(&planned.offer_id.as_i32()) {
            return Err(RepositoryError::Constraint(format!(
                "offer {} does not exist",
                planned.offer_id
            )));
        }
        let id = tables.next_id();
        let stored = PlannedOffer {
            id: PlannedOfferId::new(id),
            day_id: planned.day_id,
            offer_id: planned.offer_id,
            planned_time: planned.planned_time,
            notes: planned.notes.clone(),
            visited: false,
            visited_at: None,
            added_at: OffsetDateTime::now_utc(),
        };
        tables.planned.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: PlannedOfferId,
        patch: &PlannedOfferPatch,
    ) -> Result<PlannedOffer, RepositoryError> {
        let mut tables = self.tables.write().unwrap();
        let stored = tables
            .planned
            .get_mut(&id.as_i32())
            .ok_or_else(|| RepositoryError::NotFound(format!("planned offer {id}")))?;
        if let Some(planned_time) = patch.planned_time {
            stored.planned_time = Some(planned_time);
        }
        if let Some(notes) = &patch.notes {
            stored.notes = Some(notes.clone());
        }
        if let Some(visited) = patch.visited {
            stored.visited = visited;
            stored.visited_at = visited.then(OffsetDateTime::now_utc);
        }
        Ok(stored.clone())
    }

    async fn delete(&self, id: PlannedOfferId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().unwrap();
        if tables.planned.remove(&id.as_i32()).is_none() {
            return Err(RepositoryError::NotFound(format!("planned offer {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn active_offers_in_city(
        &self,
        city_id: CityId,
        limit: i64,
    ) -> Result<Vec<OfferSummary>, RepositoryError> {
        let tables = self.tables.read().unwrap();
        let mut offers: Vec<&StoredOffer> = tables
            .offers
            .values()
            .filter(|o| o.is_active)
            .filter(|o| {
                tables
                    .partners
                    .get(&o.partner_id.as_i32())
                    .is_some_and(|p| p.city_id == city_id)
            })
            .collect();
        offers.sort_by_key(|o| o.id.as_i32());
        Ok(offers
            .into_iter()
            .take(limit as usize)
            .filter_map(|o| tables.offer_summary(o.id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use time::Date;

    use super::*;

    fn date(year: i32, month: u8, day: u8) -> Date {
        Date::from_calendar_date(year, time::Month::try_from(month).unwrap(), day).unwrap()
    }

    async fn seed_itinerary(store: &InMemoryStore) -> Itinerary {
        ItineraryRepository::insert(
            store,
            UserId::new(1),
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
    }

    #[tokio::test]
    async fn itinerary_delete_cascades_to_days_and_planned_offers() {
        let store = InMemoryStore::new()
            .with_city(1, "Ubud")
            .with_partner(1, "Warung Sari", 1)
            .with_offer(1, 1, "2-for-1 lunch", true);

        let itinerary = seed_itinerary(&store).await;
        let day = DayRepository::insert(
            &store,
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

        ItineraryRepository::delete(&store, itinerary.id)
            .await
            .unwrap();

        assert_eq!(store.day_count(), 0);
        assert_eq!(store.planned_count(), 0);
        let days = store.list_for_itinerary(itinerary.id).await.unwrap();
        assert!(days.is_empty());
    }

    #[tokio::test]
    async fn day_insert_requires_existing_itinerary() {
        let store = InMemoryStore::new();
        let result = DayRepository::insert(
            &store,
            &NewDay {
                itinerary_id: ItineraryId::new(99),
                day_date: date(2025, 6, 2),
                day_order: 0,
                city_id: None,
                notes: None,
            },
        )
        .await;
        assert!(matches!(result, Err(RepositoryError::Constraint(_))));
    }

    #[tokio::test]
    async fn city_filter_and_cap_on_catalog_reads() {
        let mut store = InMemoryStore::new()
            .with_city(1, "Ubud")
            .with_city(2, "Canggu")
            .with_partner(1, "In Ubud", 1)
            .with_partner(2, "In Canggu", 2);
        for id in 1..=25 {
            store = store.with_offer(id, 1, &format!("offer {id}"), true);
        }
        store = store.with_offer(100, 2, "elsewhere", true);
        store = store.with_offer(101, 1, "inactive", false);

        let offers = store
            .active_offers_in_city(CityId::new(1), 20)
            .await
            .unwrap();
        assert_eq!(offers.len(), 20);
        assert!(offers.iter().all(|o| o.city_id == CityId::new(1)));
        // Catalog order is id ascending, so the cap drops the tail.
        assert_eq!(offers[0].id, OfferId::new(1));
    }
}
