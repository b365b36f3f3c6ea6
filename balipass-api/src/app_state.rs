use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use url::Url;

use crate::config::Settings;
use crate::domain::services::{DayScheduler, ItineraryService, ListCache, OfferPlanner};
use crate::repositories::{
    CatalogRepositoryImpl, DayRepositoryImpl, ItineraryRepositoryImpl, PlannedOfferRepositoryImpl,
};

pub type Itineraries = ItineraryService<ItineraryRepositoryImpl>;
pub type Days = DayScheduler<DayRepositoryImpl, PlannedOfferRepositoryImpl, ItineraryRepositoryImpl>;
pub type Planner = OfferPlanner<
    DayRepositoryImpl,
    PlannedOfferRepositoryImpl,
    CatalogRepositoryImpl,
    ItineraryRepositoryImpl,
>;

#[derive(Clone)]
pub struct AppState {
    pub app_url: Url,
    pub itineraries: Arc<Itineraries>,
    pub days: Arc<Days>,
    pub offer_planner: Arc<Planner>,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: &Settings) -> Self {
        let app_url = Url::parse(&config.application.app_url).expect("Invalid app URL");

        let cache = Arc::new(ListCache::new(
            config.planner.cache_capacity,
            Duration::from_secs(config.planner.cache_ttl_seconds),
        ));
        let itinerary_repo = Arc::new(ItineraryRepositoryImpl::new(db_pool.clone()));
        let day_repo = Arc::new(DayRepositoryImpl::new(db_pool.clone()));
        let planned_repo = Arc::new(PlannedOfferRepositoryImpl::new(db_pool.clone()));
        let catalog_repo = Arc::new(CatalogRepositoryImpl::new(db_pool));

        Self {
            app_url,
            itineraries: Arc::new(ItineraryService::new(
                Arc::clone(&itinerary_repo),
                Arc::clone(&cache),
            )),
            days: Arc::new(DayScheduler::new(
                Arc::clone(&day_repo),
                Arc::clone(&planned_repo),
                Arc::clone(&itinerary_repo),
                Arc::clone(&cache),
            )),
            offer_planner: Arc::new(OfferPlanner::new(
                day_repo,
                planned_repo,
                catalog_repo,
                itinerary_repo,
                cache,
                config.planner.unique_offer_per_day,
            )),
        }
    }
}
