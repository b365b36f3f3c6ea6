use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    domain::models::{CityId, OfferSummary},
    routes::ApiError,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/recommendations", get(recommendations))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationsQuery {
    city_id: Option<CityId>,
}

/// The feed is disabled while the day has no destination city; an absent
/// `cityId` answers an empty list without touching the catalog.
#[instrument(name = "GET /offers/recommendations", skip(app_state))]
async fn recommendations(
    State(app_state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<Vec<OfferSummary>>, ApiError> {
    let Some(city_id) = query.city_id else {
        return Ok(Json(Vec::new()));
    };

    let offers = app_state.offer_planner.recommend(city_id).await?;
    Ok(Json(offers))
}
