use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::Time;
use tracing::instrument;

use crate::{
    auth::{AuthUser, MaybeUser},
    domain::models::{
        timefmt, ItineraryDayId, NewPlannedOffer, OfferId, PlannedOffer, PlannedOfferDetail,
        PlannedOfferId, PlannedOfferPatch,
    },
    domain::PlannerError,
    routes::{ApiError, ErrorCode},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_planned).post(attach_offer))
        .route("/:id", get(get_planned).patch(update_planned).delete(detach_offer))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlannedQuery {
    day_id: Option<ItineraryDayId>,
}

#[instrument(name = "GET /planned-offers", skip(user, app_state))]
async fn list_planned(
    MaybeUser(user): MaybeUser,
    State(app_state): State<AppState>,
    Query(query): Query<PlannedQuery>,
) -> Result<Json<Vec<PlannedOfferDetail>>, ApiError> {
    // No day selected (or nobody logged in) renders as an empty plan.
    let (Some(user_id), Some(day_id)) = (user, query.day_id) else {
        return Ok(Json(Vec::new()));
    };

    let planned = app_state.offer_planner.list_planned(user_id, day_id).await?;
    Ok(Json(planned))
}

#[instrument(name = "GET /planned-offers/:id", skip(user, app_state))]
async fn get_planned(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<PlannedOfferId>,
) -> Result<Json<PlannedOffer>, ApiError> {
    let planned = app_state.offer_planner.get(user.id, id).await?;
    Ok(Json(planned))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachOfferBody {
    day_id: ItineraryDayId,
    offer_id: OfferId,
    #[serde(default, with = "timefmt::option_time")]
    planned_time: Option<Time>,
    #[serde(default)]
    notes: Option<String>,
}

#[instrument(name = "POST /planned-offers", skip(user, app_state, body))]
async fn attach_offer(
    user: AuthUser,
    State(app_state): State<AppState>,
    Json(body): Json<AttachOfferBody>,
) -> Result<(StatusCode, Json<PlannedOffer>), ApiError> {
    let attached = app_state
        .offer_planner
        .attach(
            user.id,
            NewPlannedOffer {
                day_id: body.day_id,
                offer_id: body.offer_id,
                planned_time: body.planned_time,
                notes: body.notes,
            },
        )
        .await
        .map_err(|err| match err {
            PlannerError::Constraint(_) => ApiError::conflict(err.to_string())
                .with_code(ErrorCode::DuplicatePlannedOffer),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(attached)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePlannedBody {
    #[serde(default, with = "timefmt::option_time")]
    planned_time: Option<Time>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    visited: Option<bool>,
}

#[instrument(name = "PATCH /planned-offers/:id", skip(user, app_state, body))]
async fn update_planned(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<PlannedOfferId>,
    Json(body): Json<UpdatePlannedBody>,
) -> Result<Json<PlannedOffer>, ApiError> {
    let updated = app_state
        .offer_planner
        .update(
            user.id,
            id,
            PlannedOfferPatch {
                planned_time: body.planned_time,
                notes: body.notes,
                visited: body.visited,
            },
        )
        .await?;

    Ok(Json(updated))
}

#[instrument(name = "DELETE /planned-offers/:id", skip(user, app_state))]
async fn detach_offer(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<PlannedOfferId>,
) -> Result<StatusCode, ApiError> {
    app_state.offer_planner.detach(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
