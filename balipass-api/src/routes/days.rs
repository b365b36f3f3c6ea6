use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::Date;
use tracing::instrument;

use crate::{
    auth::{AuthUser, MaybeUser},
    domain::models::{
        timefmt, CityId, DayPatch, DayWithPlans, ItineraryDay, ItineraryDayId, ItineraryId, NewDay,
    },
    routes::ApiError,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_days).post(create_day))
        .route("/:id", get(get_day).patch(update_day).delete(delete_day))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DaysQuery {
    itinerary_id: Option<ItineraryId>,
}

#[instrument(name = "GET /days", skip(user, app_state))]
async fn list_days(
    MaybeUser(user): MaybeUser,
    State(app_state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Vec<DayWithPlans>>, ApiError> {
    // No itinerary selected (or nobody logged in) is a valid state that
    // renders as an empty day list.
    let (Some(user_id), Some(itinerary_id)) = (user, query.itinerary_id) else {
        return Ok(Json(Vec::new()));
    };

    let days = app_state.days.list(user_id, itinerary_id).await?;
    Ok(Json(days))
}

#[instrument(name = "GET /days/:id", skip(user, app_state))]
async fn get_day(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<ItineraryDayId>,
) -> Result<Json<ItineraryDay>, ApiError> {
    let day = app_state.days.get(user.id, id).await?;
    Ok(Json(day))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDayBody {
    itinerary_id: ItineraryId,
    #[serde(with = "timefmt::date")]
    day_date: Date,
    #[serde(default)]
    day_order: i32,
    #[serde(default)]
    city_id: Option<CityId>,
    #[serde(default)]
    notes: Option<String>,
}

#[instrument(name = "POST /days", skip(user, app_state, body))]
async fn create_day(
    user: AuthUser,
    State(app_state): State<AppState>,
    Json(body): Json<CreateDayBody>,
) -> Result<(StatusCode, Json<ItineraryDay>), ApiError> {
    let created = app_state
        .days
        .create(
            user.id,
            NewDay {
                itinerary_id: body.itinerary_id,
                day_date: body.day_date,
                day_order: body.day_order,
                city_id: body.city_id,
                notes: body.notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDayBody {
    #[serde(default, with = "timefmt::option_date")]
    day_date: Option<Date>,
    #[serde(default)]
    day_order: Option<i32>,
    #[serde(default)]
    city_id: Option<CityId>,
    #[serde(default)]
    notes: Option<String>,
}

#[instrument(name = "PATCH /days/:id", skip(user, app_state, body))]
async fn update_day(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<ItineraryDayId>,
    Json(body): Json<UpdateDayBody>,
) -> Result<Json<ItineraryDay>, ApiError> {
    let updated = app_state
        .days
        .update(
            user.id,
            id,
            DayPatch {
                day_date: body.day_date,
                day_order: body.day_order,
                city_id: body.city_id,
                notes: body.notes,
            },
        )
        .await?;

    Ok(Json(updated))
}

#[instrument(name = "DELETE /days/:id", skip(user, app_state))]
async fn delete_day(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<ItineraryDayId>,
) -> Result<StatusCode, ApiError> {
    app_state.days.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
