use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::Date;
use tracing::instrument;

use crate::{
    auth::{AuthUser, MaybeUser},
    domain::models::{timefmt, Itinerary, ItineraryId, ItineraryPatch, NewItinerary},
    routes::ApiError,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_itineraries).post(create_itinerary))
        .route(
            "/:id",
            get(get_itinerary)
                .patch(update_itinerary)
                .delete(delete_itinerary),
        )
}

#[instrument(name = "GET /itineraries", skip(user, app_state))]
async fn list_itineraries(
    MaybeUser(user): MaybeUser,
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Itinerary>>, ApiError> {
    // Anonymous callers see an empty collection, not an error.
    let Some(user_id) = user else {
        return Ok(Json(Vec::new()));
    };

    let itineraries = app_state.itineraries.list(user_id).await?;
    Ok(Json(itineraries))
}

#[instrument(name = "GET /itineraries/:id", skip(user, app_state))]
async fn get_itinerary(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<ItineraryId>,
) -> Result<Json<Itinerary>, ApiError> {
    let itinerary = app_state.itineraries.get(user.id, id).await?;
    Ok(Json(itinerary))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateItineraryBody {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(with = "timefmt::date")]
    start_date: Date,
    #[serde(with = "timefmt::date")]
    end_date: Date,
    #[serde(default)]
    is_active: bool,
}

#[instrument(name = "POST /itineraries", skip(user, app_state, body), fields(title = %body.title))]
async fn create_itinerary(
    user: AuthUser,
    State(app_state): State<AppState>,
    Json(body): Json<CreateItineraryBody>,
) -> Result<(StatusCode, Json<Itinerary>), ApiError> {
    let created = app_state
        .itineraries
        .create(
            user.id,
            NewItinerary {
                title: body.title,
                description: body.description,
                start_date: body.start_date,
                end_date: body.end_date,
                is_active: body.is_active,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateItineraryBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, with = "timefmt::option_date")]
    start_date: Option<Date>,
    #[serde(default, with = "timefmt::option_date")]
    end_date: Option<Date>,
    #[serde(default)]
    is_active: Option<bool>,
}

#[instrument(name = "PATCH /itineraries/:id", skip(user, app_state, body))]
async fn update_itinerary(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<ItineraryId>,
    Json(body): Json<UpdateItineraryBody>,
) -> Result<Json<Itinerary>, ApiError> {
    let updated = app_state
        .itineraries
        .update(
            user.id,
            id,
            ItineraryPatch {
                title: body.title,
                description: body.description,
                start_date: body.start_date,
                end_date: body.end_date,
                is_active: body.is_active,
            },
        )
        .await?;

    Ok(Json(updated))
}

#[instrument(name = "DELETE /itineraries/:id", skip(user, app_state))]
async fn delete_itinerary(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<ItineraryId>,
) -> Result<StatusCode, ApiError> {
    app_state.itineraries.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
