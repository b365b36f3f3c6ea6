use serde::Serialize;

use super::{CityId, OfferId, PartnerId};

/// A destination city with its map center.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub center_lat: f64,
    pub center_lng: f64,
}

/// A catalog offer enriched with the partner it belongs to, as shown on
/// offer cards. Catalog rows are read-only from this service's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OfferSummary {
    pub id: OfferId,
    pub partner_id: PartnerId,
    pub partner_name: String,
    pub city_id: CityId,
    pub title: String,
    pub description: Option<String>,
    pub discount_percent: Option<i32>,
}
