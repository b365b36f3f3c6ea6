use async_trait::async_trait;
use sqlx::PgPool;
use time::{OffsetDateTime, Time};

use crate::domain::models::{
    CityId, ItineraryDayId, NewPlannedOffer, OfferId, OfferSummary, PartnerId, PlannedOffer,
    PlannedOfferDetail, PlannedOfferId, PlannedOfferPatch,
};

use super::repo_error::RepositoryError;

#[async_trait]
pub trait PlannedOfferRepository {
    /// Planned offers of one day, planned_time ascending with untimed
    /// entries after all timed ones, stable on added_at then id.
    async fn list_for_day(
        &self,
        day_id: ItineraryDayId,
    ) -> Result<Vec<PlannedOfferDetail>, RepositoryError>;
    /// Batched variant backing the composite day view read.
    async fn list_for_days(
        &self,
        day_ids: &[ItineraryDayId],
    ) -> Result<Vec<PlannedOfferDetail>, RepositoryError>;
    async fn get(&self, id: PlannedOfferId) -> Result<PlannedOffer, RepositoryError>;
    async fn exists(
        &self,
        day_id: ItineraryDayId,
        offer_id: OfferId,
    ) -> Result<bool, RepositoryError>;
    async fn insert(&self, planned: &NewPlannedOffer) -> Result<PlannedOffer, RepositoryError>;
    async fn update(
        &self,
        id: PlannedOfferId,
        patch: &PlannedOfferPatch,
    ) -> Result<PlannedOffer, RepositoryError>;
    async fn delete(&self, id: PlannedOfferId) -> Result<(), RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct PlannedDetailRow {
    id: PlannedOfferId,
    day_id: ItineraryDayId,
    offer_id: OfferId,
    planned_time: Option<Time>,
    notes: Option<String>,
    visited: bool,
    visited_at: Option<OffsetDateTime>,
    added_at: OffsetDateTime,
    partner_id: PartnerId,
    partner_name: String,
    city_id: CityId,
    offer_title: String,
    offer_description: Option<String>,
    discount_percent: Option<i32>,
}

impl From<PlannedDetailRow> for PlannedOfferDetail {
    fn from(row: PlannedDetailRow) -> Self {
        Self {
            planned: PlannedOffer {
                id: row.id,
                day_id: row.day_id,
                offer_id: row.offer_id,
                planned_time: row.planned_time,
                notes: row.notes,
                visited: row.visited,
                visited_at: row.visited_at,
                added_at: row.added_at,
            },
            offer: OfferSummary {
                id: row.offer_id,
                partner_id: row.partner_id,
                partner_name: row.partner_name,
                city_id: row.city_id,
                title: row.offer_title,
                description: row.offer_description,
                discount_percent: row.discount_percent,
            },
        }
    }
}

const PLANNED_DETAIL_SELECT: &str = r#"
    SELECT po.id, po.day_id, po.offer_id, po.planned_time, po.notes,
           po.visited, po.visited_at, po.added_at,
           p.id AS partner_id, p.name AS partner_name, p.city_id,
           o.title AS offer_title, o.description AS offer_description,
           o.discount_percent
    FROM planned_offers po
    JOIN offers o ON o.id = po.offer_id
    JOIN partners p ON p.id = o.partner_id
"#;

const PLANNED_ORDERING: &str =
    "ORDER BY po.planned_time ASC NULLS LAST, po.added_at ASC, po.id ASC";

pub struct PlannedOfferRepositoryImpl {
    pool: PgPool,
}

impl PlannedOfferRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlannedOfferRepository for PlannedOfferRepositoryImpl {
    async fn list_for_day(
        &self,
        day_id: ItineraryDayId,
    ) -> Result<Vec<PlannedOfferDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, PlannedDetailRow>(&format!(
            "{PLANNED_DETAIL_SELECT} WHERE po.day_id = $1 {PLANNED_ORDERING}"
        ))
        .bind(day_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PlannedOfferDetail::from).collect())
    }

    async fn list_for_days(
        &self,
        day_ids: &[ItineraryDayId],
    ) -> Result<Vec<PlannedOfferDetail>, RepositoryError> {
        let raw_ids: Vec<i32> = day_ids.iter().map(|id| id.as_i32()).collect();
        let rows = sqlx::query_as::<_, PlannedDetailRow>(&format!(
            "{PLANNED_DETAIL_SELECT} WHERE po.day_id = ANY($1) {PLANNED_ORDERING}"
        ))
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PlannedOfferDetail::from).collect())
    }

    async fn get(&self, id: PlannedOfferId) -> Result<PlannedOffer, RepositoryError> {
        let planned = sqlx::query_as::<_, PlannedOffer>(
            r#"
            SELECT id, day_id, offer_id, planned_time, notes, visited, visited_at, added_at
            FROM planned_offers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        planned.ok_or_else(|| RepositoryError::NotFound(format!("planned offer {id}")))
    }

    async fn exists(
        &self,
        day_id: ItineraryDayId,
        offer_id: OfferId,
    ) -> Result<bool, RepositoryError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM planned_offers WHERE day_id = $1 AND offer_id = $2)",
        )
        .bind(day_id)
        .bind(offer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    async fn insert(&self, planned: &NewPlannedOffer) -> Result<PlannedOffer, RepositoryError> {
        let inserted = sqlx::query_as::<_, PlannedOffer>(
            r#"
            INSERT INTO planned_offers (day_id, offer_id, planned_time, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, day_id, offer_id, planned_time, notes, visited, visited_at, added_at
            "#,
        )
        .bind(planned.day_id)
        .bind(planned.offer_id)
        .bind(planned.planned_time)
        .bind(&planned.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn update(
        &self,
        id: PlannedOfferId,
        patch: &PlannedOfferPatch,
    ) -> Result<PlannedOffer, RepositoryError> {
        let updated = sqlx::query_as::<_, PlannedOffer>(
            r#"
            UPDATE planned_offers
            SET planned_time = COALESCE($2, planned_time),
                notes = COALESCE($3, notes),
                visited = COALESCE($4, visited),
                visited_at = CASE
                    WHEN $4 IS NULL THEN visited_at
                    WHEN $4 THEN NOW()
                    ELSE NULL
                END
            WHERE id = $1
            RETURNING id, day_id, offer_id, planned_time, notes, visited, visited_at, added_at
            "#,
        )
        .bind(id)
        .bind(patch.planned_time)
        .bind(&patch.notes)
        .bind(patch.visited)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| RepositoryError::NotFound(format!("planned offer {id}")))
    }

    async fn delete(&self, id: PlannedOfferId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM planned_offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("planned offer {id}")));
        }

        Ok(())
    }
}
