use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::models::{Itinerary, ItineraryId, ItineraryPatch, NewItinerary, UserId};

use super::repo_error::RepositoryError;

#[async_trait]
pub trait ItineraryRepository {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Itinerary>, RepositoryError>;
    async fn get(&self, id: ItineraryId) -> Result<Itinerary, RepositoryError>;
    async fn insert(
        &self,
        user_id: UserId,
        itinerary: &NewItinerary,
    ) -> Result<Itinerary, RepositoryError>;
    async fn update(
        &self,
        id: ItineraryId,
        patch: &ItineraryPatch,
    ) -> Result<Itinerary, RepositoryError>;
    /// One DELETE against the parent row; days and planned offers go with
    /// it through the schema's cascades.
    async fn delete(&self, id: ItineraryId) -> Result<(), RepositoryError>;
}

pub struct ItineraryRepositoryImpl {
    pool: PgPool,
}

impl ItineraryRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItineraryRepository for ItineraryRepositoryImpl {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Itinerary>, RepositoryError> {
        let itineraries = sqlx::query_as::<_, Itinerary>(
            r#"
            SELECT id, user_id, title, description, start_date, end_date, is_active, created_at, updated_at
            FROM itineraries
            WHERE user_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(itineraries)
    }

    async fn get(&self, id: ItineraryId) -> Result<Itinerary, RepositoryError> {
        let itinerary = sqlx::query_as::<_, Itinerary>(
            r#"
            SELECT id, user_id, title, description, start_date, end_date, is_active, created_at, updated_at
            FROM itineraries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        itinerary.ok_or_else(|| RepositoryError::NotFound(format!("itinerary {id}")))
    }

    async fn insert(
        &self,
        user_id: UserId,
        itinerary: &NewItinerary,
    ) -> Result<Itinerary, RepositoryError> {
        let inserted = sqlx::query_as::<_, Itinerary>(
            r#"
            INSERT INTO itineraries (user_id, title, description, start_date, end_date, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, description, start_date, end_date, is_active, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&itinerary.title)
        .bind(&itinerary.description)
        .bind(itinerary.start_date)
        .bind(itinerary.end_date)
        .bind(itinerary.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn update(
        &self,
        id: ItineraryId,
        patch: &ItineraryPatch,
    ) -> Result<Itinerary, RepositoryError> {
        let updated = sqlx::query_as::<_, Itinerary>(
            r#"
            UPDATE itineraries
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, title, description, start_date, end_date, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.start_date)
        .bind(patch.end_date)
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| RepositoryError::NotFound(format!("itinerary {id}")))
    }

    async fn delete(&self, id: ItineraryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM itineraries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("itinerary {id}")));
        }

        Ok(())
    }
}
