use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::models::{CityId, OfferSummary};

use super::repo_error::RepositoryError;

/// Read-only view over the partner-offer catalog. Nothing in this service
/// ever writes these tables.
#[async_trait]
pub trait CatalogRepository {
    /// Active offers whose partner sits in the given city, catalog order,
    /// capped at `limit` rows.
    async fn active_offers_in_city(
        &self,
        city_id: CityId,
        limit: i64,
    ) -> Result<Vec<OfferSummary>, RepositoryError>;
}

pub struct CatalogRepositoryImpl {
    pool: PgPool,
}

impl CatalogRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for CatalogRepositoryImpl {
    async fn active_offers_in_city(
        &self,
        city_id: CityId,
        limit: i64,
    ) -> Result<Vec<OfferSummary>, RepositoryError> {
        let offers = sqlx::query_as::<_, OfferSummary>(
            r#"
            SELECT o.id, o.partner_id, p.name AS partner_name, p.city_id,
                   o.title, o.description, o.discount_percent
            FROM offers o
            JOIN partners p ON p.id = o.partner_id
            WHERE p.city_id = $1 AND o.is_active
            ORDER BY o.id ASC
            LIMIT $2
            "#,
        )
        .bind(city_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(offers)
    }
}
