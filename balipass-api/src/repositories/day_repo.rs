use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;

use crate::domain::models::{
    City, CityId, DayPatch, ItineraryDay, ItineraryDayId, ItineraryId, NewDay,
};

use super::repo_error::RepositoryError;

#[async_trait]
pub trait DayRepository {
    /// Days of one itinerary, day_date ascending, each with its destination
    /// city joined in.
    async fn list_for_itinerary(
        &self,
        itinerary_id: ItineraryId,
    ) -> Result<Vec<ItineraryDay>, RepositoryError>;
    async fn get(&self, id: ItineraryDayId) -> Result<ItineraryDay, RepositoryError>;
    async fn insert(&self, day: &NewDay) -> Result<ItineraryDay, RepositoryError>;
    async fn update(
        &self,
        id: ItineraryDayId,
        patch: &DayPatch,
    ) -> Result<ItineraryDay, RepositoryError>;
    /// One DELETE; the day's planned offers go with it through the cascade.
    async fn delete(&self, id: ItineraryDayId) -> Result<(), RepositoryError>;
}

/// Flat row shape of the day + city left join, folded into the nested
/// domain type before leaving the repository.
#[derive(sqlx::FromRow)]
struct DayRow {
    id: ItineraryDayId,
    itinerary_id: ItineraryId,
    day_date: Date,
    day_order: i32,
    notes: Option<String>,
    city_id: Option<CityId>,
    city_name: Option<String>,
    city_center_lat: Option<f64>,
    city_center_lng: Option<f64>,
}

impl From<DayRow> for ItineraryDay {
    fn from(row: DayRow) -> Self {
        let city = match (row.city_id, row.city_name) {
            (Some(id), Some(name)) => Some(City {
                id,
                name,
                center_lat: row.city_center_lat.unwrap_or_default(),
                center_lng: row.city_center_lng.unwrap_or_default(),
            }),
            _ => None,
        };

        Self {
            id: row.id,
            itinerary_id: row.itinerary_id,
            day_date: row.day_date,
            day_order: row.day_order,
            city,
            notes: row.notes,
        }
    }
}

const DAY_SELECT: &str = r#"
    SELECT d.id, d.itinerary_id, d.day_date, d.day_order, d.notes,
           c.id AS city_id, c.name AS city_name,
           c.center_lat AS city_center_lat, c.center_lng AS city_center_lng
    FROM itinerary_days d
    LEFT JOIN cities c ON c.id = d.city_id
"#;

pub struct DayRepositoryImpl {
    pool: PgPool,
}

impl DayRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DayRepository for DayRepositoryImpl {
    async fn list_for_itinerary(
        &self,
        itinerary_id: ItineraryId,
    ) -> Result<Vec<ItineraryDay>, RepositoryError> {
        let rows = sqlx::query_as::<_, DayRow>(&format!(
            "{DAY_SELECT} WHERE d.itinerary_id = $1 ORDER BY d.day_date ASC, d.day_order ASC"
        ))
        .bind(itinerary_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ItineraryDay::from).collect())
    }

    async fn get(&self, id: ItineraryDayId) -> Result<ItineraryDay, RepositoryError> {
        let row = sqlx::query_as::<_, DayRow>(&format!("{DAY_SELECT} WHERE d.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ItineraryDay::from)
            .ok_or_else(|| RepositoryError::NotFound(format!("day {id}")))
    }

    async fn insert(&self, day: &NewDay) -> Result<ItineraryDay, RepositoryError> {
        let id = sqlx::query_scalar::<_, ItineraryDayId>(
            r#"
            INSERT INTO itinerary_days (itinerary_id, day_date, day_order, city_id, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(day.itinerary_id)
        .bind(day.day_date)
        .bind(day.day_order)
        .bind(day.city_id)
        .bind(&day.notes)
        .fetch_one(&self.pool)
        .await?;

        self.get(id).await
    }

    async fn update(
        &self,
        id: ItineraryDayId,
        patch: &DayPatch,
    ) -> Result<ItineraryDay, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE itinerary_days
            SET day_date = COALESCE($2, day_date),
                day_order = COALESCE($3, day_order),
                city_id = COALESCE($4, city_id),
                notes = COALESCE($5, notes)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.day_date)
        .bind(patch.day_order)
        .bind(patch.city_id)
        .bind(&patch.notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("day {id}")));
        }

        self.get(id).await
    }

    async fn delete(&self, id: ItineraryDayId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM itinerary_days WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("day {id}")));
        }

        Ok(())
    }
}
