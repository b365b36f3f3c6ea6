use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::models::UserId;
use crate::domain::User;

use super::repo_error::RepositoryError;

#[async_trait]
pub trait UserRepository {
    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError>;
    async fn upsert_user(&self, user: &NewUser) -> Result<User, RepositoryError>;
}

pub struct UserRepositoryImpl {
    pool: PgPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name, picture, access_token
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))
    }

    async fn upsert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, full_name, picture, access_token)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                picture = EXCLUDED.picture,
                access_token = EXCLUDED.access_token
            RETURNING id, email, full_name, picture, access_token
            "#,
        )
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.picture)
        .bind(&user.access_token)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

pub struct NewUser {
    email: String,
    full_name: String,
    picture: String,
    access_token: String,
}

impl NewUser {
    pub fn new(email: String, full_name: String, picture: String, access_token: String) -> Self {
        Self {
            email,
            full_name,
            picture,
            access_token,
        }
    }
}
