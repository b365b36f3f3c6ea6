use std::ops::Deref;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{domain::models::UserId, domain::User, routes::ApiError};

use super::AuthSession;

/// Extracts the authenticated [`User`] directly from the request. Returns
/// 401 Unauthorized if no user is logged in.
///
/// The `id` field is a [`UserId`] constructed at extraction time, shadowing
/// `User.id` through `Deref`.
///
/// Safe to log — `User`'s `Debug` impl redacts sensitive fields.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    user: User,
}

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthSession: FromRequestParts<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_session = AuthSession::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::unauthorized("Not authenticated"))?;

        let user = auth_session
            .user
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        Ok(AuthUser { id: user.id, user })
    }
}

/// The "current user or null" identity view: extraction never fails, an
/// anonymous request simply carries `None`. Listing endpoints use this to
/// answer anonymous callers with an empty collection instead of an error.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserId>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    AuthSession: FromRequestParts<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user_id = match AuthSession::from_request_parts(parts, state).await {
            Ok(session) => session.user.map(|user| user.id),
            Err(_) => None,
        };

        Ok(MaybeUser(user_id))
    }
}
