//! Current-principal resolution.
//!
//! Handlers extract a [`RequestContext`] from the incoming request and the
//! service asks a [`PrincipalResolver`] to turn it into a [`User`].

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use thiserror::Error;

use crate::{models::user::User, store::StoreError};

const BEARER_PREFIX: &str = "Bearer ";

/// Per-request credentials. Built for every request, authenticated or not.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub access_token: Option<String>,
}

impl RequestContext {
    #[cfg(test)]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
        }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let access_token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        Ok(Self { access_token })
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing access token")]
    MissingCredentials,
    #[error("access token does not belong to any user")]
    UnknownToken,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn current_user(&self, ctx: &RequestContext) -> Result<User, AuthError>;
}
