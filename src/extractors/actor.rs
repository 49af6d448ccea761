use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the acting user's id.
pub const ACTOR_ID_HEADER: &str = "X-User-Id";

/// Actor recorded in audit columns when the header is absent.
pub const SYSTEM_ACTOR: &str = "system";

/// Acting user id from `X-User-Id`, falling back to [`SYSTEM_ACTOR`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(SYSTEM_ACTOR);
        Ok(ActorId(value.to_string()))
    }
}
