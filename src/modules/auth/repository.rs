use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::database::Error;

type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Session {
    pub key_digest: String,
    pub user_id: String,
    pub csrf_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// OAuth2 access token. Issued by the provider; this service only reads them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct AccessToken {
    pub token_digest: String,
    pub user_id: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: Session) -> Result<Session>;

    /// Only sessions still valid at `now` are returned.
    async fn find_session(&self, key_digest: &str, now: DateTime<Utc>) -> Result<Option<Session>>;

    async fn delete_session(&self, key_digest: &str) -> Result<()>;

    /// Only tokens still valid at `now` are returned.
    async fn find_access_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccessToken>>;

    /// Removes sessions and access tokens expired at `now`, returning how many went.
    async fn purge_expired_credentials(&self, now: DateTime<Utc>) -> Result<u64>;
}
