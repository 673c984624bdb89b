use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::{auth_tokens, prelude::*};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Issue a fresh token for the user. All previously issued tokens for
    /// that user are deleted first: one active session per account.
    pub async fn issue(&self, user_id: i32, ttl_days: i64) -> Result<auth_tokens::Model> {
        AuthTokens::delete_many()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to revoke previous tokens")?;

        let now = Utc::now();
        let active = auth_tokens::ActiveModel {
            user_id: Set(user_id),
            token: Set(generate_token()),
            expires_at: Set((now + Duration::days(ttl_days)).to_rfc3339()),
            created_at: Set(now.to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert auth token")?;

        Ok(model)
    }

    /// Resolve a token that has not yet expired
    pub async fn find_live(&self, token: &str) -> Result<Option<auth_tokens::Model>> {
        let now = Utc::now().to_rfc3339();

        let row = AuthTokens::find()
            .filter(auth_tokens::Column::Token.eq(token))
            .filter(auth_tokens::Column::ExpiresAt.gt(now))
            .one(&self.conn)
            .await
            .context("Failed to query auth token")?;

        Ok(row)
    }

    /// Idempotent: deleting an absent token is a no-op
    pub async fn delete(&self, token: &str) -> Result<()> {
        AuthTokens::delete_many()
            .filter(auth_tokens::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete auth token")?;

        Ok(())
    }
}

/// Generate a random 60-character alphanumeric bearer token
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    rand::rng()
        .sample_iter(Alphanumeric)
        .take(60)
        .map(char::from)
        .collect()
}
