use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::accreditation::{AccreditationFilter, AccreditationUpsert};
pub use repositories::activity::ActorBrief;
pub use repositories::document::{DocumentUpdate, NewDocument, StoredFile};
pub use repositories::indicator::{IndicatorUpdate, NewIndicator};
pub use repositories::user::{NewUser, User, UserUpdate};

use crate::entities::{
    accreditation_stats, activity_logs, auth_tokens, documents, indicators, visitor_sessions,
    visitor_stats,
};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn visitor_repo(&self) -> repositories::visitor::VisitorRepository {
        repositories::visitor::VisitorRepository::new(self.conn.clone())
    }

    fn activity_repo(&self) -> repositories::activity::ActivityRepository {
        repositories::activity::ActivityRepository::new(self.conn.clone())
    }

    fn indicator_repo(&self) -> repositories::indicator::IndicatorRepository {
        repositories::indicator::IndicatorRepository::new(self.conn.clone())
    }

    fn accreditation_repo(&self) -> repositories::accreditation::AccreditationRepository {
        repositories::accreditation::AccreditationRepository::new(self.conn.clone())
    }

    fn document_repo(&self) -> repositories::document::DocumentRepository {
        repositories::document::DocumentRepository::new(self.conn.clone())
    }

    // Users

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email_with_hash(&self, email: &str) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_hash(email).await
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        self.user_repo().username_taken(username).await
    }

    pub async fn email_taken(&self, email: &str, exclude: Option<i32>) -> Result<bool> {
        self.user_repo().email_taken(email, exclude).await
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.user_repo().create(new_user).await
    }

    pub async fn update_user(&self, id: i32, update: UserUpdate) -> Result<Option<User>> {
        self.user_repo().update(id, update).await
    }

    pub async fn set_user_photo_url(&self, id: i32, photo_url: Option<String>) -> Result<()> {
        self.user_repo().set_photo_url(id, photo_url).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    // Auth tokens

    pub async fn issue_token(&self, user_id: i32, ttl_days: i64) -> Result<auth_tokens::Model> {
        self.token_repo().issue(user_id, ttl_days).await
    }

    pub async fn find_live_token(&self, token: &str) -> Result<Option<auth_tokens::Model>> {
        self.token_repo().find_live(token).await
    }

    pub async fn delete_token(&self, token: &str) -> Result<()> {
        self.token_repo().delete(token).await
    }

    // Visitor analytics

    pub async fn find_visitor_session(
        &self,
        session_id: &str,
    ) -> Result<Option<visitor_sessions::Model>> {
        self.visitor_repo().find_session(session_id).await
    }

    pub async fn create_visitor_session(
        &self,
        session_id: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
        last_seen: &str,
        last_counted_at: &str,
    ) -> Result<visitor_sessions::Model> {
        self.visitor_repo()
            .create_session(session_id, ip_address, user_agent, last_seen, last_counted_at)
            .await
    }

    pub async fn touch_visitor_session(
        &self,
        session: visitor_sessions::Model,
        ip_address: Option<String>,
        user_agent: Option<String>,
        last_seen: &str,
        last_counted_at: &str,
    ) -> Result<()> {
        self.visitor_repo()
            .touch_session(session, ip_address, user_agent, last_seen, last_counted_at)
            .await
    }

    pub async fn count_active_sessions(&self, threshold: &str) -> Result<u64> {
        self.visitor_repo().count_active(threshold).await
    }

    pub async fn find_visitor_stat(&self, date: &str) -> Result<Option<visitor_stats::Model>> {
        self.visitor_repo().find_stat(date).await
    }

    pub async fn bump_visitor_stat(
        &self,
        date: &str,
        add_views: i64,
        add_unique: i64,
    ) -> Result<visitor_stats::Model> {
        self.visitor_repo().bump_stat(date, add_views, add_unique).await
    }

    pub async fn recent_visitor_stats(&self, days: u64) -> Result<Vec<visitor_stats::Model>> {
        self.visitor_repo().recent_stats(days).await
    }

    // Activity log

    pub async fn add_activity(
        &self,
        event_type: &str,
        description: &str,
        user_id: Option<i32>,
        metadata: Option<String>,
    ) -> Result<()> {
        self.activity_repo()
            .add(event_type, description, user_id, metadata)
            .await
    }

    pub async fn recent_activity(
        &self,
        limit: u64,
    ) -> Result<Vec<(activity_logs::Model, Option<ActorBrief>)>> {
        self.activity_repo().recent(limit).await
    }

    // Indicators

    pub async fn list_indicators(
        &self,
        region: Option<String>,
        status: Option<String>,
    ) -> Result<Vec<indicators::Model>> {
        self.indicator_repo().list(region, status).await
    }

    pub async fn get_indicator(&self, id: i32) -> Result<Option<indicators::Model>> {
        self.indicator_repo().get(id).await
    }

    pub async fn create_indicator(&self, data: NewIndicator) -> Result<indicators::Model> {
        self.indicator_repo().create(data).await
    }

    pub async fn update_indicator(
        &self,
        id: i32,
        update: IndicatorUpdate,
    ) -> Result<Option<indicators::Model>> {
        self.indicator_repo().update(id, update).await
    }

    pub async fn delete_indicator(&self, id: i32) -> Result<bool> {
        self.indicator_repo().delete(id).await
    }

    pub async fn replace_indicators(&self, items: Vec<NewIndicator>) -> Result<()> {
        self.indicator_repo().replace(items).await
    }

    // Accreditation

    pub async fn latest_accreditation(
        &self,
        filter: AccreditationFilter,
    ) -> Result<Option<accreditation_stats::Model>> {
        self.accreditation_repo().latest(filter).await
    }

    pub async fn accreditation_history(
        &self,
        filter: AccreditationFilter,
        limit: u64,
    ) -> Result<Vec<accreditation_stats::Model>> {
        self.accreditation_repo().history(filter, limit).await
    }

    pub async fn upsert_accreditation(
        &self,
        data: AccreditationUpsert,
    ) -> Result<accreditation_stats::Model> {
        self.accreditation_repo().upsert(data).await
    }

    // Documents

    pub async fn list_documents(&self) -> Result<Vec<documents::Model>> {
        self.document_repo().list().await
    }

    pub async fn get_document(&self, id: i32) -> Result<Option<documents::Model>> {
        self.document_repo().get(id).await
    }

    pub async fn create_document(&self, data: NewDocument) -> Result<documents::Model> {
        self.document_repo().create(data).await
    }

    pub async fn update_document(
        &self,
        id: i32,
        update: DocumentUpdate,
    ) -> Result<Option<documents::Model>> {
        self.document_repo().update(id, update).await
    }

    pub async fn delete_document(&self, id: i32) -> Result<Option<documents::Model>> {
        self.document_repo().delete(id).await
    }
}
