use std::sync::Arc;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ActivityLogger, DocumentStorage, RateLimiter, RecaptchaService, VisitorAnalyticsService,
};

/// Build a shared HTTP client for outbound verification calls.
fn build_shared_http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .user_agent(concat!("dinkes-portal/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub cache: Arc<TtlCache>,

    pub recaptcha: Arc<RecaptchaService>,

    pub limiter: RateLimiter,

    pub analytics: VisitorAnalyticsService,

    pub activity: ActivityLogger,

    pub storage: Arc<DocumentStorage>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client()?;

        let cache = Arc::new(TtlCache::new());
        let recaptcha = Arc::new(RecaptchaService::new(config.recaptcha.clone(), http_client));
        let limiter = RateLimiter::new(cache.clone(), &config.auth.throttle);
        let analytics = VisitorAnalyticsService::new(store.clone());
        let activity = ActivityLogger::new(store.clone());
        let storage = Arc::new(DocumentStorage::new(&config.storage));

        Ok(Self {
            config,
            store,
            cache,
            recaptcha,
            limiter,
            analytics,
            activity,
            storage,
        })
    }
}
