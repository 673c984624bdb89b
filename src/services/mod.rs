pub mod activity;
pub use activity::ActivityLogger;

pub mod analytics;
pub use analytics::{DailyStat, TrackOutcome, VisitorAnalyticsService, VisitorSummary};

pub mod rate_limit;
pub use rate_limit::RateLimiter;

pub mod recaptcha;
pub use recaptcha::RecaptchaService;

pub mod storage;
pub use storage::DocumentStorage;
