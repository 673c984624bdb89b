pub use super::accreditation_stats::Entity as AccreditationStats;
pub use super::activity_logs::Entity as ActivityLogs;
pub use super::auth_tokens::Entity as AuthTokens;
pub use super::documents::Entity as Documents;
pub use super::indicators::Entity as Indicators;
pub use super::users::Entity as Users;
pub use super::visitor_sessions::Entity as VisitorSessions;
pub use super::visitor_stats::Entity as VisitorStats;
