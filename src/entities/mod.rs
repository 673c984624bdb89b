pub mod prelude;

pub mod accreditation_stats;
pub mod activity_logs;
pub mod auth_tokens;
pub mod documents;
pub mod indicators;
pub mod users;
pub mod visitor_sessions;
pub mod visitor_stats;
