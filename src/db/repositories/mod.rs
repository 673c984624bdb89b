pub mod accreditation;
pub mod activity;
pub mod document;
pub mod indicator;
pub mod token;
pub mod user;
pub mod visitor;
