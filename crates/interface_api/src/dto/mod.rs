//! Request and response bodies

pub mod auth;
pub mod billing;
pub mod reports;
