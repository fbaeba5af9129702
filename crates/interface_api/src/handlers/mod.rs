//! Request handlers

pub mod auth;
pub mod billing;
pub mod health;
pub mod reports;
