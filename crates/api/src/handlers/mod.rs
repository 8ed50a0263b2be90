pub mod admin;
pub mod auth;
pub mod lots;
pub mod sessions;
