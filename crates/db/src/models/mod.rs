//! Row models and DTOs, one module per table.

pub mod lot;
pub mod session;
pub mod user;
