//! Pure domain logic for the parking backend.
//!
//! Nothing in this crate performs I/O. The database and HTTP crates build on
//! these types so the occupancy and billing rules live in exactly one place.

pub mod billing;
pub mod error;
pub mod occupancy;
pub mod roles;
pub mod search;
pub mod session_status;
pub mod types;
pub mod vehicle;
