//! Table repositories. Each is a zero-sized struct whose associated functions
//! take an executor (pool, connection, or open transaction).

mod lot_repo;
mod session_repo;
mod user_repo;

pub use lot_repo::LotRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
