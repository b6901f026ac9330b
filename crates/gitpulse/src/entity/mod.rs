//! SeaORM entity definitions for the gitpulse database schema.

pub mod cache_entry;
pub mod commit;
pub mod prelude;
pub mod repository;
pub mod sync_log;
