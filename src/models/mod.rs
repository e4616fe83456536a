//! Persisted entities of the memo resource service.
//!
//! Rows map to database tables via `sqlx::FromRow`; the `Find*`, `Update*`
//! and `Delete*` structs are the typed filters the store accepts.

pub mod memo;
pub mod resource;
pub mod user;
