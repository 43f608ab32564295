//! Database layer for the Rehearse platform.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. Every table the question board uses is
//! created through versioned migrations managed by this crate.
//!
//! Migrations are compiled into the binary via `include_str!`, so they ship
//! with the server and cannot drift from the code that queries them.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
