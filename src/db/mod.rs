//! Database layer
//!
//! Storage for the magazine schema. Two backends are supported:
//! - SQLite (default)
//! - MySQL
//!
//! The driver is selected from configuration and hidden behind the
//! `DatabasePool` trait; repositories dispatch on `DatabasePool::driver`.
//!
//! # Usage
//!
//! ```ignore
//! use magazine::config::DatabaseConfig;
//! use magazine::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

/// Whether an error chain bottoms out in a database UNIQUE violation
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    database_error(err).map_or(false, |e| e.is_unique_violation())
}

/// Whether an error chain bottoms out in a database FOREIGN KEY violation
pub fn is_foreign_key_violation(err: &anyhow::Error) -> bool {
    database_error(err).map_or(false, |e| e.is_foreign_key_violation())
}

fn database_error(err: &anyhow::Error) -> Option<&dyn sqlx::error::DatabaseError> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<sqlx::Error>())
        .and_then(|e| match e {
            sqlx::Error::Database(db) => Some(db.as_ref()),
            _ => None,
        })
}
