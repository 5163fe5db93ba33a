//! Section repository
//!
//! Database operations for sections. Section names are unique.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Section;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Section repository trait
#[async_trait]
pub trait SectionRepository: Send + Sync {
    /// Create a new section
    async fn create(&self, section: &Section) -> Result<Section>;

    /// Get section by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Section>>;

    /// Get section by its unique name
    async fn get_by_name(&self, name: &str) -> Result<Option<Section>>;

    /// List all sections ordered by name
    async fn list(&self) -> Result<Vec<Section>>;

    /// Persist a renamed section
    async fn update(&self, section: &Section) -> Result<Section>;

    /// Delete a section (its content is removed by cascade)
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based section repository implementation
pub struct SqlxSectionRepository {
    pool: DynDatabasePool,
}

impl SqlxSectionRepository {
    /// Create a new SQLx section repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SectionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SectionRepository for SqlxSectionRepository {
    async fn create(&self, section: &Section) -> Result<Section> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_section_sqlite(self.pool.require_sqlite()?, section).await
            }
            DatabaseDriver::Mysql => {
                create_section_mysql(self.pool.require_mysql()?, section).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Section>> {
        let sql = "SELECT id, name FROM sections WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to get section by ID")?;
                row.map(|row| row_to_section_sqlite(&row)).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.require_mysql()?)
                    .await
                    .context("Failed to get section by ID")?;
                row.map(|row| row_to_section_mysql(&row)).transpose()
            }
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Section>> {
        let sql = "SELECT id, name FROM sections WHERE name = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(name)
                    .fetch_optional(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to get section by name")?;
                row.map(|row| row_to_section_sqlite(&row)).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(name)
                    .fetch_optional(self.pool.require_mysql()?)
                    .await
                    .context("Failed to get section by name")?;
                row.map(|row| row_to_section_mysql(&row)).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Section>> {
        let sql = "SELECT id, name FROM sections ORDER BY name";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql)
                    .fetch_all(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to list sections")?;
                rows.iter().map(row_to_section_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql)
                    .fetch_all(self.pool.require_mysql()?)
                    .await
                    .context("Failed to list sections")?;
                rows.iter().map(row_to_section_mysql).collect()
            }
        }
    }

    async fn update(&self, section: &Section) -> Result<Section> {
        let sql = "UPDATE sections SET name = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&section.name)
                    .bind(section.id)
                    .execute(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to update section")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&section.name)
                    .bind(section.id)
                    .execute(self.pool.require_mysql()?)
                    .await
                    .context("Failed to update section")?;
            }
        }
        Ok(section.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM sections WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to delete section")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM sections WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.require_mysql()?)
                    .await
                    .context("Failed to delete section")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_section_sqlite(pool: &SqlitePool, section: &Section) -> Result<Section> {
    let result = sqlx::query("INSERT INTO sections (name) VALUES (?)")
        .bind(&section.name)
        .execute(pool)
        .await
        .context("Failed to create section")?;

    Ok(Section {
        id: result.last_insert_rowid(),
        name: section.name.clone(),
    })
}

fn row_to_section_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Section> {
    Ok(Section {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_section_mysql(pool: &MySqlPool, section: &Section) -> Result<Section> {
    let result = sqlx::query("INSERT INTO sections (name) VALUES (?)")
        .bind(&section.name)
        .execute(pool)
        .await
        .context("Failed to create section")?;

    Ok(Section {
        id: result.last_insert_id() as i64,
        name: section.name.clone(),
    })
}

fn row_to_section_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Section> {
    Ok(Section {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}
