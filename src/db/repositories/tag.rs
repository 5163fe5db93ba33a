//! Tag repository
//!
//! Database operations for tags.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite and MySQL
//!
//! Tag names are not unique, so lookups by name return every match.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get the first tag carrying a slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// Every tag with the given name
    async fn list_by_name(&self, name: &str) -> Result<Vec<Tag>>;

    /// List all tags
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Persist a changed name or slug
    async fn update(&self, tag: &Tag) -> Result<Tag>;

    /// Delete a tag
    async fn delete(&self, id: i64) -> Result<()>;

    /// Associate tag with content
    async fn add_to_content(&self, tag_id: i64, content_id: i64) -> Result<()>;

    /// Remove tag from content
    async fn remove_from_content(&self, tag_id: i64, content_id: i64) -> Result<()>;

    /// Get tags for a content item
    async fn get_by_content_id(&self, content_id: i64) -> Result<Vec<Tag>>;
}

/// SQLx-based tag repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_tag_sqlite(self.pool.require_sqlite()?, tag).await,
            DatabaseDriver::Mysql => create_tag_mysql(self.pool.require_mysql()?, tag).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let sql = "SELECT id, name, slug FROM tags WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to get tag by ID")?;
                row.map(|row| row_to_tag_sqlite(&row)).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.require_mysql()?)
                    .await
                    .context("Failed to get tag by ID")?;
                row.map(|row| row_to_tag_mysql(&row)).transpose()
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        let sql = "SELECT id, name, slug FROM tags WHERE slug = ? ORDER BY id LIMIT 1";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(slug)
                    .fetch_optional(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to get tag by slug")?;
                row.map(|row| row_to_tag_sqlite(&row)).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(slug)
                    .fetch_optional(self.pool.require_mysql()?)
                    .await
                    .context("Failed to get tag by slug")?;
                row.map(|row| row_to_tag_mysql(&row)).transpose()
            }
        }
    }

    async fn list_by_name(&self, name: &str) -> Result<Vec<Tag>> {
        let sql = "SELECT id, name, slug FROM tags WHERE name = ? ORDER BY id";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql)
                    .bind(name)
                    .fetch_all(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to list tags by name")?;
                rows.iter().map(row_to_tag_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql)
                    .bind(name)
                    .fetch_all(self.pool.require_mysql()?)
                    .await
                    .context("Failed to list tags by name")?;
                rows.iter().map(row_to_tag_mysql).collect()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let sql = "SELECT id, name, slug FROM tags ORDER BY name, id";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql)
                    .fetch_all(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to list tags")?;
                rows.iter().map(row_to_tag_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql)
                    .fetch_all(self.pool.require_mysql()?)
                    .await
                    .context("Failed to list tags")?;
                rows.iter().map(row_to_tag_mysql).collect()
            }
        }
    }

    async fn update(&self, tag: &Tag) -> Result<Tag> {
        let sql = "UPDATE tags SET name = ?, slug = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&tag.name)
                    .bind(&tag.slug)
                    .bind(tag.id)
                    .execute(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to update tag")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&tag.name)
                    .bind(&tag.slug)
                    .bind(tag.id)
                    .execute(self.pool.require_mysql()?)
                    .await
                    .context("Failed to update tag")?;
            }
        }
        Ok(tag.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        // content_tags entries are deleted by ON DELETE CASCADE
        let sql = "DELETE FROM tags WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to delete tag")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.require_mysql()?)
                    .await
                    .context("Failed to delete tag")?;
            }
        }
        Ok(())
    }

    async fn add_to_content(&self, tag_id: i64, content_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                add_tag_to_content_sqlite(self.pool.require_sqlite()?, tag_id, content_id).await
            }
            DatabaseDriver::Mysql => {
                add_tag_to_content_mysql(self.pool.require_mysql()?, tag_id, content_id).await
            }
        }
    }

    async fn remove_from_content(&self, tag_id: i64, content_id: i64) -> Result<()> {
        let sql = "DELETE FROM content_tags WHERE content_id = ? AND tag_id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(content_id)
                    .bind(tag_id)
                    .execute(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to remove tag from content")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(content_id)
                    .bind(tag_id)
                    .execute(self.pool.require_mysql()?)
                    .await
                    .context("Failed to remove tag from content")?;
            }
        }
        Ok(())
    }

    async fn get_by_content_id(&self, content_id: i64) -> Result<Vec<Tag>> {
        let sql = r#"
            SELECT t.id, t.name, t.slug
            FROM tags t
            INNER JOIN content_tags ct ON t.id = ct.tag_id
            WHERE ct.content_id = ?
            ORDER BY t.name, t.id
        "#;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql)
                    .bind(content_id)
                    .fetch_all(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to get tags by content")?;
                rows.iter().map(row_to_tag_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql)
                    .bind(content_id)
                    .fetch_all(self.pool.require_mysql()?)
                    .await
                    .context("Failed to get tags by content")?;
                rows.iter().map(row_to_tag_mysql).collect()
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<Tag> {
    let result = sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
        .bind(&tag.name)
        .bind(&tag.slug)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        name: tag.name.clone(),
        slug: tag.slug.clone(),
    })
}

async fn add_tag_to_content_sqlite(pool: &SqlitePool, tag_id: i64, content_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO content_tags (content_id, tag_id) VALUES (?, ?)")
        .bind(content_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .context("Failed to add tag to content")?;

    Ok(())
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_tag_mysql(pool: &MySqlPool, tag: &Tag) -> Result<Tag> {
    let result = sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
        .bind(&tag.name)
        .bind(&tag.slug)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_id() as i64,
        name: tag.name.clone(),
        slug: tag.slug.clone(),
    })
}

async fn add_tag_to_content_mysql(pool: &MySqlPool, tag_id: i64, content_id: i64) -> Result<()> {
    sqlx::query("INSERT IGNORE INTO content_tags (content_id, tag_id) VALUES (?, ?)")
        .bind(content_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .context("Failed to add tag to content")?;

    Ok(())
}

fn row_to_tag_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}
