//! Issue repository
//!
//! Database operations for issues.
//!
//! This module provides:
//! - `IssueRepository` trait defining the interface for issue data access
//! - `SqlxIssueRepository` implementing the trait for SQLite and MySQL
//!
//! Issue names are unique; a duplicate surfaces as the database's
//! constraint error, there is no pre-check here.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Issue;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Issue repository trait
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Create a new issue
    async fn create(&self, issue: &Issue) -> Result<Issue>;

    /// Get issue by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Issue>>;

    /// Get issue by its unique name
    async fn get_by_name(&self, name: &str) -> Result<Option<Issue>>;

    /// List all issues, newest publication first
    async fn list(&self) -> Result<Vec<Issue>>;

    /// Persist every field of an existing issue
    async fn update(&self, issue: &Issue) -> Result<Issue>;

    /// Delete an issue (its content is removed by cascade)
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based issue repository implementation
pub struct SqlxIssueRepository {
    pool: DynDatabasePool,
}

impl SqlxIssueRepository {
    /// Create a new SQLx issue repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn IssueRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl IssueRepository for SqlxIssueRepository {
    async fn create(&self, issue: &Issue) -> Result<Issue> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_issue_sqlite(self.pool.require_sqlite()?, issue).await,
            DatabaseDriver::Mysql => create_issue_mysql(self.pool.require_mysql()?, issue).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Issue>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_issue_by_id_sqlite(self.pool.require_sqlite()?, id).await,
            DatabaseDriver::Mysql => get_issue_by_id_mysql(self.pool.require_mysql()?, id).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Issue>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_issue_by_name_sqlite(self.pool.require_sqlite()?, name).await
            }
            DatabaseDriver::Mysql => {
                get_issue_by_name_mysql(self.pool.require_mysql()?, name).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Issue>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_issues_sqlite(self.pool.require_sqlite()?).await,
            DatabaseDriver::Mysql => list_issues_mysql(self.pool.require_mysql()?).await,
        }
    }

    async fn update(&self, issue: &Issue) -> Result<Issue> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_issue_sqlite(self.pool.require_sqlite()?, issue).await,
            DatabaseDriver::Mysql => update_issue_mysql(self.pool.require_mysql()?, issue).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_issue_sqlite(self.pool.require_sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_issue_mysql(self.pool.require_mysql()?, id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_issue_sqlite(pool: &SqlitePool, issue: &Issue) -> Result<Issue> {
    let result = sqlx::query("INSERT INTO issues (name, pub_date, cover_image) VALUES (?, ?, ?)")
        .bind(&issue.name)
        .bind(issue.pub_date)
        .bind(&issue.cover_image)
        .execute(pool)
        .await
        .context("Failed to create issue")?;

    Ok(Issue {
        id: result.last_insert_rowid(),
        ..issue.clone()
    })
}

async fn get_issue_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Issue>> {
    let row = sqlx::query("SELECT id, name, pub_date, cover_image FROM issues WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get issue by ID")?;

    row.map(|row| row_to_issue_sqlite(&row)).transpose()
}

async fn get_issue_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Issue>> {
    let row = sqlx::query("SELECT id, name, pub_date, cover_image FROM issues WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get issue by name")?;

    row.map(|row| row_to_issue_sqlite(&row)).transpose()
}

async fn list_issues_sqlite(pool: &SqlitePool) -> Result<Vec<Issue>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, pub_date, cover_image
        FROM issues
        ORDER BY pub_date DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list issues")?;

    rows.iter().map(row_to_issue_sqlite).collect()
}

async fn update_issue_sqlite(pool: &SqlitePool, issue: &Issue) -> Result<Issue> {
    sqlx::query("UPDATE issues SET name = ?, pub_date = ?, cover_image = ? WHERE id = ?")
        .bind(&issue.name)
        .bind(issue.pub_date)
        .bind(&issue.cover_image)
        .bind(issue.id)
        .execute(pool)
        .await
        .context("Failed to update issue")?;

    Ok(issue.clone())
}

async fn delete_issue_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM issues WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete issue")?;

    Ok(())
}

fn row_to_issue_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Issue> {
    Ok(Issue {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        pub_date: row.try_get("pub_date")?,
        cover_image: row.try_get("cover_image")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_issue_mysql(pool: &MySqlPool, issue: &Issue) -> Result<Issue> {
    let result = sqlx::query("INSERT INTO issues (name, pub_date, cover_image) VALUES (?, ?, ?)")
        .bind(&issue.name)
        .bind(issue.pub_date)
        .bind(&issue.cover_image)
        .execute(pool)
        .await
        .context("Failed to create issue")?;

    Ok(Issue {
        id: result.last_insert_id() as i64,
        ..issue.clone()
    })
}

async fn get_issue_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Issue>> {
    let row = sqlx::query("SELECT id, name, pub_date, cover_image FROM issues WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get issue by ID")?;

    row.map(|row| row_to_issue_mysql(&row)).transpose()
}

async fn get_issue_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Issue>> {
    let row = sqlx::query("SELECT id, name, pub_date, cover_image FROM issues WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get issue by name")?;

    row.map(|row| row_to_issue_mysql(&row)).transpose()
}

async fn list_issues_mysql(pool: &MySqlPool) -> Result<Vec<Issue>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, pub_date, cover_image
        FROM issues
        ORDER BY pub_date DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list issues")?;

    rows.iter().map(row_to_issue_mysql).collect()
}

async fn update_issue_mysql(pool: &MySqlPool, issue: &Issue) -> Result<Issue> {
    sqlx::query("UPDATE issues SET name = ?, pub_date = ?, cover_image = ? WHERE id = ?")
        .bind(&issue.name)
        .bind(issue.pub_date)
        .bind(&issue.cover_image)
        .bind(issue.id)
        .execute(pool)
        .await
        .context("Failed to update issue")?;

    Ok(issue.clone())
}

async fn delete_issue_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM issues WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete issue")?;

    Ok(())
}

fn row_to_issue_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Issue> {
    Ok(Issue {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        pub_date: row.try_get("pub_date")?,
        cover_image: row.try_get("cover_image")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::NaiveDate;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxIssueRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxIssueRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_issue(name: &str, y: i32, m: u32, d: u32) -> Issue {
        Issue::new(name.to_string(), NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[tokio::test]
    async fn test_create_issue() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&create_test_issue("Spring 2015", 2015, 3, 21))
            .await
            .expect("Failed to create issue");

        assert!(created.id > 0);
        assert_eq!(created.name, "Spring 2015");
        assert_eq!(created.cover_image, None);
    }

    #[tokio::test]
    async fn test_get_issue_by_id_and_name() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&create_test_issue("Winter", 2016, 12, 1))
            .await
            .unwrap();

        let by_id = repo.get_by_id(created.id).await.unwrap().expect("Issue not found");
        let by_name = repo.get_by_name("Winter").await.unwrap().expect("Issue not found");

        assert_eq!(by_id, created);
        assert_eq!(by_name.pub_date, NaiveDate::from_ymd_opt(2016, 12, 1).unwrap());
        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_issue_name_rejected() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_issue("Same", 2015, 1, 1)).await.unwrap();

        let err = repo
            .create(&create_test_issue("Same", 2016, 1, 1))
            .await
            .expect_err("Duplicate name should fail");

        assert!(crate::db::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_list_issues_newest_first() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_issue("Old", 2014, 5, 1)).await.unwrap();
        repo.create(&create_test_issue("New", 2018, 5, 1)).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|i| i.name).collect();

        assert_eq!(names, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_update_issue_cover() {
        let (_pool, repo) = setup_test_repo().await;
        let mut issue = repo
            .create(&create_test_issue("Covered", 2015, 6, 1))
            .await
            .unwrap();

        issue.cover_image = Some("issue_covers/2015/covered/1_a.jpg".to_string());
        repo.update(&issue).await.unwrap();

        let found = repo.get_by_id(issue.id).await.unwrap().unwrap();
        assert_eq!(found.cover_image.as_deref(), Some("issue_covers/2015/covered/1_a.jpg"));
    }

    #[tokio::test]
    async fn test_delete_issue() {
        let (_pool, repo) = setup_test_repo().await;
        let issue = repo
            .create(&create_test_issue("Gone", 2015, 6, 1))
            .await
            .unwrap();

        repo.delete(issue.id).await.unwrap();

        assert!(repo.get_by_id(issue.id).await.unwrap().is_none());
    }
}
