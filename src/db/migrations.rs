//! Database migrations module
//!
//! Code-based migrations for the magazine schema. Every migration carries
//! forward and backward SQL for both SQLite and MySQL, embedded in the binary.
//!
//! # Usage
//!
//! ```ignore
//! use magazine::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//!
//! // Undo everything after version 7
//! migrations::rollback_to(&pool, 7).await?;
//! ```
//!
//! Applied versions are recorded in the `_migrations` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A reversible database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// Forward SQL for SQLite
    pub up_sqlite: &'static str,
    /// Forward SQL for MySQL
    pub up_mysql: &'static str,
    /// Backward SQL for SQLite
    pub down_sqlite: &'static str,
    /// Backward SQL for MySQL
    pub down_mysql: &'static str,
}

impl Migration {
    fn up_sql(&self, driver: DatabaseDriver) -> &'static str {
        match driver {
            DatabaseDriver::Sqlite => self.up_sqlite,
            DatabaseDriver::Mysql => self.up_mysql,
        }
    }

    fn down_sql(&self, driver: DatabaseDriver) -> &'static str {
        match driver {
            DatabaseDriver::Sqlite => self.down_sqlite,
            DatabaseDriver::Mysql => self.down_mysql,
        }
    }
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations for the magazine schema, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_issues",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS issues (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL UNIQUE,
                pub_date DATE NOT NULL,
                cover_image TEXT
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS issues (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(255) NOT NULL UNIQUE,
                pub_date DATE NOT NULL,
                cover_image TEXT NULL
            );
        "#,
        down_sqlite: "DROP TABLE IF EXISTS issues;",
        down_mysql: "DROP TABLE IF EXISTS issues;",
    },
    Migration {
        version: 2,
        name: "create_sections",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL UNIQUE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sections (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(255) NOT NULL UNIQUE
            );
        "#,
        down_sqlite: "DROP TABLE IF EXISTS sections;",
        down_mysql: "DROP TABLE IF EXISTS sections;",
    },
    Migration {
        version: 3,
        name: "create_contributors",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS contributors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255)
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS contributors (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(255) NULL
            );
        "#,
        down_sqlite: "DROP TABLE IF EXISTS contributors;",
        down_mysql: "DROP TABLE IF EXISTS contributors;",
    },
    Migration {
        version: 4,
        name: "create_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL,
                slug VARCHAR(100) NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tags_slug ON tags(slug);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(255) NOT NULL,
                slug VARCHAR(100) NOT NULL
            );
            CREATE INDEX idx_tags_slug ON tags(slug);
        "#,
        down_sqlite: "DROP TABLE IF EXISTS tags;",
        down_mysql: "DROP TABLE IF EXISTS tags;",
    },
    Migration {
        version: 5,
        name: "create_content",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS content (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind VARCHAR(20) NOT NULL DEFAULT 'plain',
                title VARCHAR(255) NOT NULL,
                subtitle VARCHAR(255) NOT NULL,
                slug VARCHAR(100) NOT NULL,
                teaser TEXT NOT NULL,
                body TEXT NOT NULL,
                medium TEXT NOT NULL,
                size TEXT NOT NULL,
                statement TEXT NOT NULL,
                issue_id INTEGER NOT NULL,
                section_id INTEGER NOT NULL,
                FOREIGN KEY (issue_id) REFERENCES issues(id) ON DELETE CASCADE,
                FOREIGN KEY (section_id) REFERENCES sections(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_content_slug ON content(slug);
            CREATE INDEX IF NOT EXISTS idx_content_issue_section ON content(issue_id, section_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS content (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                kind VARCHAR(20) NOT NULL DEFAULT 'plain',
                title VARCHAR(255) NOT NULL,
                subtitle VARCHAR(255) NOT NULL,
                slug VARCHAR(100) NOT NULL,
                teaser TEXT NOT NULL,
                body LONGTEXT NOT NULL,
                medium LONGTEXT NOT NULL,
                size LONGTEXT NOT NULL,
                statement LONGTEXT NOT NULL,
                issue_id BIGINT NOT NULL,
                section_id BIGINT NOT NULL,
                FOREIGN KEY (issue_id) REFERENCES issues(id) ON DELETE CASCADE,
                FOREIGN KEY (section_id) REFERENCES sections(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_content_slug ON content(slug);
            CREATE INDEX idx_content_issue_section ON content(issue_id, section_id);
        "#,
        down_sqlite: "DROP TABLE IF EXISTS content;",
        down_mysql: "DROP TABLE IF EXISTS content;",
    },
    Migration {
        version: 6,
        name: "create_content_relations",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS content_contributors (
                content_id INTEGER NOT NULL,
                contributor_id INTEGER NOT NULL,
                PRIMARY KEY (content_id, contributor_id),
                FOREIGN KEY (content_id) REFERENCES content(id) ON DELETE CASCADE,
                FOREIGN KEY (contributor_id) REFERENCES contributors(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS content_tags (
                content_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (content_id, tag_id),
                FOREIGN KEY (content_id) REFERENCES content(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_content_tags_tag_id ON content_tags(tag_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS content_contributors (
                content_id BIGINT NOT NULL,
                contributor_id BIGINT NOT NULL,
                PRIMARY KEY (content_id, contributor_id),
                FOREIGN KEY (content_id) REFERENCES content(id) ON DELETE CASCADE,
                FOREIGN KEY (contributor_id) REFERENCES contributors(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS content_tags (
                content_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                PRIMARY KEY (content_id, tag_id),
                FOREIGN KEY (content_id) REFERENCES content(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_content_tags_tag_id ON content_tags(tag_id);
        "#,
        down_sqlite: r#"
            DROP TABLE IF EXISTS content_tags;
            DROP TABLE IF EXISTS content_contributors;
        "#,
        down_mysql: r#"
            DROP TABLE IF EXISTS content_tags;
            DROP TABLE IF EXISTS content_contributors;
        "#,
    },
    // Image and Article rows share the primary key of their content row.
    Migration {
        version: 7,
        name: "create_images_and_articles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS images (
                content_id INTEGER PRIMARY KEY,
                photo TEXT NOT NULL,
                FOREIGN KEY (content_id) REFERENCES content(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS articles (
                content_id INTEGER PRIMARY KEY,
                FOREIGN KEY (content_id) REFERENCES content(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS images (
                content_id BIGINT PRIMARY KEY,
                photo TEXT NOT NULL,
                FOREIGN KEY (content_id) REFERENCES content(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS articles (
                content_id BIGINT PRIMARY KEY,
                FOREIGN KEY (content_id) REFERENCES content(id) ON DELETE CASCADE
            );
        "#,
        down_sqlite: r#"
            DROP TABLE IF EXISTS articles;
            DROP TABLE IF EXISTS images;
        "#,
        down_mysql: r#"
            DROP TABLE IF EXISTS articles;
            DROP TABLE IF EXISTS images;
        "#,
    },
    Migration {
        version: 8,
        name: "add_content_is_featured_and_article_related_image",
        up_sqlite: r#"
            ALTER TABLE content ADD COLUMN is_featured BOOLEAN NOT NULL DEFAULT 0;
            ALTER TABLE articles ADD COLUMN related_image TEXT NULL DEFAULT NULL;
        "#,
        up_mysql: r#"
            ALTER TABLE content ADD COLUMN is_featured BOOLEAN NOT NULL DEFAULT FALSE;
            ALTER TABLE articles ADD COLUMN related_image TEXT NULL DEFAULT NULL;
        "#,
        down_sqlite: r#"
            ALTER TABLE content DROP COLUMN is_featured;
            ALTER TABLE articles DROP COLUMN related_image;
        "#,
        down_mysql: r#"
            ALTER TABLE content DROP COLUMN is_featured;
            ALTER TABLE articles DROP COLUMN related_image;
        "#,
    },
];

/// Run all pending migrations
///
/// Returns the number of migrations applied.
///
/// # Errors
///
/// Returns an error if any migration fails to apply
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Revert every applied migration newer than `target`, newest first.
///
/// `rollback_to(pool, 0)` empties the schema. Returns the number of
/// migrations reverted.
pub async fn rollback_to(pool: &DynDatabasePool, target: i32) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let mut count = 0;

    for record in applied.iter().rev() {
        let version = record.version as i32;
        if version <= target {
            break;
        }

        let migration = get_migration(version).ok_or_else(|| {
            anyhow::anyhow!(
                "Applied migration {} ({}) is unknown to this build",
                version,
                record.name
            )
        })?;

        tracing::info!("Reverting migration {}: {}", migration.version, migration.name);
        revert_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to revert migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Reverted {} migration(s)", count);
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations, oldest first
pub async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            get_applied_migrations_sqlite(pool.require_sqlite()?).await
        }
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.require_mysql()?).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows =
        sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
            .fetch_all(pool)
            .await?;

    rows.iter()
        .map(|row| {
            Ok(MigrationRecord {
                version: row.try_get("version")?,
                name: row.try_get("name")?,
                applied_at: row.try_get("applied_at")?,
            })
        })
        .collect()
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows =
        sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
            .fetch_all(pool)
            .await?;

    rows.iter()
        .map(|row| {
            let version: i32 = row.try_get("version")?;
            Ok(MigrationRecord {
                version: version as i64,
                name: row.try_get("name")?,
                applied_at: row.try_get("applied_at")?,
            })
        })
        .collect()
}

/// Apply a single migration and record it
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    execute_statements(pool, migration.up_sql(pool.driver())).await?;

    match pool.driver() {
        DatabaseDriver::Sqlite => {
            sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
                .bind(migration.version)
                .bind(migration.name)
                .execute(pool.require_sqlite()?)
                .await?;
        }
        DatabaseDriver::Mysql => {
            sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
                .bind(migration.version)
                .bind(migration.name)
                .execute(pool.require_mysql()?)
                .await?;
        }
    }

    Ok(())
}

/// Revert a single migration and drop its ledger entry
async fn revert_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    execute_statements(pool, migration.down_sql(pool.driver())).await?;

    match pool.driver() {
        DatabaseDriver::Sqlite => {
            sqlx::query("DELETE FROM _migrations WHERE version = ?")
                .bind(migration.version)
                .execute(pool.require_sqlite()?)
                .await?;
        }
        DatabaseDriver::Mysql => {
            sqlx::query("DELETE FROM _migrations WHERE version = ?")
                .bind(migration.version)
                .execute(pool.require_mysql()?)
                .await?;
        }
    }

    Ok(())
}

/// Execute a block of SQL statement by statement
async fn execute_statements(pool: &DynDatabasePool, sql: &str) -> Result<()> {
    for statement in split_sql_statements(sql) {
        pool.execute(statement)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }
    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, dropping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.iter().any(|a| a.version == m.version as i64))
        .count())
}

/// Highest applied migration version, 0 when none is applied
pub async fn current_version(pool: &DynDatabasePool) -> Result<i64> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    Ok(applied.iter().map(|record| record.version).max().unwrap_or(0))
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

/// Get migration by version
pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    async fn column_names(pool: &SqlitePool, table: &str) -> Vec<String> {
        sqlx::query(&format!("PRAGMA table_info({})", table))
            .fetch_all(pool)
            .await
            .expect("Failed to read table info")
            .iter()
            .map(|row| row.get::<String, _>("name"))
            .collect()
    }

    async fn seed_issue_and_section(pool: &SqlitePool) {
        sqlx::query("INSERT INTO issues (name, pub_date) VALUES ('Spring', '2020-03-01')")
            .execute(pool)
            .await
            .expect("Failed to create issue");
        sqlx::query("INSERT INTO sections (name) VALUES ('Poetry')")
            .execute(pool)
            .await
            .expect("Failed to create section");
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date_and_pending_count() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert!(!is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());

        run_migrations(&pool).await.expect("Failed to run migrations");

        assert!(is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_featured_migration_adds_columns() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        assert!(column_names(sqlite, "content").await.contains(&"is_featured".to_string()));
        assert!(column_names(sqlite, "articles").await.contains(&"related_image".to_string()));
    }

    #[tokio::test]
    async fn test_featured_column_defaults_to_false() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();
        seed_issue_and_section(sqlite).await;

        sqlx::query(
            "INSERT INTO content (title, subtitle, slug, teaser, body, medium, size, statement, issue_id, section_id)
             VALUES ('t', 's', 'slug', '', '', '', '', '', 1, 1)",
        )
        .execute(sqlite)
        .await
        .expect("Failed to insert content");
        sqlx::query("INSERT INTO articles (content_id) VALUES (1)")
            .execute(sqlite)
            .await
            .expect("Failed to insert article");

        let row = sqlx::query(
            "SELECT c.is_featured, a.related_image FROM content c JOIN articles a ON a.content_id = c.id",
        )
        .fetch_one(sqlite)
        .await
        .unwrap();

        assert!(!row.get::<bool, _>("is_featured"));
        assert!(row.get::<Option<String>, _>("related_image").is_none());
    }

    #[tokio::test]
    async fn test_rollback_featured_migration_drops_columns() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        let reverted = rollback_to(&pool, 7).await.expect("Failed to roll back");
        assert_eq!(reverted, 1);

        assert!(!column_names(sqlite, "content").await.contains(&"is_featured".to_string()));
        assert!(!column_names(sqlite, "articles").await.contains(&"related_image".to_string()));
        assert_eq!(pending_count(&pool).await.unwrap(), 1);

        // And forward again
        assert_eq!(run_migrations(&pool).await.unwrap(), 1);
        assert!(column_names(sqlite, "content").await.contains(&"is_featured".to_string()));
    }

    #[tokio::test]
    async fn test_rollback_to_zero_empties_schema() {
        let pool = migrated_pool().await;

        let reverted = rollback_to(&pool, 0).await.expect("Failed to roll back");
        assert_eq!(reverted, MIGRATIONS.len());

        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name IN ('issues', 'content', 'articles')",
        )
        .fetch_one(pool.as_sqlite().unwrap())
        .await
        .unwrap();
        assert_eq!(row.get::<i64, _>("count"), 0);
    }

    #[tokio::test]
    async fn test_rollback_above_current_version_changes_nothing() {
        let pool = migrated_pool().await;
        rollback_to(&pool, 5).await.expect("Failed to roll back");

        let reverted = rollback_to(&pool, 7).await.expect("Failed to roll back");

        assert_eq!(reverted, 0);
        assert_eq!(current_version(&pool).await.unwrap(), 5);
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len() - 5);
    }

    #[tokio::test]
    async fn test_rollback_with_nothing_applied() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        assert_eq!(rollback_to(&pool, 0).await.unwrap(), 0);
        assert_eq!(current_version(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unique_issue_and_section_names() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();
        seed_issue_and_section(sqlite).await;

        let dup_issue = sqlx::query("INSERT INTO issues (name, pub_date) VALUES ('Spring', '2021-03-01')")
            .execute(sqlite)
            .await;
        let dup_section = sqlx::query("INSERT INTO sections (name) VALUES ('Poetry')")
            .execute(sqlite)
            .await;

        assert!(dup_issue.is_err());
        assert!(dup_section.is_err());
    }

    #[tokio::test]
    async fn test_content_requires_issue_and_section() {
        let pool = migrated_pool().await;

        let result = sqlx::query(
            "INSERT INTO content (title, subtitle, slug, teaser, body, medium, size, statement, issue_id, section_id)
             VALUES ('t', 's', 'slug', '', '', '', '', '', 99, 99)",
        )
        .execute(pool.as_sqlite().unwrap())
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_tag_names_may_repeat() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();

        for slug in ["news", "news-2"] {
            sqlx::query("INSERT INTO tags (name, slug) VALUES ('News', ?)")
                .bind(slug)
                .execute(sqlite)
                .await
                .expect("Duplicate tag names are allowed");
        }
    }

    #[test]
    fn test_get_migration() {
        assert_eq!(get_migration(1).map(|m| m.name), Some("create_issues"));
        assert_eq!(
            get_migration(8).map(|m| m.name),
            Some("add_content_is_featured_and_article_related_image")
        );
        assert!(get_migration(999).is_none());
    }

    #[test]
    fn test_versions_are_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, i + 1);
        }
        assert_eq!(total_migrations(), 8);
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        assert_eq!(split_sql_statements(sql).len(), 2);

        let sql_with_comments = "-- Comment\nCREATE TABLE a (id INT);\n-- trailing";
        assert_eq!(split_sql_statements(sql_with_comments).len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(is_comment_only("-- Line 1\n-- Line 2"));
        assert!(!is_comment_only("CREATE TABLE test"));
        assert!(!is_comment_only("-- Comment\nCREATE TABLE test"));
    }
}
