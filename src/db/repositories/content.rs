//! Content repository
//!
//! Database operations for content and its image/article variants.
//!
//! This module provides:
//! - `ContentRepository` trait defining the interface for content data access
//! - `SqlxContentRepository` implementing the trait for SQLite and MySQL
//!
//! A content item is one `content` row whose `kind` column names the variant.
//! Images keep their photo in `images`, articles their related image in
//! `articles`; both side tables are keyed by the content id. Reads join both
//! side tables and rebuild a [`ContentDetail`] from the kind.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Content, ContentDetail, ContentKind, CreateContentInput};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Content repository trait
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Create content, its variant row and its contributor/tag links
    async fn create(&self, input: &CreateContentInput) -> Result<Content>;

    /// Get content by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Content>>;

    /// List the content of an issue, ordered by section then id
    async fn list_by_issue(&self, issue_id: i64) -> Result<Vec<Content>>;

    /// List the content of one (issue, section) group
    async fn list_by_issue_and_section(&self, issue_id: i64, section_id: i64)
        -> Result<Vec<Content>>;

    /// Persist every base field and the variant field of existing content
    ///
    /// Returns `None` when no content row has this id. Content whose detail
    /// is not the stored kind fails with [`ContentKindMismatch`].
    async fn update(&self, content: &Content) -> Result<Option<Content>>;

    /// Delete content; the variant row and links go by cascade
    async fn delete(&self, id: i64) -> Result<()>;

    /// Every featured item of an (issue, section) group
    async fn list_featured(&self, issue_id: i64, section_id: i64) -> Result<Vec<Content>>;

    /// The featured item of a group; the newest one if several are flagged
    async fn featured_for(&self, issue_id: i64, section_id: i64) -> Result<Option<Content>>;

    /// Set only the featured flag of one row
    async fn set_featured(&self, id: i64, is_featured: bool) -> Result<()>;
}

/// The detail of saved content is not the variant stored for its id
#[derive(Debug, thiserror::Error)]
#[error("Content {id} is stored as {stored} content, not {given}")]
pub struct ContentKindMismatch {
    pub id: i64,
    pub stored: ContentKind,
    pub given: ContentKind,
}

/// SQLx-based content repository implementation
pub struct SqlxContentRepository {
    pool: DynDatabasePool,
}

impl SqlxContentRepository {
    /// Create a new SQLx content repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContentRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_CONTENT: &str = r#"
    SELECT c.id, c.kind, c.title, c.subtitle, c.slug, c.teaser, c.body, c.is_featured,
           c.medium, c.size, c.statement, c.issue_id, c.section_id,
           i.photo, a.related_image
    FROM content c
    LEFT JOIN images i ON i.content_id = c.id
    LEFT JOIN articles a ON a.content_id = c.id
"#;

#[async_trait]
impl ContentRepository for SqlxContentRepository {
    async fn create(&self, input: &CreateContentInput) -> Result<Content> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_content_sqlite(self.pool.require_sqlite()?, input).await
            }
            DatabaseDriver::Mysql => create_content_mysql(self.pool.require_mysql()?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Content>> {
        let sql = format!("{} WHERE c.id = ?", SELECT_CONTENT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to get content by ID")?;
                row.map(|row| row_to_content_sqlite(&row)).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.require_mysql()?)
                    .await
                    .context("Failed to get content by ID")?;
                row.map(|row| row_to_content_mysql(&row)).transpose()
            }
        }
    }

    async fn list_by_issue(&self, issue_id: i64) -> Result<Vec<Content>> {
        let sql = format!(
            "{} WHERE c.issue_id = ? ORDER BY c.section_id, c.id",
            SELECT_CONTENT
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(issue_id)
                    .fetch_all(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to list content by issue")?;
                rows.iter().map(row_to_content_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(issue_id)
                    .fetch_all(self.pool.require_mysql()?)
                    .await
                    .context("Failed to list content by issue")?;
                rows.iter().map(row_to_content_mysql).collect()
            }
        }
    }

    async fn list_by_issue_and_section(
        &self,
        issue_id: i64,
        section_id: i64,
    ) -> Result<Vec<Content>> {
        let sql = format!(
            "{} WHERE c.issue_id = ? AND c.section_id = ? ORDER BY c.id",
            SELECT_CONTENT
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(issue_id)
                    .bind(section_id)
                    .fetch_all(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to list content by issue and section")?;
                rows.iter().map(row_to_content_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(issue_id)
                    .bind(section_id)
                    .fetch_all(self.pool.require_mysql()?)
                    .await
                    .context("Failed to list content by issue and section")?;
                rows.iter().map(row_to_content_mysql).collect()
            }
        }
    }

    async fn update(&self, content: &Content) -> Result<Option<Content>> {
        let updated = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_content_sqlite(self.pool.require_sqlite()?, content).await?
            }
            DatabaseDriver::Mysql => {
                update_content_mysql(self.pool.require_mysql()?, content).await?
            }
        };
        Ok(updated.then(|| content.clone()))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM content WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to delete content")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.require_mysql()?)
                    .await
                    .context("Failed to delete content")?;
            }
        }
        Ok(())
    }

    async fn list_featured(&self, issue_id: i64, section_id: i64) -> Result<Vec<Content>> {
        let sql = format!(
            "{} WHERE c.issue_id = ? AND c.section_id = ? AND c.is_featured = ? ORDER BY c.id",
            SELECT_CONTENT
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(issue_id)
                    .bind(section_id)
                    .bind(true)
                    .fetch_all(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to list featured content")?;
                rows.iter().map(row_to_content_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(issue_id)
                    .bind(section_id)
                    .bind(true)
                    .fetch_all(self.pool.require_mysql()?)
                    .await
                    .context("Failed to list featured content")?;
                rows.iter().map(row_to_content_mysql).collect()
            }
        }
    }

    async fn featured_for(&self, issue_id: i64, section_id: i64) -> Result<Option<Content>> {
        let featured = self.list_featured(issue_id, section_id).await?;
        Ok(featured.into_iter().last())
    }

    async fn set_featured(&self, id: i64, is_featured: bool) -> Result<()> {
        let sql = "UPDATE content SET is_featured = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(is_featured)
                    .bind(id)
                    .execute(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to set featured flag")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(is_featured)
                    .bind(id)
                    .execute(self.pool.require_mysql()?)
                    .await
                    .context("Failed to set featured flag")?;
            }
        }
        Ok(())
    }
}

const INSERT_CONTENT: &str = r#"
    INSERT INTO content (kind, title, subtitle, slug, teaser, body, is_featured,
                         medium, size, statement, issue_id, section_id)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const STORED_VARIANT: &str = r#"
    SELECT c.kind, i.content_id AS image_row, a.content_id AS article_row
    FROM content c
    LEFT JOIN images i ON i.content_id = c.id
    LEFT JOIN articles a ON a.content_id = c.id
    WHERE c.id = ?
"#;

const UPDATE_CONTENT: &str = r#"
    UPDATE content
    SET title = ?, subtitle = ?, slug = ?, teaser = ?, body = ?, is_featured = ?,
        medium = ?, size = ?, statement = ?, issue_id = ?, section_id = ?
    WHERE id = ?
"#;

/// Build the stored content from the input and the id the database assigned
fn content_from_input(id: i64, input: &CreateContentInput) -> Content {
    Content {
        id,
        title: input.title.clone(),
        subtitle: input.subtitle.clone(),
        slug: input.slug.clone(),
        teaser: input.teaser.clone(),
        body: input.body.clone(),
        is_featured: input.is_featured,
        medium: input.medium.clone(),
        size: input.size.clone(),
        statement: input.statement.clone(),
        issue_id: input.issue_id,
        section_id: input.section_id,
        detail: input.detail.clone(),
    }
}

/// Rebuild the variant detail from the kind column and the joined side columns
fn detail_from_columns(
    id: i64,
    kind: &str,
    photo: Option<String>,
    related_image: Option<String>,
) -> Result<ContentDetail> {
    let kind = ContentKind::parse(kind)
        .ok_or_else(|| anyhow!("Content {} has unknown kind '{}'", id, kind))?;

    match kind {
        ContentKind::Plain => Ok(ContentDetail::Plain),
        ContentKind::Image => {
            let photo = photo.ok_or_else(|| anyhow!("Image content {} has no images row", id))?;
            Ok(ContentDetail::Image { photo })
        }
        ContentKind::Article => Ok(ContentDetail::Article { related_image }),
    }
}

/// Check that the stored row of `content` holds the variant being saved
fn check_stored_variant(
    content: &Content,
    stored: &str,
    image_row: Option<i64>,
    article_row: Option<i64>,
) -> Result<()> {
    let stored = ContentKind::parse(stored)
        .ok_or_else(|| anyhow!("Content {} has unknown kind '{}'", content.id, stored))?;
    let given = content.kind();
    if stored != given {
        return Err(ContentKindMismatch {
            id: content.id,
            stored,
            given,
        }
        .into());
    }

    let variant_row = match given {
        ContentKind::Plain => return Ok(()),
        ContentKind::Image => image_row,
        ContentKind::Article => article_row,
    };
    if variant_row.is_none() {
        bail!("{} content {} has no {} row", given, content.id, given);
    }
    Ok(())
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_content_sqlite(pool: &SqlitePool, input: &CreateContentInput) -> Result<Content> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(INSERT_CONTENT)
        .bind(input.detail.kind().as_str())
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.slug)
        .bind(&input.teaser)
        .bind(&input.body)
        .bind(input.is_featured)
        .bind(&input.medium)
        .bind(&input.size)
        .bind(&input.statement)
        .bind(input.issue_id)
        .bind(input.section_id)
        .execute(&mut *tx)
        .await
        .context("Failed to create content")?;
    let id = result.last_insert_rowid();

    match &input.detail {
        ContentDetail::Plain => {}
        ContentDetail::Image { photo } => {
            sqlx::query("INSERT INTO images (content_id, photo) VALUES (?, ?)")
                .bind(id)
                .bind(photo)
                .execute(&mut *tx)
                .await
                .context("Failed to create image row")?;
        }
        ContentDetail::Article { related_image } => {
            sqlx::query("INSERT INTO articles (content_id, related_image) VALUES (?, ?)")
                .bind(id)
                .bind(related_image)
                .execute(&mut *tx)
                .await
                .context("Failed to create article row")?;
        }
    }

    for contributor_id in &input.contributor_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO content_contributors (content_id, contributor_id) VALUES (?, ?)",
        )
        .bind(id)
        .bind(contributor_id)
        .execute(&mut *tx)
        .await
        .context("Failed to link contributor")?;
    }

    for tag_id in &input.tag_ids {
        sqlx::query("INSERT OR IGNORE INTO content_tags (content_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to link tag")?;
    }

    tx.commit().await.context("Failed to commit content")?;

    Ok(content_from_input(id, input))
}

async fn update_content_sqlite(pool: &SqlitePool, content: &Content) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let stored = sqlx::query(STORED_VARIANT)
        .bind(content.id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read stored content kind")?;
    let Some(stored) = stored else {
        return Ok(false);
    };
    check_stored_variant(
        content,
        &stored.try_get::<String, _>("kind")?,
        stored.try_get("image_row")?,
        stored.try_get("article_row")?,
    )?;

    sqlx::query(UPDATE_CONTENT)
        .bind(&content.title)
        .bind(&content.subtitle)
        .bind(&content.slug)
        .bind(&content.teaser)
        .bind(&content.body)
        .bind(content.is_featured)
        .bind(&content.medium)
        .bind(&content.size)
        .bind(&content.statement)
        .bind(content.issue_id)
        .bind(content.section_id)
        .bind(content.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update content")?;

    match &content.detail {
        ContentDetail::Plain => {}
        ContentDetail::Image { photo } => {
            sqlx::query("UPDATE images SET photo = ? WHERE content_id = ?")
                .bind(photo)
                .bind(content.id)
                .execute(&mut *tx)
                .await
                .context("Failed to update image row")?;
        }
        ContentDetail::Article { related_image } => {
            sqlx::query("UPDATE articles SET related_image = ? WHERE content_id = ?")
                .bind(related_image)
                .bind(content.id)
                .execute(&mut *tx)
                .await
                .context("Failed to update article row")?;
        }
    }

    tx.commit().await.context("Failed to commit content update")?;
    Ok(true)
}

fn row_to_content_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Content> {
    let id: i64 = row.try_get("id")?;
    let kind: String = row.try_get("kind")?;
    let detail = detail_from_columns(
        id,
        &kind,
        row.try_get("photo")?,
        row.try_get("related_image")?,
    )?;

    Ok(Content {
        id,
        title: row.try_get("title")?,
        subtitle: row.try_get("subtitle")?,
        slug: row.try_get("slug")?,
        teaser: row.try_get("teaser")?,
        body: row.try_get("body")?,
        is_featured: row.try_get("is_featured")?,
        medium: row.try_get("medium")?,
        size: row.try_get("size")?,
        statement: row.try_get("statement")?,
        issue_id: row.try_get("issue_id")?,
        section_id: row.try_get("section_id")?,
        detail,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_content_mysql(pool: &MySqlPool, input: &CreateContentInput) -> Result<Content> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(INSERT_CONTENT)
        .bind(input.detail.kind().as_str())
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.slug)
        .bind(&input.teaser)
        .bind(&input.body)
        .bind(input.is_featured)
        .bind(&input.medium)
        .bind(&input.size)
        .bind(&input.statement)
        .bind(input.issue_id)
        .bind(input.section_id)
        .execute(&mut *tx)
        .await
        .context("Failed to create content")?;
    let id = result.last_insert_id() as i64;

    match &input.detail {
        ContentDetail::Plain => {}
        ContentDetail::Image { photo } => {
            sqlx::query("INSERT INTO images (content_id, photo) VALUES (?, ?)")
                .bind(id)
                .bind(photo)
                .execute(&mut *tx)
                .await
                .context("Failed to create image row")?;
        }
        ContentDetail::Article { related_image } => {
            sqlx::query("INSERT INTO articles (content_id, related_image) VALUES (?, ?)")
                .bind(id)
                .bind(related_image)
                .execute(&mut *tx)
                .await
                .context("Failed to create article row")?;
        }
    }

    for contributor_id in &input.contributor_ids {
        sqlx::query(
            "INSERT IGNORE INTO content_contributors (content_id, contributor_id) VALUES (?, ?)",
        )
        .bind(id)
        .bind(contributor_id)
        .execute(&mut *tx)
        .await
        .context("Failed to link contributor")?;
    }

    for tag_id in &input.tag_ids {
        sqlx::query("INSERT IGNORE INTO content_tags (content_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to link tag")?;
    }

    tx.commit().await.context("Failed to commit content")?;

    Ok(content_from_input(id, input))
}

async fn update_content_mysql(pool: &MySqlPool, content: &Content) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let stored = sqlx::query(STORED_VARIANT)
        .bind(content.id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read stored content kind")?;
    let Some(stored) = stored else {
        return Ok(false);
    };
    check_stored_variant(
        content,
        &stored.try_get::<String, _>("kind")?,
        stored.try_get("image_row")?,
        stored.try_get("article_row")?,
    )?;

    sqlx::query(UPDATE_CONTENT)
        .bind(&content.title)
        .bind(&content.subtitle)
        .bind(&content.slug)
        .bind(&content.teaser)
        .bind(&content.body)
        .bind(content.is_featured)
        .bind(&content.medium)
        .bind(&content.size)
        .bind(&content.statement)
        .bind(content.issue_id)
        .bind(content.section_id)
        .bind(content.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update content")?;

    match &content.detail {
        ContentDetail::Plain => {}
        ContentDetail::Image { photo } => {
            sqlx::query("UPDATE images SET photo = ? WHERE content_id = ?")
                .bind(photo)
                .bind(content.id)
                .execute(&mut *tx)
                .await
                .context("Failed to update image row")?;
        }
        ContentDetail::Article { related_image } => {
            sqlx::query("UPDATE articles SET related_image = ? WHERE content_id = ?")
                .bind(related_image)
                .bind(content.id)
                .execute(&mut *tx)
                .await
                .context("Failed to update article row")?;
        }
    }

    tx.commit().await.context("Failed to commit content update")?;
    Ok(true)
}

fn row_to_content_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Content> {
    let id: i64 = row.try_get("id")?;
    let kind: String = row.try_get("kind")?;
    let detail = detail_from_columns(
        id,
        &kind,
        row.try_get("photo")?,
        row.try_get("related_image")?,
    )?;

    Ok(Content {
        id,
        title: row.try_get("title")?,
        subtitle: row.try_get("subtitle")?,
        slug: row.try_get("slug")?,
        teaser: row.try_get("teaser")?,
        body: row.try_get("body")?,
        is_featured: row.try_get("is_featured")?,
        medium: row.try_get("medium")?,
        size: row.try_get("size")?,
        statement: row.try_get("statement")?,
        issue_id: row.try_get("issue_id")?,
        section_id: row.try_get("section_id")?,
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    struct Fixture {
        pool: DynDatabasePool,
        repo: SqlxContentRepository,
        issue_id: i64,
        section_id: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let issue_id = insert_issue(&pool, "Spring").await;
        let section_id = insert_section(&pool, "Poetry").await;
        let repo = SqlxContentRepository::new(pool.clone());
        Fixture {
            pool,
            repo,
            issue_id,
            section_id,
        }
    }

    async fn insert_issue(pool: &DynDatabasePool, name: &str) -> i64 {
        sqlx::query("INSERT INTO issues (name, pub_date) VALUES (?, '2015-03-01')")
            .bind(name)
            .execute(pool.require_sqlite().unwrap())
            .await
            .expect("Failed to create issue")
            .last_insert_rowid()
    }

    async fn insert_section(pool: &DynDatabasePool, name: &str) -> i64 {
        sqlx::query("INSERT INTO sections (name) VALUES (?)")
            .bind(name)
            .execute(pool.require_sqlite().unwrap())
            .await
            .expect("Failed to create section")
            .last_insert_rowid()
    }

    fn plain(f: &Fixture, title: &str) -> CreateContentInput {
        CreateContentInput::new(title.to_string(), title.to_lowercase(), f.issue_id, f.section_id)
    }

    #[tokio::test]
    async fn test_create_plain_content() {
        let f = setup().await;

        let created = f.repo.create(&plain(&f, "Hello")).await.expect("Failed to create content");
        let found = f.repo.get_by_id(created.id).await.unwrap().expect("Content not found");

        assert!(created.id > 0);
        assert_eq!(found, created);
        assert_eq!(found.kind(), ContentKind::Plain);
        assert!(!found.is_featured);
    }

    #[tokio::test]
    async fn test_image_shares_content_identity() {
        let f = setup().await;

        let image = f
            .repo
            .create(&plain(&f, "Dunes").image("images/spring/5_dunes.jpg".to_string()))
            .await
            .unwrap();

        let found = f.repo.get_by_id(image.id).await.unwrap().unwrap();
        assert_eq!(found.photo(), Some("images/spring/5_dunes.jpg"));

        let photo: String = sqlx::query_scalar("SELECT photo FROM images WHERE content_id = ?")
            .bind(image.id)
            .fetch_one(f.pool.require_sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(photo, "images/spring/5_dunes.jpg");
    }

    #[tokio::test]
    async fn test_article_related_image_absent_by_default() {
        let f = setup().await;

        let article = f.repo.create(&plain(&f, "Essay").article()).await.unwrap();
        let found = f.repo.get_by_id(article.id).await.unwrap().unwrap();

        assert_eq!(found.kind(), ContentKind::Article);
        assert_eq!(found.detail, ContentDetail::Article { related_image: None });
    }

    #[tokio::test]
    async fn test_update_article_related_image() {
        let f = setup().await;
        let mut article = f.repo.create(&plain(&f, "Essay").article()).await.unwrap();

        article.detail = ContentDetail::Article {
            related_image: Some("article_images/spring/9_x.png".to_string()),
        };
        article.title = "Essay, revised".to_string();
        let updated = f.repo.update(&article).await.unwrap();
        assert_eq!(updated.as_ref(), Some(&article));

        let found = f.repo.get_by_id(article.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Essay, revised");
        assert_eq!(found.related_image(), Some("article_images/spring/9_x.png"));
    }

    #[tokio::test]
    async fn test_update_deleted_content_returns_none() {
        let f = setup().await;
        let mut content = f.repo.create(&plain(&f, "Ghost").featured(true)).await.unwrap();
        f.repo.delete(content.id).await.unwrap();

        content.title = "Still here?".to_string();
        let updated = f.repo.update(&content).await.unwrap();

        assert_eq!(updated, None);
        assert!(f.repo.get_by_id(content.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_with_other_variant_is_rejected() {
        let f = setup().await;
        let stored = f
            .repo
            .create(
                &plain(&f, "Essay").article_with_image("article_images/spring/2_b.png".to_string()),
            )
            .await
            .unwrap();

        let mut as_image = stored.clone();
        as_image.title = "Essay as photo".to_string();
        as_image.detail = ContentDetail::Image {
            photo: "images/spring/2_b.png".to_string(),
        };
        let err = f.repo.update(&as_image).await.expect_err("kind is fixed");

        let mismatch = err
            .downcast_ref::<ContentKindMismatch>()
            .expect("Expected a kind mismatch");
        assert_eq!(mismatch.stored, ContentKind::Article);
        assert_eq!(mismatch.given, ContentKind::Image);
        let found = f.repo.get_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(found, stored);
    }

    #[tokio::test]
    async fn test_create_links_contributors_and_tags() {
        let f = setup().await;
        let sqlite = f.pool.require_sqlite().unwrap();
        let contributor = sqlx::query("INSERT INTO contributors (name) VALUES ('Ada')")
            .execute(sqlite)
            .await
            .unwrap()
            .last_insert_rowid();
        let tag = sqlx::query("INSERT INTO tags (name, slug) VALUES ('Sea', 'sea')")
            .execute(sqlite)
            .await
            .unwrap()
            .last_insert_rowid();

        let content = f
            .repo
            .create(
                &plain(&f, "Linked")
                    .with_contributors(vec![contributor])
                    .with_tags(vec![tag]),
            )
            .await
            .unwrap();

        let links: i64 = sqlx::query_scalar(
            r#"SELECT (SELECT COUNT(*) FROM content_contributors WHERE content_id = ?)
                    + (SELECT COUNT(*) FROM content_tags WHERE content_id = ?)"#,
        )
        .bind(content.id)
        .bind(content.id)
        .fetch_one(sqlite)
        .await
        .unwrap();
        assert_eq!(links, 2);
    }

    #[tokio::test]
    async fn test_create_with_missing_issue_rolls_back() {
        let f = setup().await;
        let input =
            CreateContentInput::new("Orphan".to_string(), "orphan".to_string(), 404, f.section_id)
                .image("images/x/1_a.jpg".to_string());

        let err = f.repo.create(&input).await.expect_err("FK should reject");

        assert!(crate::db::is_foreign_key_violation(&err));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content")
            .fetch_one(f.pool.require_sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_list_featured_and_set_featured() {
        let f = setup().await;
        let first = f.repo.create(&plain(&f, "First").featured(true)).await.unwrap();
        let second = f.repo.create(&plain(&f, "Second").featured(true)).await.unwrap();
        f.repo.create(&plain(&f, "Third")).await.unwrap();

        let featured = f.repo.list_featured(f.issue_id, f.section_id).await.unwrap();
        assert_eq!(featured.len(), 2);
        assert_eq!(
            f.repo.featured_for(f.issue_id, f.section_id).await.unwrap().map(|c| c.id),
            Some(second.id)
        );

        f.repo.set_featured(first.id, false).await.unwrap();
        let featured = f.repo.list_featured(f.issue_id, f.section_id).await.unwrap();
        assert_eq!(featured.iter().map(|c| c.id).collect::<Vec<_>>(), vec![second.id]);
    }

    #[tokio::test]
    async fn test_list_by_issue_and_section() {
        let f = setup().await;
        let other_section = insert_section(&f.pool, "Prose").await;
        f.repo.create(&plain(&f, "Poem")).await.unwrap();
        f.repo
            .create(&CreateContentInput::new(
                "Story".to_string(),
                "story".to_string(),
                f.issue_id,
                other_section,
            ))
            .await
            .unwrap();

        let poetry = f.repo.list_by_issue_and_section(f.issue_id, f.section_id).await.unwrap();
        let whole_issue = f.repo.list_by_issue(f.issue_id).await.unwrap();

        assert_eq!(poetry.len(), 1);
        assert_eq!(poetry[0].title, "Poem");
        assert_eq!(whole_issue.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_issue_cascades_to_content() {
        let f = setup().await;
        let image = f
            .repo
            .create(&plain(&f, "Gone").image("images/spring/1_g.jpg".to_string()))
            .await
            .unwrap();

        sqlx::query("DELETE FROM issues WHERE id = ?")
            .bind(f.issue_id)
            .execute(f.pool.require_sqlite().unwrap())
            .await
            .unwrap();

        assert!(f.repo.get_by_id(image.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_content() {
        let f = setup().await;
        let content = f.repo.create(&plain(&f, "Brief")).await.unwrap();

        f.repo.delete(content.id).await.unwrap();

        assert!(f.repo.get_by_id(content.id).await.unwrap().is_none());
    }
}
