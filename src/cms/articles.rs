// src/cms/articles.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::{
    check_optional, check_required, map_write_error, next_published_at, optional_text,
    resolve_slug, MAX_SUMMARY_CHARS, MAX_TITLE_CHARS,
};
use crate::app_log;
use crate::types::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub cover_image_url: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub body: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl ArticleInput {
    /// Returns the slug to store
    pub fn validate(&self) -> Result<String, DomainError> {
        let mut problems = Vec::new();
        check_required("title", &self.title, MAX_TITLE_CHARS, &mut problems);
        check_required("body", &self.body, usize::MAX, &mut problems);
        check_optional("excerpt", self.excerpt.as_deref(), MAX_SUMMARY_CHARS, &mut problems);
        let slug = resolve_slug(self.slug.as_deref(), &self.title, &mut problems);

        DomainError::check(problems)?;
        Ok(slug)
    }
}

const ARTICLE_COLUMNS: &str = "id, slug, title, excerpt, body, cover_image_url, published, \
     published_at, author_id, created_at, updated_at";

pub struct ArticleRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ArticleRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, input: ArticleInput, author_id: Option<&str>) -> Result<Article> {
        let slug = input.validate()?;
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO articles (id, slug, title, excerpt, body, cover_image_url, published,
                                  published_at, author_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&slug)
        .bind(input.title.trim())
        .bind(optional_text(input.excerpt))
        .bind(&input.body)
        .bind(optional_text(input.cover_image_url))
        .bind(input.published)
        .bind(next_published_at(None, input.published, now))
        .bind(author_id)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| map_write_error(e, "Article", &slug))?;

        app_log!(info, "Created article {} ({})", slug, id);
        self.require(&id).await
    }

    pub async fn update(&self, id: &str, input: ArticleInput) -> Result<Article> {
        let existing = self.require(id).await?;
        let slug = input.validate()?;
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE articles
            SET slug = ?, title = ?, excerpt = ?, body = ?, cover_image_url = ?,
                published = ?, published_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&slug)
        .bind(input.title.trim())
        .bind(optional_text(input.excerpt))
        .bind(&input.body)
        .bind(optional_text(input.cover_image_url))
        .bind(input.published)
        .bind(next_published_at(existing.published_at, input.published, now))
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| map_write_error(e, "Article", &slug))?;

        app_log!(info, "Updated article {} ({})", slug, id);
        self.require(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to delete article")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {} FROM articles WHERE id = ?",
            ARTICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to load article")?;

        Ok(article)
    }

    async fn require(&self, id: &str) -> Result<Article> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Article '{}'", id)).into())
    }

    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {} FROM articles WHERE slug = ? AND published = TRUE",
            ARTICLE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await
        .context("Failed to load article by slug")?;

        Ok(article)
    }

    /// Newest first, drafts included
    pub async fn list_all(&self) -> Result<Vec<Article>> {
        let articles = sqlx::query_as::<_, Article>(&format!(
            "SELECT {} FROM articles ORDER BY created_at DESC",
            ARTICLE_COLUMNS
        ))
        .fetch_all(self.pool)
        .await
        .context("Failed to list articles")?;

        Ok(articles)
    }

    pub async fn list_published(&self, limit: Option<i64>) -> Result<Vec<Article>> {
        let articles = sqlx::query_as::<_, Article>(&format!(
            "SELECT {} FROM articles WHERE published = TRUE \
             ORDER BY published_at DESC, created_at DESC LIMIT ?",
            ARTICLE_COLUMNS
        ))
        .bind(limit.unwrap_or(-1))
        .fetch_all(self.pool)
        .await
        .context("Failed to list published articles")?;

        Ok(articles)
    }
}
