// src/cms/cases.rs
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

const MAX_TAGS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub slug: String,
    pub client: String,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub tags: Vec<String>,
    pub cover_image_url: Option<String>,
    pub featured: bool,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CaseRow {
    id: String,
    slug: String,
    client: String,
    title: String,
    summary: String,
    body: String,
    tags: String,
    cover_image_url: Option<String>,
    featured: bool,
    published: bool,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CaseRow {
    fn into_case(self) -> Result<Case> {
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .with_context(|| format!("Corrupt tags for case {}", self.id))?;

        Ok(Case {
            id: self.id,
            slug: self.slug,
            client: self.client,
            title: self.title,
            summary: self.summary,
            body: self.body,
            tags,
            cover_image_url: self.cover_image_url,
            featured: self.featured,
            published: self.published,
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaseInput {
    pub client: String,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub published: bool,
}

/// Trimmed, without blanks or case-insensitive duplicates
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || normalized.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        normalized.push(tag.to_string());
    }
    normalized
}

impl CaseInput {
    pub fn validate(&self) -> Result<String, DomainError> {
        let mut problems = Vec::new();
        check_required("client", &self.client, MAX_TITLE_CHARS, &mut problems);
        check_required("title", &self.title, MAX_TITLE_CHARS, &mut problems);
        check_required("body", &self.body, usize::MAX, &mut problems);
        check_optional("summary", Some(&self.summary), MAX_SUMMARY_CHARS, &mut problems);
        if normalize_tags(&self.tags).len() > MAX_TAGS {
            problems.push(format!("at most {} tags are allowed", MAX_TAGS));
        }
        let slug = resolve_slug(self.slug.as_deref(), &self.title, &mut problems);

        DomainError::check(problems)?;
        Ok(slug)
    }
}

const CASE_COLUMNS: &str = "id, slug, client, title, summary, body, tags, cover_image_url, \
     featured, published, published_at, created_at, updated_at";

pub struct CaseRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CaseRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, input: CaseInput) -> Result<Case> {
        let slug = input.validate()?;
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO cases (id, slug, client, title, summary, body, tags, cover_image_url,
                               featured, published, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&slug)
        .bind(input.client.trim())
        .bind(input.title.trim())
        .bind(input.summary.trim())
        .bind(&input.body)
        .bind(serde_json::to_string(&normalize_tags(&input.tags))?)
        .bind(optional_text(input.cover_image_url))
        .bind(input.featured)
        .bind(input.published)
        .bind(next_published_at(None, input.published, now))
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| map_write_error(e, "Case", &slug))?;

        app_log!(info, "Created case {} for {} ({})", slug, input.client.trim(), id);
        self.require(&id).await
    }

    pub async fn update(&self, id: &str, input: CaseInput) -> Result<Case> {
        let existing = self.require(id).await?;
        let slug = input.validate()?;
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE cases
            SET slug = ?, client = ?, title = ?, summary = ?, body = ?, tags = ?,
                cover_image_url = ?, featured = ?, published = ?, published_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&slug)
        .bind(input.client.trim())
        .bind(input.title.trim())
        .bind(input.summary.trim())
        .bind(&input.body)
        .bind(serde_json::to_string(&normalize_tags(&input.tags))?)
        .bind(optional_text(input.cover_image_url))
        .bind(input.featured)
        .bind(input.published)
        .bind(next_published_at(existing.published_at, input.published, now))
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| map_write_error(e, "Case", &slug))?;

        app_log!(info, "Updated case {} ({})", slug, id);
        self.require(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cases WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to delete case")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Case>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {} FROM cases WHERE id = ?",
            CASE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to load case")?;

        row.map(CaseRow::into_case).transpose()
    }

    async fn require(&self, id: &str) -> Result<Case> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Case '{}'", id)).into())
    }

    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Option<Case>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {} FROM cases WHERE slug = ? AND published = TRUE",
            CASE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await
        .context("Failed to load case by slug")?;

        row.map(CaseRow::into_case).transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<Case>> {
        self.fetch(
            &format!("SELECT {} FROM cases ORDER BY created_at DESC", CASE_COLUMNS),
            None,
        )
        .await
    }

    pub async fn list_published(&self, limit: Option<i64>) -> Result<Vec<Case>> {
        self.fetch(
            &format!(
                "SELECT {} FROM cases WHERE published = TRUE \
                 ORDER BY featured DESC, published_at DESC, created_at DESC LIMIT ?",
                CASE_COLUMNS
            ),
            Some(limit.unwrap_or(-1)),
        )
        .await
    }

    pub async fn list_featured(&self) -> Result<Vec<Case>> {
        self.fetch(
            &format!(
                "SELECT {} FROM cases WHERE published = TRUE AND featured = TRUE \
                 ORDER BY published_at DESC, created_at DESC",
                CASE_COLUMNS
            ),
            None,
        )
        .await
    }

    async fn fetch(&self, sql: &str, limit: Option<i64>) -> Result<Vec<Case>> {
        let mut query = sqlx::query_as::<_, CaseRow>(sql);
        if let Some(limit) = limit {
            query = query.bind(limit);
        }

        let rows = query
            .fetch_all(self.pool)
            .await
            .context("Failed to list cases")?;

        rows.into_iter().map(CaseRow::into_case).collect()
    }
}
