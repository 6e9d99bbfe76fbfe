// src/resume/store.rs
//! Resume persistence: an in-memory store for development/tests and the SQLite store

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use super::blocks::ResumeBlock;
use super::document::Resume;
use super::import::{parse_seeds, SAMPLE_SEEDS};
use super::localized::LocalizedText;
use crate::app_log;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Resume>>;
    async fn get(&self, id: &str) -> Result<Option<Resume>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Resume>>;
    async fn insert(&self, resume: &Resume) -> Result<()>;
    async fn update(&self, resume: &Resume) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<bool>;
}

// ===== In-memory store =====

#[derive(Default)]
pub struct MockResumeStore {
    resumes: RwLock<Vec<Resume>>,
}

impl MockResumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the bundled sample consultants
    pub fn seeded() -> Result<Self> {
        let mut resumes = Vec::new();
        for seed in parse_seeds(SAMPLE_SEEDS)? {
            let slug = seed.resolved_slug();
            let resume = seed
                .into_resume()
                .with_context(|| format!("Invalid sample resume {}", slug))?;
            resumes.push(resume);
        }

        app_log!(info, "Mock resume store seeded with {} resumes", resumes.len());
        Ok(Self {
            resumes: RwLock::new(resumes),
        })
    }
}

#[async_trait]
impl ResumeStore for MockResumeStore {
    async fn list(&self) -> Result<Vec<Resume>> {
        Ok(self.resumes.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Resume>> {
        Ok(self.resumes.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Resume>> {
        Ok(self
            .resumes
            .read()
            .await
            .iter()
            .find(|r| r.slug == slug)
            .cloned())
    }

    async fn insert(&self, resume: &Resume) -> Result<()> {
        let mut resumes = self.resumes.write().await;
        if resumes.iter().any(|r| r.id == resume.id || r.slug == resume.slug) {
            anyhow::bail!("Resume already exists: {}", resume.slug);
        }
        resumes.push(resume.clone());
        Ok(())
    }

    async fn update(&self, resume: &Resume) -> Result<()> {
        let mut resumes = self.resumes.write().await;
        match resumes.iter_mut().find(|r| r.id == resume.id) {
            Some(existing) => {
                *existing = resume.clone();
                Ok(())
            }
            None => anyhow::bail!("Resume not found: {}", resume.id),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut resumes = self.resumes.write().await;
        let before = resumes.len();
        resumes.retain(|r| r.id != id);
        Ok(resumes.len() != before)
    }
}

// ===== SQLite store =====

#[derive(sqlx::FromRow)]
struct ResumeRow {
    id: String,
    slug: String,
    person_name: String,
    headline: String,
    published: bool,
    blocks: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResumeRow {
    fn into_resume(self) -> Result<Resume> {
        let headline: LocalizedText = serde_json::from_str(&self.headline)
            .with_context(|| format!("Corrupt headline for resume {}", self.id))?;
        let blocks: Vec<ResumeBlock> = serde_json::from_str(&self.blocks)
            .with_context(|| format!("Corrupt blocks for resume {}", self.id))?;

        Ok(Resume {
            id: self.id,
            slug: self.slug,
            person_name: self.person_name,
            headline,
            published: self.published,
            blocks,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const RESUME_COLUMNS: &str =
    "id, slug, person_name, headline, published, blocks, created_at, updated_at";

pub struct SqliteResumeStore {
    pool: SqlitePool,
}

impl SqliteResumeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for SqliteResumeStore {
    async fn list(&self) -> Result<Vec<Resume>> {
        let rows = sqlx::query_as::<_, ResumeRow>(&format!(
            "SELECT {} FROM resumes ORDER BY person_name ASC",
            RESUME_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list resumes")?;

        rows.into_iter().map(ResumeRow::into_resume).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Resume>> {
        let row = sqlx::query_as::<_, ResumeRow>(&format!(
            "SELECT {} FROM resumes WHERE id = ?",
            RESUME_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load resume")?;

        row.map(ResumeRow::into_resume).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Resume>> {
        let row = sqlx::query_as::<_, ResumeRow>(&format!(
            "SELECT {} FROM resumes WHERE slug = ?",
            RESUME_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load resume by slug")?;

        row.map(ResumeRow::into_resume).transpose()
    }

    async fn insert(&self, resume: &Resume) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO resumes (id, slug, person_name, headline, published, blocks, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&resume.id)
        .bind(&resume.slug)
        .bind(&resume.person_name)
        .bind(serde_json::to_string(&resume.headline)?)
        .bind(resume.published)
        .bind(serde_json::to_string(&resume.blocks)?)
        .bind(resume.created_at)
        .bind(resume.updated_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert resume {}", resume.slug))?;

        app_log!(info, "Inserted resume {} ({})", resume.slug, resume.id);
        Ok(())
    }

    async fn update(&self, resume: &Resume) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET slug = ?, person_name = ?, headline = ?, published = ?, blocks = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&resume.slug)
        .bind(&resume.person_name)
        .bind(serde_json::to_string(&resume.headline)?)
        .bind(resume.published)
        .bind(serde_json::to_string(&resume.blocks)?)
        .bind(resume.updated_at)
        .bind(&resume.id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to update resume {}", resume.id))?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Resume not found: {}", resume.id);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete resume")?;

        Ok(result.rows_affected() > 0)
    }
}
