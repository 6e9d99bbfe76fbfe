// src/resume/service.rs
//! Resume use cases shared by the public pages, the internal editor and the CLI

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::blocks::{assign_block_ids, ResumeBlock};
use super::document::{BlockEdit, EditOutcome, Resume};
use super::import::ResumeSeed;
use super::localized::{Language, LocalizedText};
use super::projection::{
    project_resume, translation_warnings, ProjectionMode, RenderedResume, TranslationWarning,
};
use super::store::ResumeStore;
use crate::app_log;
use crate::types::DomainError;
use crate::utils::{is_valid_slug, name_sort_key, slugify};

#[derive(Debug, Clone, Serialize)]
pub struct ResumeSummary {
    pub id: String,
    pub slug: String,
    pub person_name: String,
    pub headline: String,
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewResume {
    pub person_name: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub headline: LocalizedText,
    #[serde(default)]
    pub blocks: Vec<ResumeBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeMetaUpdate {
    #[serde(default)]
    pub person_name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub headline: Option<LocalizedText>,
    #[serde(default)]
    pub published: Option<bool>,
}

/// Everything the editor needs to render one resume
#[derive(Debug, Clone, Serialize)]
pub struct EditorView {
    pub resume: RenderedResume,
    pub source: Resume,
    pub warnings: Vec<TranslationWarning>,
    pub problems: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    pub outcome: EditOutcome,
    pub resume: Resume,
}

#[derive(Clone)]
pub struct ResumeService {
    store: Arc<dyn ResumeStore>,
}

fn summarize(resume: &Resume, lang: Language) -> ResumeSummary {
    ResumeSummary {
        id: resume.id.clone(),
        slug: resume.slug.clone(),
        person_name: resume.person_name.clone(),
        headline: resume.headline.resolve(lang).to_string(),
        published: resume.published,
        updated_at: resume.updated_at,
    }
}

impl ResumeService {
    pub fn new(store: Arc<dyn ResumeStore>) -> Self {
        Self { store }
    }

    async fn require(&self, id: &str) -> Result<Resume> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Resume '{}'", id)).into())
    }

    async fn ensure_slug_free(&self, slug: &str, owner_id: Option<&str>) -> Result<()> {
        if !is_valid_slug(slug) {
            return Err(DomainError::validation(format!("Invalid slug: '{}'", slug)).into());
        }
        if let Some(existing) = self.store.get_by_slug(slug).await? {
            if Some(existing.id.as_str()) != owner_id {
                return Err(DomainError::Conflict(format!("Slug '{}' is already used", slug)).into());
            }
        }
        Ok(())
    }

    /// Published resumes for the public listing, ordered by name
    pub async fn list_public(&self, lang: Language) -> Result<Vec<ResumeSummary>> {
        let mut summaries: Vec<ResumeSummary> = self
            .store
            .list()
            .await?
            .iter()
            .filter(|r| r.published)
            .map(|r| summarize(r, lang))
            .collect();
        summaries.sort_by_cached_key(|s| name_sort_key(&s.person_name));
        Ok(summaries)
    }

    pub async fn list_all(&self, lang: Language) -> Result<Vec<ResumeSummary>> {
        let mut summaries: Vec<ResumeSummary> = self
            .store
            .list()
            .await?
            .iter()
            .map(|r| summarize(r, lang))
            .collect();
        summaries.sort_by_cached_key(|s| name_sort_key(&s.person_name));
        Ok(summaries)
    }

    /// Drafts are invisible to the public
    pub async fn get_public(&self, slug: &str, lang: Language) -> Result<Option<RenderedResume>> {
        Ok(self
            .store
            .get_by_slug(slug)
            .await?
            .filter(|r| r.published)
            .map(|r| project_resume(&r, lang, ProjectionMode::Public)))
    }

    pub async fn get_editor(&self, id: &str, lang: Language) -> Result<EditorView> {
        let resume = self.require(id).await?;
        Ok(EditorView {
            resume: project_resume(&resume, lang, ProjectionMode::Editor),
            warnings: translation_warnings(&resume.blocks),
            problems: resume.content_problems(),
            source: resume,
        })
    }

    pub async fn create(&self, request: NewResume) -> Result<Resume> {
        let person_name = request.person_name.trim().to_string();
        let mut problems = Vec::new();
        if person_name.is_empty() {
            problems.push("person_name is required".to_string());
        }
        if request.headline.is_blank() {
            problems.push("headline is required".to_string());
        }
        DomainError::check(problems)?;

        let slug = request
            .slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&person_name));
        self.ensure_slug_free(&slug, None).await?;

        let mut resume = Resume::new(slug, person_name, request.headline);
        resume.replace_blocks(request.blocks);
        self.store.insert(&resume).await?;

        app_log!(info, "Created resume {} for {}", resume.slug, resume.person_name);
        Ok(resume)
    }

    pub async fn update_meta(&self, id: &str, update: ResumeMetaUpdate) -> Result<Resume> {
        let mut resume = self.require(id).await?;

        if let Some(name) = update.person_name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("person_name cannot be empty").into());
            }
            resume.person_name = name;
        }
        if let Some(slug) = update.slug {
            let slug = slug.trim().to_string();
            self.ensure_slug_free(&slug, Some(&resume.id)).await?;
            resume.slug = slug;
        }
        if let Some(headline) = update.headline {
            if headline.is_blank() {
                return Err(DomainError::validation("headline cannot be empty").into());
            }
            resume.headline = headline;
        }
        if let Some(published) = update.published {
            if published {
                DomainError::check(resume.content_problems())?;
            }
            resume.published = published;
        }

        resume.touch();
        self.store.update(&resume).await?;
        Ok(resume)
    }

    pub async fn replace_blocks(&self, id: &str, blocks: Vec<ResumeBlock>) -> Result<Resume> {
        let mut resume = self.require(id).await?;
        let mut blocks = blocks;
        let assigned = assign_block_ids(&mut blocks);

        if resume.published {
            let problems: Vec<String> = blocks.iter().flat_map(|b| b.validate()).collect();
            DomainError::check(problems)?;
        }

        resume.replace_blocks(blocks);
        self.store.update(&resume).await?;

        app_log!(
            info,
            "Replaced {} blocks on resume {} ({} new ids)",
            resume.blocks.len(),
            resume.slug,
            assigned
        );
        Ok(resume)
    }

    pub async fn edit(&self, id: &str, edit: BlockEdit) -> Result<EditResponse> {
        let mut resume = self.require(id).await?;
        let outcome = resume.apply(edit)?;

        if outcome.changed {
            if resume.published {
                DomainError::check(resume.content_problems())?;
            }
            self.store.update(&resume).await?;
        }

        Ok(EditResponse { outcome, resume })
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(DomainError::NotFound(format!("Resume '{}'", id)).into());
        }
        app_log!(info, "Deleted resume {}", id);
        Ok(())
    }

    /// Insert or overwrite by slug
    pub async fn import(&self, seed: ResumeSeed) -> Result<Resume> {
        let slug = seed.resolved_slug();
        if !is_valid_slug(&slug) {
            return Err(DomainError::validation(format!("Invalid slug: '{}'", slug)).into());
        }

        match self.store.get_by_slug(&slug).await? {
            Some(mut existing) => {
                seed.apply_to(&mut existing)?;
                self.store.update(&existing).await?;
                app_log!(info, "Re-imported resume {}", slug);
                Ok(existing)
            }
            None => {
                let resume = seed.into_resume()?;
                self.store.insert(&resume).await?;
                app_log!(info, "Imported resume {}", resume.slug);
                Ok(resume)
            }
        }
    }
}
