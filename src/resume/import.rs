// src/resume/import.rs
//! TOML resume seed files, used by the admin CLI and to seed the mock store

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::blocks::ResumeBlock;
use super::document::Resume;
use super::localized::LocalizedText;
use crate::types::DomainError;
use crate::utils::slugify;

#[derive(Debug, Clone, Deserialize)]
pub struct ResumeSeed {
    #[serde(default)]
    pub slug: Option<String>,
    pub person_name: String,
    pub headline: LocalizedText,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub blocks: Vec<ResumeBlock>,
}

impl ResumeSeed {
    pub fn resolved_slug(&self) -> String {
        self.slug
            .clone()
            .unwrap_or_else(|| slugify(&self.person_name))
    }

    /// Overwrites `resume` with the seed. A published seed must have valid blocks.
    pub fn apply_to(self, resume: &mut Resume) -> Result<(), DomainError> {
        resume.person_name = self.person_name;
        resume.headline = self.headline;
        resume.replace_blocks(self.blocks);
        if self.published {
            DomainError::check(resume.content_problems())?;
        }
        resume.published = self.published;
        Ok(())
    }

    pub fn into_resume(self) -> Result<Resume, DomainError> {
        let mut resume = Resume::new(
            self.resolved_slug(),
            self.person_name.clone(),
            self.headline.clone(),
        );
        self.apply_to(&mut resume)?;
        Ok(resume)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SeedFile {
    #[serde(default, rename = "resume")]
    resumes: Vec<ResumeSeed>,
}

/// Parse a seed document holding one or more `[[resume]]` tables
pub fn parse_seeds(content: &str) -> Result<Vec<ResumeSeed>> {
    let file: SeedFile = toml::from_str(content).context("Failed to parse resume seed TOML")?;
    if file.resumes.is_empty() {
        anyhow::bail!("Seed file contains no [[resume]] entries");
    }
    Ok(file.resumes)
}

pub async fn read_seed_file(path: &Path) -> Result<Vec<ResumeSeed>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    parse_seeds(&content)
}

pub(crate) const SAMPLE_SEEDS: &str = r#"
[[resume]]
slug = "anna-berg"
person_name = "Anna Berg"
headline = { sv = "Senior systemutvecklare", en = "Senior software engineer" }
published = true

[[resume.blocks]]
type = "header"
name = "Anna Berg"
title = { sv = "Senior systemutvecklare", en = "Senior software engineer" }
location = "Stockholm"

[[resume.blocks]]
type = "summary"
text = { sv = "Backendutvecklare med fokus på distribuerade system.", en = "Backend engineer focused on distributed systems." }

[[resume.blocks]]
type = "skills_grid"
heading = { sv = "Kompetenser", en = "Skills" }

[[resume.blocks.groups]]
label = { sv = "Språk", en = "Languages" }
skills = ["Rust", "Go", "TypeScript"]

[[resume.blocks.groups]]
label = { sv = "Moln", en = "Cloud" }
skills = ["AWS", "Kubernetes"]

[[resume.blocks]]
type = "experience_item"
role = { sv = "Teknisk ledare", en = "Tech lead" }
company = "Nordbank"
start = "2021"
highlights = [
    { sv = "Ledde migreringen till event-driven arkitektur", en = "Led the migration to an event-driven architecture" },
]
technologies = ["Rust", "Kafka"]

[[resume.blocks]]
type = "languages"

[[resume.blocks.entries]]
language = { sv = "Svenska", en = "Swedish" }
level = { sv = "Modersmål", en = "Native" }

[[resume.blocks.entries]]
language = { sv = "Engelska", en = "English" }
level = { sv = "Flytande", en = "Fluent" }

[[resume]]
slug = "erik-lind"
person_name = "Erik Lind"
headline = { sv = "UX-designer", en = "UX designer" }
published = false

[[resume.blocks]]
type = "header"
name = "Erik Lind"
title = { sv = "UX-designer", en = "UX designer" }

[[resume.blocks]]
type = "quote"
text = { sv = "Erik lyfte hela teamet.", en = "Erik lifted the whole team." }
attribution = "Produktägare, Nordbank"
"#;
