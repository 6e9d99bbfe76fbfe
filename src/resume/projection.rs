// src/resume/projection.rs
//! Per-language projection of resume blocks into render-ready values

use serde::Serialize;

use super::blocks::{BlockContent, BlockId, ResumeBlock};
use super::document::Resume;
use super::localized::{Language, LocalizedText};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Hidden blocks are dropped
    Public,
    /// Hidden blocks are kept and flagged
    Editor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBlock {
    pub id: BlockId,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(flatten)]
    pub content: RenderedContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSkillGroup {
    pub label: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedLanguage {
    pub language: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderedContent {
    Header {
        name: String,
        title: String,
        location: Option<String>,
        photo_url: Option<String>,
    },
    Summary {
        heading: Option<String>,
        text: String,
    },
    SectionHeading {
        text: String,
    },
    SkillsGrid {
        heading: Option<String>,
        groups: Vec<RenderedSkillGroup>,
    },
    ExperienceItem {
        role: String,
        company: String,
        period: String,
        description: Option<String>,
        highlights: Vec<String>,
        technologies: Vec<String>,
    },
    EducationItem {
        institution: String,
        degree: String,
        period: Option<String>,
        description: Option<String>,
    },
    ProjectItem {
        name: String,
        client: Option<String>,
        description: String,
        technologies: Vec<String>,
    },
    Certification {
        name: String,
        issuer: Option<String>,
        year: Option<String>,
    },
    Languages {
        heading: Option<String>,
        entries: Vec<RenderedLanguage>,
    },
    Quote {
        text: String,
        attribution: Option<String>,
    },
    Contact {
        email: Option<String>,
        phone: Option<String>,
        linkedin: Option<String>,
        website: Option<String>,
    },
    Divider,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedResume {
    pub id: String,
    pub slug: String,
    pub person_name: String,
    pub headline: String,
    pub language: Language,
    pub published: bool,
    pub blocks: Vec<RenderedBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationWarning {
    pub block_id: BlockId,
    pub field: String,
    pub missing: Language,
}

fn text(value: &LocalizedText, lang: Language) -> String {
    value.resolve(lang).to_string()
}

fn opt_text(value: &Option<LocalizedText>, lang: Language) -> Option<String> {
    value
        .as_ref()
        .map(|v| text(v, lang))
        .filter(|s| !s.trim().is_empty())
}

fn present_word(lang: Language) -> &'static str {
    match lang {
        Language::Sv => "pågående",
        Language::En => "present",
    }
}

fn period(start: &str, end: Option<&str>, lang: Language) -> String {
    format!("{} – {}", start, end.unwrap_or(present_word(lang)))
}

pub fn project_content(content: &BlockContent, lang: Language) -> RenderedContent {
    match content {
        BlockContent::Header(b) => RenderedContent::Header {
            name: b.name.clone(),
            title: text(&b.title, lang),
            location: opt_text(&b.location, lang),
            photo_url: b.photo_url.clone(),
        },
        BlockContent::Summary(b) => RenderedContent::Summary {
            heading: opt_text(&b.heading, lang),
            text: text(&b.text, lang),
        },
        BlockContent::SectionHeading(b) => RenderedContent::SectionHeading {
            text: text(&b.text, lang),
        },
        BlockContent::SkillsGrid(b) => RenderedContent::SkillsGrid {
            heading: opt_text(&b.heading, lang),
            groups: b
                .groups
                .iter()
                .map(|g| RenderedSkillGroup {
                    label: text(&g.label, lang),
                    skills: g.skills.clone(),
                })
                .collect(),
        },
        BlockContent::ExperienceItem(b) => RenderedContent::ExperienceItem {
            role: text(&b.role, lang),
            company: b.company.clone(),
            period: period(&b.start, b.end.as_deref(), lang),
            description: opt_text(&b.description, lang),
            highlights: b
                .highlights
                .iter()
                .map(|h| text(h, lang))
                .filter(|h| !h.trim().is_empty())
                .collect(),
            technologies: b.technologies.clone(),
        },
        BlockContent::EducationItem(b) => RenderedContent::EducationItem {
            institution: b.institution.clone(),
            degree: text(&b.degree, lang),
            period: b
                .start
                .as_deref()
                .map(|start| period(start, b.end.as_deref(), lang)),
            description: opt_text(&b.description, lang),
        },
        BlockContent::ProjectItem(b) => RenderedContent::ProjectItem {
            name: b.name.clone(),
            client: b.client.clone(),
            description: text(&b.description, lang),
            technologies: b.technologies.clone(),
        },
        BlockContent::Certification(b) => RenderedContent::Certification {
            name: b.name.clone(),
            issuer: b.issuer.clone(),
            year: b.year.clone(),
        },
        BlockContent::Languages(b) => RenderedContent::Languages {
            heading: opt_text(&b.heading, lang),
            entries: b
                .entries
                .iter()
                .map(|e| RenderedLanguage {
                    language: text(&e.language, lang),
                    level: text(&e.level, lang),
                })
                .collect(),
        },
        BlockContent::Quote(b) => RenderedContent::Quote {
            text: text(&b.text, lang),
            attribution: b.attribution.clone(),
        },
        BlockContent::Contact(b) => RenderedContent::Contact {
            email: b.email.clone(),
            phone: b.phone.clone(),
            linkedin: b.linkedin.clone(),
            website: b.website.clone(),
        },
        BlockContent::Divider(_) => RenderedContent::Divider,
    }
}

pub fn project(blocks: &[ResumeBlock], lang: Language, mode: ProjectionMode) -> Vec<RenderedBlock> {
    blocks
        .iter()
        .filter(|block| mode == ProjectionMode::Editor || !block.hidden)
        .map(|block| RenderedBlock {
            id: block.id.clone(),
            hidden: block.hidden,
            content: project_content(&block.content, lang),
        })
        .collect()
}

pub fn project_resume(resume: &Resume, lang: Language, mode: ProjectionMode) -> RenderedResume {
    RenderedResume {
        id: resume.id.clone(),
        slug: resume.slug.clone(),
        person_name: resume.person_name.clone(),
        headline: text(&resume.headline, lang),
        language: lang,
        published: resume.published,
        blocks: project(&resume.blocks, lang, mode),
    }
}

pub fn translation_warnings(blocks: &[ResumeBlock]) -> Vec<TranslationWarning> {
    blocks
        .iter()
        .flat_map(|block| {
            block
                .content
                .localized_fields()
                .into_iter()
                .filter_map(move |(field, value)| {
                    value.missing_translation().map(|missing| TranslationWarning {
                        block_id: block.id.clone(),
                        field,
                        missing,
                    })
                })
        })
        .collect()
}
