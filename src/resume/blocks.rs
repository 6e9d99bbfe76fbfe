// src/resume/blocks.rs
//! The resume block union and block id assignment

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::localized::LocalizedText;

pub type BlockId = String;

const BLOCK_ID_PREFIX: &str = "blk_";

/// One unit of resume content. Serialized flat: `{"id": .., "hidden": .., "type": .., ..fields}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeBlock {
    #[serde(default)]
    pub id: BlockId,
    #[serde(default)]
    pub hidden: bool,
    #[serde(flatten)]
    pub content: BlockContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockContent {
    Header(HeaderBlock),
    Summary(SummaryBlock),
    SectionHeading(SectionHeadingBlock),
    SkillsGrid(SkillsGridBlock),
    ExperienceItem(ExperienceItemBlock),
    EducationItem(EducationItemBlock),
    ProjectItem(ProjectItemBlock),
    Certification(CertificationBlock),
    Languages(LanguagesBlock),
    Quote(QuoteBlock),
    Contact(ContactBlock),
    Divider(DividerBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub name: String,
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<LocalizedText>,
    pub text: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionHeadingBlock {
    pub text: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub label: LocalizedText,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillsGridBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<LocalizedText>,
    #[serde(default)]
    pub groups: Vec<SkillGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceItemBlock {
    pub role: LocalizedText,
    pub company: String,
    pub start: String,
    /// None means ongoing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub highlights: Vec<LocalizedText>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationItemBlock {
    pub institution: String,
    pub degree: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectItemBlock {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    pub description: LocalizedText,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationBlock {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: LocalizedText,
    pub level: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguagesBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<LocalizedText>,
    #[serde(default)]
    pub entries: Vec<LanguageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBlock {
    pub text: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContactBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DividerBlock {}

impl ResumeBlock {
    /// New block without an id; call `assign_block_ids` before persisting
    pub fn new(content: BlockContent) -> Self {
        Self {
            id: BlockId::new(),
            hidden: false,
            content,
        }
    }

    pub fn with_id(id: impl Into<BlockId>, content: BlockContent) -> Self {
        Self {
            id: id.into(),
            hidden: false,
            content,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.content.kind()
    }

    pub fn validate(&self) -> Vec<String> {
        self.content
            .validate()
            .into_iter()
            .map(|problem| format!("{} block '{}': {}", self.kind(), self.id, problem))
            .collect()
    }
}

impl BlockContent {
    pub fn kind(&self) -> &'static str {
        match self {
            BlockContent::Header(_) => "header",
            BlockContent::Summary(_) => "summary",
            BlockContent::SectionHeading(_) => "section_heading",
            BlockContent::SkillsGrid(_) => "skills_grid",
            BlockContent::ExperienceItem(_) => "experience_item",
            BlockContent::EducationItem(_) => "education_item",
            BlockContent::ProjectItem(_) => "project_item",
            BlockContent::Certification(_) => "certification",
            BlockContent::Languages(_) => "languages",
            BlockContent::Quote(_) => "quote",
            BlockContent::Contact(_) => "contact",
            BlockContent::Divider(_) => "divider",
        }
    }

    /// Structural problems only. Missing translations are reported by `localized_fields`.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut require = |ok: bool, message: &str| {
            if !ok {
                problems.push(message.to_string());
            }
        };

        match self {
            BlockContent::Header(b) => {
                require(!b.name.trim().is_empty(), "name is required");
                require(!b.title.is_blank(), "title is required");
            }
            BlockContent::Summary(b) => require(!b.text.is_blank(), "text is required"),
            BlockContent::SectionHeading(b) => require(!b.text.is_blank(), "text is required"),
            BlockContent::SkillsGrid(b) => {
                require(!b.groups.is_empty(), "at least one skill group is required");
                for group in &b.groups {
                    require(!group.label.is_blank(), "skill group label is required");
                    require(!group.skills.is_empty(), "skill group has no skills");
                }
            }
            BlockContent::ExperienceItem(b) => {
                require(!b.role.is_blank(), "role is required");
                require(!b.company.trim().is_empty(), "company is required");
                require(!b.start.trim().is_empty(), "start is required");
            }
            BlockContent::EducationItem(b) => {
                require(!b.institution.trim().is_empty(), "institution is required");
                require(!b.degree.is_blank(), "degree is required");
            }
            BlockContent::ProjectItem(b) => {
                require(!b.name.trim().is_empty(), "name is required");
                require(!b.description.is_blank(), "description is required");
            }
            BlockContent::Certification(b) => {
                require(!b.name.trim().is_empty(), "name is required")
            }
            BlockContent::Languages(b) => {
                require(!b.entries.is_empty(), "at least one language is required");
                for entry in &b.entries {
                    require(!entry.language.is_blank(), "language name is required");
                }
            }
            BlockContent::Quote(b) => require(!b.text.is_blank(), "text is required"),
            BlockContent::Contact(b) => require(
                b.email.is_some() || b.phone.is_some() || b.linkedin.is_some() || b.website.is_some(),
                "at least one contact channel is required",
            ),
            BlockContent::Divider(_) => {}
        }

        problems
    }

    /// Every localized field with a path usable in editor warnings
    pub fn localized_fields(&self) -> Vec<(String, &LocalizedText)> {
        let mut fields: Vec<(String, &LocalizedText)> = Vec::new();

        match self {
            BlockContent::Header(b) => {
                fields.push(("title".into(), &b.title));
                push_optional(&mut fields, "location", b.location.as_ref());
            }
            BlockContent::Summary(b) => {
                push_optional(&mut fields, "heading", b.heading.as_ref());
                fields.push(("text".into(), &b.text));
            }
            BlockContent::SectionHeading(b) => fields.push(("text".into(), &b.text)),
            BlockContent::SkillsGrid(b) => {
                push_optional(&mut fields, "heading", b.heading.as_ref());
                for (i, group) in b.groups.iter().enumerate() {
                    fields.push((format!("groups[{}].label", i), &group.label));
                }
            }
            BlockContent::ExperienceItem(b) => {
                fields.push(("role".into(), &b.role));
                push_optional(&mut fields, "description", b.description.as_ref());
                for (i, highlight) in b.highlights.iter().enumerate() {
                    fields.push((format!("highlights[{}]", i), highlight));
                }
            }
            BlockContent::EducationItem(b) => {
                fields.push(("degree".into(), &b.degree));
                push_optional(&mut fields, "description", b.description.as_ref());
            }
            BlockContent::ProjectItem(b) => fields.push(("description".into(), &b.description)),
            BlockContent::Languages(b) => {
                push_optional(&mut fields, "heading", b.heading.as_ref());
                for (i, entry) in b.entries.iter().enumerate() {
                    fields.push((format!("entries[{}].language", i), &entry.language));
                    fields.push((format!("entries[{}].level", i), &entry.level));
                }
            }
            BlockContent::Quote(b) => fields.push(("text".into(), &b.text)),
            BlockContent::Certification(_) | BlockContent::Contact(_) | BlockContent::Divider(_) => {}
        }

        fields
    }
}

fn push_optional<'a>(
    fields: &mut Vec<(String, &'a LocalizedText)>,
    name: &str,
    value: Option<&'a LocalizedText>,
) {
    if let Some(text) = value {
        fields.push((name.to_string(), text));
    }
}

pub fn new_block_id() -> BlockId {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", BLOCK_ID_PREFIX, &raw[..12])
}

/// Give every block without an id, or with an id already used earlier in the list, a fresh one.
/// Returns how many ids were assigned.
pub fn assign_block_ids(blocks: &mut [ResumeBlock]) -> usize {
    let mut seen: HashSet<BlockId> = HashSet::with_capacity(blocks.len());
    let mut assigned = 0;

    for block in blocks.iter_mut() {
        let id = block.id.trim();
        if id.is_empty() || seen.contains(id) {
            let mut fresh = new_block_id();
            while seen.contains(&fresh) {
                fresh = new_block_id();
            }
            block.id = fresh;
            assigned += 1;
        } else if id.len() != block.id.len() {
            let trimmed = id.to_string();
            block.id = trimmed;
        }
        seen.insert(block.id.clone());
    }

    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(text: &str) -> BlockContent {
        BlockContent::SectionHeading(SectionHeadingBlock { text: text.into() })
    }

    #[test]
    fn test_block_serializes_flat_with_type_tag() {
        let block = ResumeBlock::with_id(
            "blk_1",
            BlockContent::Header(HeaderBlock {
                name: "Anna Berg".into(),
                title: LocalizedText::pair("Systemutvecklare", "Software engineer"),
                location: None,
                photo_url: None,
            }),
        );

        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "header");
        assert_eq!(json["id"], "blk_1");
        assert_eq!(json["hidden"], false);
        assert_eq!(json["title"]["en"], "Software engineer");
        assert!(json.get("location").is_none());
    }

    #[test]
    fn test_block_deserializes_with_defaults() {
        let block: ResumeBlock = serde_json::from_str(
            r#"{"type":"skills_grid","groups":[{"label":{"sv":"Språk","en":"Languages"},"skills":["Rust","Go"]}]}"#,
        )
        .unwrap();

        assert!(block.id.is_empty());
        assert!(!block.hidden);
        assert_eq!(block.kind(), "skills_grid");

        let divider: ResumeBlock = serde_json::from_str(r#"{"type":"divider","hidden":true}"#).unwrap();
        assert!(divider.hidden);
        assert_eq!(divider.content, BlockContent::Divider(DividerBlock {}));
    }

    #[test]
    fn test_unknown_block_type_is_rejected() {
        let result = serde_json::from_str::<ResumeBlock>(r#"{"type":"carousel"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_assign_block_ids_fills_missing_and_duplicates() {
        let mut blocks = vec![
            ResumeBlock::with_id("keep", heading("A")),
            ResumeBlock::new(heading("B")),
            ResumeBlock::with_id("keep", heading("C")),
        ];

        let assigned = assign_block_ids(&mut blocks);

        assert_eq!(assigned, 2);
        assert_eq!(blocks[0].id, "keep");
        assert!(blocks[1].id.starts_with("blk_"));
        assert_ne!(blocks[2].id, "keep");

        let unique: HashSet<_> = blocks.iter().map(|b| b.id.clone()).collect();
        assert_eq!(unique.len(), 3);

        assert_eq!(assign_block_ids(&mut blocks), 0);
    }

    #[test]
    fn test_validate_reports_problems() {
        let block = ResumeBlock::with_id(
            "x",
            BlockContent::ExperienceItem(ExperienceItemBlock {
                role: LocalizedText::pair("", ""),
                company: "Acme".into(),
                start: "".into(),
                end: None,
                description: None,
                highlights: vec![],
                technologies: vec![],
            }),
        );

        let problems = block.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("experience_item block 'x'"));

        assert!(ResumeBlock::new(BlockContent::Divider(DividerBlock {}))
            .validate()
            .is_empty());
    }

    #[test]
    fn test_localized_fields_paths() {
        let content = BlockContent::ExperienceItem(ExperienceItemBlock {
            role: "Lead".into(),
            company: "Acme".into(),
            start: "2020".into(),
            end: None,
            description: Some(LocalizedText::pair("Beskrivning", "")),
            highlights: vec!["One".into(), "Two".into()],
            technologies: vec![],
        });

        let paths: Vec<String> = content.localized_fields().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["role", "description", "highlights[0]", "highlights[1]"]);
    }
}
