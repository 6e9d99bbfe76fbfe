// src/seo/heuristics.rs
use serde::{Deserialize, Serialize};

use super::extract::PageSnapshot;
use super::readability::Readability;

pub const THIN_CONTENT_WORDS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    fn penalty(&self) -> u32 {
        match self {
            Severity::Info => 3,
            Severity::Warning => 8,
            Severity::Critical => 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicResult {
    pub score: u8,
    pub issues: Vec<SeoIssue>,
}

impl HeuristicResult {
    pub fn has(&self, code: &str) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }
}

struct Issues(Vec<SeoIssue>);

impl Issues {
    fn push(&mut self, severity: Severity, code: &str, message: String) {
        self.0.push(SeoIssue {
            severity,
            code: code.to_string(),
            message,
        });
    }
}

pub fn evaluate(snapshot: &PageSnapshot, readability: &Readability) -> HeuristicResult {
    let mut issues = Issues(Vec::new());

    match snapshot.title.as_deref().map(|t| t.chars().count()) {
        None => issues.push(Severity::Critical, "missing_title", "Page has no <title>".into()),
        Some(len) if len < 10 => issues.push(
            Severity::Warning,
            "title_too_short",
            format!("Title is {} characters, aim for 10-60", len),
        ),
        Some(len) if len > 60 => issues.push(
            Severity::Warning,
            "title_too_long",
            format!("Title is {} characters and will be truncated in results", len),
        ),
        Some(_) => {}
    }

    match snapshot.meta_description.as_deref().map(|d| d.chars().count()) {
        None => issues.push(
            Severity::Warning,
            "missing_meta_description",
            "No meta description".into(),
        ),
        Some(len) if len < 50 => issues.push(
            Severity::Info,
            "meta_description_too_short",
            format!("Meta description is {} characters, aim for 50-160", len),
        ),
        Some(len) if len > 160 => issues.push(
            Severity::Info,
            "meta_description_too_long",
            format!("Meta description is {} characters, aim for 50-160", len),
        ),
        Some(_) => {}
    }

    match snapshot.h1.len() {
        0 => issues.push(Severity::Warning, "missing_h1", "Page has no <h1>".into()),
        1 => {}
        n => issues.push(
            Severity::Info,
            "multiple_h1",
            format!("Page has {} <h1> elements", n),
        ),
    }

    if snapshot.images_missing_alt > 0 {
        issues.push(
            Severity::Warning,
            "images_missing_alt",
            format!(
                "{} of {} images lack alt text",
                snapshot.images_missing_alt, snapshot.image_count
            ),
        );
    }

    if snapshot.lang.is_none() {
        issues.push(
            Severity::Warning,
            "missing_lang",
            "The <html> element has no lang attribute".into(),
        );
    }

    if snapshot.canonical.is_none() {
        issues.push(Severity::Info, "missing_canonical", "No canonical link".into());
    }

    if snapshot.json_ld_blocks == 0 {
        issues.push(
            Severity::Info,
            "no_structured_data",
            "No JSON-LD structured data".into(),
        );
    }

    if !snapshot.has_og_title || !snapshot.has_og_description {
        issues.push(
            Severity::Info,
            "incomplete_open_graph",
            "Open Graph title or description is missing".into(),
        );
    }

    if snapshot.word_count < THIN_CONTENT_WORDS {
        issues.push(
            Severity::Warning,
            "thin_content",
            format!(
                "Only {} words of visible text, aim for at least {}",
                snapshot.word_count, THIN_CONTENT_WORDS
            ),
        );
    }

    if readability.words > 0 && readability.score < 30 {
        issues.push(
            Severity::Info,
            "hard_to_read",
            format!("Readability score is {} of 100", readability.score),
        );
    }

    let noindex = snapshot
        .meta_robots
        .as_deref()
        .map_or(false, |robots| robots.to_lowercase().contains("noindex"));
    if noindex {
        issues.push(
            Severity::Critical,
            "noindex",
            "Robots meta tag blocks indexing".into(),
        );
    }

    let penalty: u32 = issues.0.iter().map(|i| i.severity.penalty()).sum();
    HeuristicResult {
        score: 100u32.saturating_sub(penalty) as u8,
        issues: issues.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::Language;
    use crate::seo::readability::readability;

    fn good_snapshot() -> PageSnapshot {
        PageSnapshot {
            title: Some("Konsult AB | Digitala tjänster i Stockholm".into()),
            meta_description: Some(
                "Vi hjälper företag att bygga hållbara digitala produkter med moderna verktyg."
                    .into(),
            ),
            meta_robots: Some("index, follow".into()),
            canonical: Some("https://konsult.example/".into()),
            lang: Some("sv".into()),
            has_og_title: true,
            has_og_description: true,
            h1: vec!["Välkommen".into()],
            h2: vec![],
            h3: vec![],
            image_count: 2,
            images_missing_alt: 0,
            internal_links: 4,
            external_links: 1,
            json_ld_blocks: 1,
            word_count: 800,
        }
    }

    fn easy_text() -> Readability {
        readability("Vi bor i en by. Den är liten.", Language::Sv)
    }

    #[test]
    fn test_clean_page_scores_full() {
        let result = evaluate(&good_snapshot(), &easy_text());
        assert!(result.issues.is_empty(), "{:?}", result.issues);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_problems_are_reported_and_penalized() {
        let mut snapshot = good_snapshot();
        snapshot.title = None;
        snapshot.meta_robots = Some("NOINDEX, nofollow".into());
        snapshot.images_missing_alt = 1;
        snapshot.h1 = vec!["A".into(), "B".into()];
        snapshot.word_count = 120;

        let result = evaluate(&snapshot, &easy_text());

        for code in ["missing_title", "noindex", "images_missing_alt", "multiple_h1", "thin_content"] {
            assert!(result.has(code), "missing issue {}", code);
        }
        // 2 critical, 2 warnings, 1 info
        assert_eq!(result.score, 100 - 40 - 16 - 3);
    }

    #[test]
    fn test_empty_page_bottoms_out() {
        let result = evaluate(&PageSnapshot::default(), &readability("", Language::En));
        assert!(result.has("missing_lang"));
        assert!(result.has("missing_h1"));
        assert!(!result.has("hard_to_read"));
        assert!(result.score < 50);
    }
}
