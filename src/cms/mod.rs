// src/cms/mod.rs
//! News articles and client case studies

pub mod articles;
pub mod cases;

pub use articles::{Article, ArticleInput, ArticleRepository};
pub use cases::{Case, CaseInput, CaseRepository};

use chrono::{DateTime, Utc};

use crate::types::DomainError;
use crate::utils::{is_valid_slug, slugify};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_SUMMARY_CHARS: usize = 500;

/// Non-empty and at most `max` characters
pub(crate) fn check_required(field: &str, value: &str, max: usize, problems: &mut Vec<String>) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        problems.push(format!("{} is required", field));
    } else if trimmed.chars().count() > max {
        problems.push(format!("{} must be at most {} characters", field, max));
    }
}

pub(crate) fn check_optional(
    field: &str,
    value: Option<&str>,
    max: usize,
    problems: &mut Vec<String>,
) {
    if let Some(value) = value {
        if value.trim().chars().count() > max {
            problems.push(format!("{} must be at most {} characters", field, max));
        }
    }
}

/// Explicit slug if given, otherwise derived from the title
pub(crate) fn resolve_slug(slug: Option<&str>, title: &str, problems: &mut Vec<String>) -> String {
    let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => explicit.to_string(),
        None => slugify(title),
    };

    if !is_valid_slug(&slug) {
        problems.push(format!(
            "slug '{}' must contain only lowercase letters, digits and single dashes",
            slug
        ));
    }
    slug
}

/// Publishing stamps the first publication time; unpublishing keeps it
pub(crate) fn next_published_at(
    previous: Option<DateTime<Utc>>,
    published: bool,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match previous {
        Some(at) => Some(at),
        None if published => Some(now),
        None => None,
    }
}

pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Unique violations on the slug column become conflicts
pub(crate) fn map_write_error(err: sqlx::Error, what: &str, slug: &str) -> anyhow::Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return DomainError::Conflict(format!("{} slug '{}' is already used", what, slug)).into();
        }
    }
    anyhow::Error::new(err).context(format!("Failed to write {} '{}'", what.to_lowercase(), slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_check_required() {
        let mut problems = Vec::new();
        check_required("title", "  ", 10, &mut problems);
        check_required("client", "Acme", 10, &mut problems);
        check_required("body", "ååååååååååå", 10, &mut problems);

        assert_eq!(
            problems,
            vec![
                "title is required".to_string(),
                "body must be at most 10 characters".to_string()
            ]
        );
    }

    #[test]
    fn test_resolve_slug() {
        let mut problems = Vec::new();
        assert_eq!(resolve_slug(None, "Ny kund: Åre Kommun", &mut problems), "ny-kund-are-kommun");
        assert_eq!(resolve_slug(Some(" custom-slug "), "x", &mut problems), "custom-slug");
        assert!(problems.is_empty());

        resolve_slug(Some("Bad Slug"), "x", &mut problems);
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_next_published_at() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);

        assert_eq!(next_published_at(None, false, now), None);
        assert_eq!(next_published_at(None, true, now), Some(now));
        assert_eq!(next_published_at(Some(earlier), true, now), Some(earlier));
        assert_eq!(next_published_at(Some(earlier), false, now), Some(earlier));
    }
}
