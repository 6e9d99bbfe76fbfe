// src/seo/extract.rs
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::text::strip_html;

/// Structural facts about a page that the heuristics and the model look at
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageSnapshot {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_robots: Option<String>,
    pub canonical: Option<String>,
    pub lang: Option<String>,
    pub has_og_title: bool,
    pub has_og_description: bool,
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
    pub image_count: usize,
    pub images_missing_alt: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub json_ld_blocks: usize,
    pub word_count: usize,
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

fn select<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    select(document, selector)
        .into_iter()
        .filter_map(|el| el.value().attr(attr).map(clean_text))
        .find(|value| !value.is_empty())
}

fn texts(document: &Html, selector: &str) -> Vec<String> {
    select(document, selector)
        .iter()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

enum LinkKind {
    Internal,
    External,
    Ignored,
}

fn classify_link(href: &str, base: Option<&Url>) -> LinkKind {
    let href = href.trim();
    let lower = href.to_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || ["mailto:", "tel:", "javascript:", "data:"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
    {
        return LinkKind::Ignored;
    }

    match base {
        Some(base) => match base.join(href) {
            Ok(target) if target.host_str() == base.host_str() => LinkKind::Internal,
            Ok(_) => LinkKind::External,
            Err(_) => LinkKind::Ignored,
        },
        None if lower.starts_with("http://") || lower.starts_with("https://") => LinkKind::External,
        None => LinkKind::Internal,
    }
}

pub fn extract(html: &str, page_url: &str) -> PageSnapshot {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let title = select(&document, "title")
        .first()
        .map(element_text)
        .filter(|t| !t.is_empty());

    let images = select(&document, "img");
    let images_missing_alt = images
        .iter()
        .filter(|img| {
            img.value()
                .attr("alt")
                .map_or(true, |alt| alt.trim().is_empty())
        })
        .count();

    let mut internal_links = 0;
    let mut external_links = 0;
    for link in select(&document, "a[href]") {
        match classify_link(link.value().attr("href").unwrap_or_default(), base.as_ref()) {
            LinkKind::Internal => internal_links += 1,
            LinkKind::External => external_links += 1,
            LinkKind::Ignored => {}
        }
    }

    let word_count = strip_html(html)
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphabetic))
        .count();

    PageSnapshot {
        title,
        meta_description: first_attr(&document, r#"meta[name="description"]"#, "content"),
        meta_robots: first_attr(&document, r#"meta[name="robots"]"#, "content"),
        canonical: first_attr(&document, r#"link[rel="canonical"]"#, "href"),
        lang: first_attr(&document, "html[lang]", "lang"),
        has_og_title: first_attr(&document, r#"meta[property="og:title"]"#, "content").is_some(),
        has_og_description: first_attr(
            &document,
            r#"meta[property="og:description"]"#,
            "content",
        )
        .is_some(),
        h1: texts(&document, "h1"),
        h2: texts(&document, "h2"),
        h3: texts(&document, "h3"),
        image_count: images.len(),
        images_missing_alt,
        internal_links,
        external_links,
        json_ld_blocks: select(&document, r#"script[type="application/ld+json"]"#).len(),
        word_count,
    }
}
