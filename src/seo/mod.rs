// src/seo/mod.rs
//! SEO and AI-readability auditing of public web pages

pub mod analyzer;
pub mod extract;
pub mod fetcher;
pub mod heuristics;
pub mod readability;
pub mod reports;
pub mod text;

pub use analyzer::{parse_ai_assessment, AiAssessment, SeoAnalyzer, SeoReport};
pub use extract::{extract, PageSnapshot};
pub use fetcher::{FetchedPage, PageFetcher, MAX_PAGE_BYTES};
pub use heuristics::{evaluate, HeuristicResult, SeoIssue, Severity};
pub use readability::{readability, Readability};
pub use reports::{SeoReportRepository, SeoReportSummary, StoredSeoReport};
pub use text::strip_html;
