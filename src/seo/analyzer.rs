// src/seo/analyzer.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extract::{extract, PageSnapshot};
use super::fetcher::{FetchedPage, PageFetcher};
use super::heuristics::{evaluate, HeuristicResult};
use super::readability::{page_language, readability, Readability};
use super::text::strip_html;
use crate::app_log;
use crate::core::LlmClient;
use crate::utils::truncate_chars;

const EXCERPT_CHARS: usize = 4000;

const SYSTEM_PROMPT: &str = "You audit web pages for search engines and AI assistants. \
Judge how easily a language model can understand, summarize and cite the page. \
Answer with a single JSON object and nothing else: \
{\"ai_readability_score\": <integer 0-100>, \"summary\": <string>, \"recommendations\": [<string>, ...]}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiAssessment {
    pub ai_readability_score: u8,
    pub summary: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeoReport {
    pub url: String,
    pub final_url: String,
    pub analyzed_at: DateTime<Utc>,
    pub truncated: bool,
    pub snapshot: PageSnapshot,
    pub readability: Readability,
    pub heuristics: HeuristicResult,
    pub ai: Option<AiAssessment>,
    pub ai_error: Option<String>,
    pub model: Option<String>,
}

#[derive(Deserialize)]
struct RawAssessment {
    ai_readability_score: serde_json::Value,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Accepts the JSON object wrapped in code fences or surrounded by prose
pub fn parse_ai_assessment(answer: &str) -> Result<AiAssessment> {
    let start = answer
        .find('{')
        .ok_or_else(|| anyhow::anyhow!("Model answer contains no JSON object"))?;
    let end = answer
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| anyhow::anyhow!("Model answer contains no complete JSON object"))?;

    let raw: RawAssessment = serde_json::from_str(&answer[start..=end])
        .context("Model answer is not the expected JSON shape")?;

    let score = match &raw.ai_readability_score {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| anyhow::anyhow!("ai_readability_score is not a number"))?;

    Ok(AiAssessment {
        ai_readability_score: score.clamp(0.0, 100.0).round() as u8,
        summary: raw.summary.trim().to_string(),
        recommendations: raw
            .recommendations
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect(),
    })
}

pub struct SeoAnalyzer {
    fetcher: PageFetcher,
    llm: Option<LlmClient>,
}

impl SeoAnalyzer {
    pub fn new(fetcher: PageFetcher, llm: Option<LlmClient>) -> Self {
        Self { fetcher, llm }
    }

    /// Heuristic report plus the page text used for the model prompt
    pub fn inspect(page: &FetchedPage) -> (SeoReport, String) {
        let snapshot = extract(&page.html, &page.final_url);
        let text = strip_html(&page.html);
        let readability = readability(&text, page_language(snapshot.lang.as_deref()));
        let heuristics = evaluate(&snapshot, &readability);

        let report = SeoReport {
            url: page.requested_url.clone(),
            final_url: page.final_url.clone(),
            analyzed_at: Utc::now(),
            truncated: page.truncated,
            snapshot,
            readability,
            heuristics,
            ai: None,
            ai_error: None,
            model: None,
        };
        (report, text)
    }

    fn build_prompt(report: &SeoReport, text: &str) -> Result<String> {
        let snapshot = serde_json::json!({
            "url": report.final_url,
            "structure": report.snapshot,
            "readability": report.readability,
            "heuristic_score": report.heuristics.score,
            "issues": report.heuristics.issues,
        });

        Ok(format!(
            "Page snapshot:\n{}\n\nVisible text (excerpt):\n{}",
            serde_json::to_string_pretty(&snapshot)?,
            truncate_chars(text, EXCERPT_CHARS)
        ))
    }

    async fn assess(&self, llm: &LlmClient, report: &SeoReport, text: &str) -> Result<AiAssessment> {
        let prompt = Self::build_prompt(report, text)?;
        let answer = llm.complete(SYSTEM_PROMPT, &prompt).await?;
        parse_ai_assessment(&answer)
    }

    /// Model failures are recorded on the report, not returned
    pub async fn analyze(&self, url: &str) -> Result<SeoReport> {
        let page = self.fetcher.fetch(url).await?;
        let (mut report, text) = Self::inspect(&page);

        app_log!(
            info,
            "Heuristic score for {}: {} ({} issues)",
            report.final_url,
            report.heuristics.score,
            report.heuristics.issues.len()
        );

        match &self.llm {
            Some(llm) => {
                report.model = Some(llm.model().to_string());
                match self.assess(llm, &report, &text).await {
                    Ok(assessment) => report.ai = Some(assessment),
                    Err(e) => {
                        app_log!(warn, "AI assessment failed for {}: {:#}", report.final_url, e);
                        report.ai_error = Some(format!("{:#}", e));
                    }
                }
            }
            None => {
                report.ai_error = Some("No language model configured".to_string());
            }
        }

        Ok(report)
    }
}
