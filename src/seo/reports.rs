// src/seo/reports.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use super::analyzer::SeoReport;
use crate::app_log;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SeoReportSummary {
    pub id: String,
    pub url: String,
    pub heuristic_score: i64,
    pub ai_score: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredSeoReport {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub report: serde_json::Value,
}

pub struct SeoReportRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SeoReportRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, report: &SeoReport) -> Result<SeoReportSummary> {
        let id = uuid::Uuid::new_v4().to_string();
        let ai_score = report.ai.as_ref().map(|ai| ai.ai_readability_score as i64);

        sqlx::query(
            r#"
            INSERT INTO seo_reports (id, url, heuristic_score, ai_score, report, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&report.url)
        .bind(report.heuristics.score as i64)
        .bind(ai_score)
        .bind(serde_json::to_string(report)?)
        .bind(report.analyzed_at)
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to store SEO report for {}", report.url))?;

        app_log!(info, "Stored SEO report {} for {}", id, report.url);

        Ok(SeoReportSummary {
            id,
            url: report.url.clone(),
            heuristic_score: report.heuristics.score as i64,
            ai_score,
            created_at: report.analyzed_at,
        })
    }

    /// Most recent first
    pub async fn list(&self, limit: i64) -> Result<Vec<SeoReportSummary>> {
        let reports = sqlx::query_as::<_, SeoReportSummary>(
            r#"
            SELECT id, url, heuristic_score, ai_score, created_at
            FROM seo_reports
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .context("Failed to list SEO reports")?;

        Ok(reports)
    }

    pub async fn get(&self, id: &str) -> Result<Option<StoredSeoReport>> {
        let row: Option<(String, String, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, report, created_at FROM seo_reports WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await
                .context("Failed to load SEO report")?;

        row.map(|(id, report, created_at)| {
            Ok(StoredSeoReport {
                report: serde_json::from_str(&report)
                    .with_context(|| format!("Corrupt SEO report {}", id))?,
                id,
                created_at,
            })
        })
        .transpose()
    }
}
