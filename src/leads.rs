// src/leads.rs
//! Contact form submissions

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::app_log;
use crate::types::DomainError;
use crate::utils::is_valid_email;

pub const MAX_NAME_CHARS: usize = 200;
pub const MAX_MESSAGE_CHARS: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub source: Option<String>,
    pub handled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
    /// Honeypot, left empty by humans
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Stored(Lead),
    Discarded,
}

impl LeadSubmission {
    pub fn is_spam(&self) -> bool {
        self.website
            .as_deref()
            .map_or(false, |value| !value.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let mut problems = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            problems.push("name is required".to_string());
        } else if name.chars().count() > MAX_NAME_CHARS {
            problems.push(format!("name must be at most {} characters", MAX_NAME_CHARS));
        }

        if !is_valid_email(&self.email) {
            problems.push("email is not a valid address".to_string());
        }

        let message = self.message.trim();
        if message.is_empty() {
            problems.push("message is required".to_string());
        } else if message.chars().count() > MAX_MESSAGE_CHARS {
            problems.push(format!(
                "message must be at most {} characters",
                MAX_MESSAGE_CHARS
            ));
        }

        DomainError::check(problems)
    }
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub struct LeadRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LeadRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Spam is accepted without being stored
    pub async fn submit(&self, submission: LeadSubmission) -> Result<SubmitOutcome> {
        if submission.is_spam() {
            app_log!(warn, "Discarded lead submission caught by honeypot");
            return Ok(SubmitOutcome::Discarded);
        }
        submission.validate()?;

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO leads (id, name, email, company, phone, message, source, handled, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(&id)
        .bind(submission.name.trim())
        .bind(submission.email.trim().to_lowercase())
        .bind(clean(&submission.company))
        .bind(clean(&submission.phone))
        .bind(submission.message.trim())
        .bind(clean(&submission.source))
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .context("Failed to store lead")?;

        app_log!(info, "Stored lead {} from {}", id, submission.email.trim());

        let lead = self
            .get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Lead {} missing after insert", id))?;
        Ok(SubmitOutcome::Stored(lead))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Lead>> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            SELECT id, name, email, company, phone, message, source, handled, created_at
            FROM leads WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to load lead")?;

        Ok(lead)
    }

    /// Newest first; `handled` filters when given
    pub async fn list(&self, handled: Option<bool>) -> Result<Vec<Lead>> {
        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT id, name, email, company, phone, message, source, handled, created_at
            FROM leads
            WHERE (? IS NULL OR handled = ?)
            ORDER BY created_at DESC
            "#,
        )
        .bind(handled)
        .bind(handled)
        .fetch_all(self.pool)
        .await
        .context("Failed to list leads")?;

        Ok(leads)
    }

    pub async fn mark_handled(&self, id: &str, handled: bool) -> Result<Lead> {
        let result = sqlx::query("UPDATE leads SET handled = ? WHERE id = ?")
            .bind(handled)
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to update lead")?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("Lead '{}'", id)).into());
        }

        self.get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Lead '{}'", id)).into())
    }

    pub async fn export_csv(&self, handled: Option<bool>) -> Result<String> {
        let leads = self.list(handled).await?;
        leads_to_csv(&leads)
    }
}

pub fn leads_to_csv(leads: &[Lead]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id", "created_at", "name", "email", "company", "phone", "source", "handled", "message",
    ])?;

    for lead in leads {
        let created_at = lead.created_at.to_rfc3339();
        let handled = if lead.handled { "true" } else { "false" };
        writer.write_record([
            lead.id.as_str(),
            created_at.as_str(),
            lead.name.as_str(),
            lead.email.as_str(),
            lead.company.as_deref().unwrap_or(""),
            lead.phone.as_deref().unwrap_or(""),
            lead.source.as_deref().unwrap_or(""),
            handled,
            lead.message.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}
