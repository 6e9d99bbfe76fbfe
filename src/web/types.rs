// src/web/types.rs
use rocket::form::FromForm;
use rocket::fs::TempFile;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};

use crate::app_log;
use crate::auth::AuthError;
use crate::cms::{Article, Case};
use crate::resume::{ResumeBlock, ResumeEditError, ResumeSummary};
use crate::types::DomainError;

pub struct CsvResponse {
    pub data: String,
    pub filename: String,
}

impl<'r> Responder<'r, 'static> for CsvResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let bytes = self.data.into_bytes();
        Response::build()
            .header(ContentType::CSV)
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            )
            .sized_body(bytes.len(), std::io::Cursor::new(bytes))
            .ok()
    }
}

#[derive(FromForm)]
pub struct UploadForm<'f> {
    pub bucket: String,
    pub file: TempFile<'f>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ReplaceBlocksRequest {
    pub blocks: Vec<ResumeBlock>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct AnalyzeRequest {
    pub url: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct MarkHandledRequest {
    #[serde(default = "default_true")]
    pub handled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ArticleCard {
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Article> for ArticleCard {
    fn from(article: &Article) -> Self {
        Self {
            slug: article.slug.clone(),
            title: article.title.clone(),
            excerpt: article.excerpt.clone(),
            cover_image_url: article.cover_image_url.clone(),
            published_at: article.published_at,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct CaseCard {
    pub slug: String,
    pub client: String,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub cover_image_url: Option<String>,
    pub featured: bool,
}

impl From<&Case> for CaseCard {
    fn from(case: &Case) -> Self {
        Self {
            slug: case.slug.clone(),
            client: case.client.clone(),
            title: case.title.clone(),
            summary: case.summary.clone(),
            tags: case.tags.clone(),
            cover_image_url: case.cover_image_url.clone(),
            featured: case.featured,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HomePage {
    pub site_name: String,
    pub tagline: String,
    pub language: String,
    pub featured_cases: Vec<CaseCard>,
    pub latest_articles: Vec<ArticleCard>,
    pub consultants: Vec<ResumeSummary>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AboutPage {
    pub site_name: String,
    pub language: String,
    pub about: String,
    pub contact_email: String,
    pub consultants: Vec<ResumeSummary>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
    pub version: String,
}

// STANDARD RESPONSE TYPES

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Data,
    Action,
    Error,
}

// Request types with conversation_id support
#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardRequest<T> {
    #[serde(flatten)]
    pub data: T,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

// Helper trait for extracting conversation_id
pub trait WithConversationId {
    fn conversation_id(&self) -> Option<String>;
}

impl<T> WithConversationId for StandardRequest<T> {
    fn conversation_id(&self) -> Option<String> {
        self.conversation_id.clone()
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
            conversation_id,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
            conversation_id,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(
        error: String,
        error_code: String,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            conversation_id,
        }
    }
}

/// Error envelope together with its HTTP status
pub struct ApiError {
    pub status: Status,
    pub body: StandardErrorResponse,
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        (self.status, Json(self.body)).respond_to(req)
    }
}

impl ApiError {
    pub fn new(status: Status, error: impl Into<String>, error_code: &str, suggestions: Vec<String>) -> Self {
        Self {
            status,
            body: StandardErrorResponse::new(
                error.into(),
                error_code.to_string(),
                suggestions,
                None,
            ),
        }
    }

    pub fn with_conversation_id(mut self, conversation_id: Option<String>) -> Self {
        self.body.conversation_id = conversation_id;
        self
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(
            Status::NotFound,
            format!("{} not found", what),
            "NOT_FOUND",
            vec!["Check the identifier or slug".to_string()],
        )
    }

    /// Map a service error; `action` describes what failed for the log and the fallback message
    pub fn from_anyhow(err: anyhow::Error, action: &str) -> Self {
        if let Some(domain) = err.downcast_ref::<DomainError>() {
            return match domain {
                DomainError::Validation(problems) => Self::new(
                    Status::UnprocessableEntity,
                    format!("Failed to {}: invalid input", action),
                    "VALIDATION_ERROR",
                    problems.clone(),
                ),
                DomainError::NotFound(what) => Self::not_found(what),
                DomainError::Conflict(reason) => Self::new(
                    Status::Conflict,
                    reason.clone(),
                    "CONFLICT",
                    vec!["Choose a different slug".to_string()],
                ),
            };
        }

        if let Some(edit) = err.downcast_ref::<ResumeEditError>() {
            return match edit {
                ResumeEditError::BlockNotFound(_) => Self::new(
                    Status::NotFound,
                    edit.to_string(),
                    "BLOCK_NOT_FOUND",
                    vec!["Reload the resume and try again".to_string()],
                ),
                ResumeEditError::InvalidOrder(_) => Self::new(
                    Status::UnprocessableEntity,
                    edit.to_string(),
                    "INVALID_ORDER",
                    vec!["Send every block id exactly once".to_string()],
                ),
            };
        }

        app_log!(error, "Failed to {}: {:#}", action, err);
        Self::new(
            Status::InternalServerError,
            format!("Failed to {}", action),
            "INTERNAL_ERROR",
            vec![
                "Try again in a few moments".to_string(),
                "Contact support if the problem persists".to_string(),
            ],
        )
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match err {
            AuthError::InactiveProfile | AuthError::NotAuthorized => Status::Forbidden,
            AuthError::DatabaseError | AuthError::NotConfigured => Status::InternalServerError,
            _ => Status::Unauthorized,
        };
        Self::new(status, err.message(), "AUTHORIZATION_ERROR", vec!["Login is required".to_string()])
    }
}
