// src/web/handlers/seo_handlers.rs
use crate::auth::Authorized;
use crate::core::Database;
use crate::seo::{SeoReport, SeoReportRepository, SeoReportSummary, StoredSeoReport};
use crate::types::DomainError;
use crate::web::types::*;
use crate::web::AppState;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::serde::Serialize;
use rocket::State;
use tracing::{info, warn};

const DEFAULT_REPORT_LIMIT: i64 = 50;

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AnalyzeResult {
    pub id: String,
    pub report: SeoReport,
}

pub async fn analyze_handler(
    request: Json<StandardRequest<AnalyzeRequest>>,
    auth: Authorized,
    state: &State<AppState>,
    db: &State<Database>,
) -> ApiResult<DataResponse<AnalyzeResult>> {
    let conversation_id = request.conversation_id();
    let url = request.into_inner().data.url;

    info!("SEO analysis of {} requested by {}", url, auth.user().email);

    let report = match state.seo.analyze(&url).await {
        Ok(report) => report,
        Err(e) if e.downcast_ref::<DomainError>().is_some() => {
            return Err(ApiError::from_anyhow(e, "analyze page").with_conversation_id(conversation_id));
        }
        Err(e) => {
            warn!("Could not fetch {}: {:#}", url, e);
            return Err(ApiError::new(
                Status::BadGateway,
                format!("Could not fetch {}: {:#}", url, e),
                "FETCH_ERROR",
                vec![
                    "Check that the page is publicly reachable".to_string(),
                    "Try again in a few moments".to_string(),
                ],
            )
            .with_conversation_id(conversation_id));
        }
    };

    let summary = SeoReportRepository::new(db.pool())
        .save(&report)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "store SEO report"))?;

    let message = match &report.ai {
        Some(ai) => format!(
            "Heuristic score {}, AI readability {}",
            report.heuristics.score, ai.ai_readability_score
        ),
        None => format!("Heuristic score {}", report.heuristics.score),
    };

    Ok(Json(DataResponse::success(
        message,
        AnalyzeResult {
            id: summary.id,
            report,
        },
        conversation_id,
    )))
}

pub async fn list_reports_handler(
    limit: Option<i64>,
    _auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<SeoReportSummary>>> {
    let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_REPORT_LIMIT);
    let reports = SeoReportRepository::new(db.pool())
        .list(limit)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "list SEO reports"))?;

    Ok(Json(DataResponse::success(
        format!("{} reports", reports.len()),
        reports,
        None,
    )))
}

pub async fn get_report_handler(
    id: &str,
    _auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<StoredSeoReport>> {
    match SeoReportRepository::new(db.pool()).get(id).await {
        Ok(Some(report)) => Ok(Json(DataResponse::success(
            format!("SEO report {}", report.id),
            report,
            None,
        ))),
        Ok(None) => Err(ApiError::not_found(&format!("SEO report '{}'", id))),
        Err(e) => Err(ApiError::from_anyhow(e, "load SEO report")),
    }
}
