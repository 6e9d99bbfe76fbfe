// src/web/handlers/lead_handlers.rs
use crate::auth::Authorized;
use crate::core::Database;
use crate::leads::{Lead, LeadRepository};
use crate::web::types::*;

use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

pub async fn list_leads_handler(
    handled: Option<bool>,
    _auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<Lead>>> {
    let leads = LeadRepository::new(db.pool())
        .list(handled)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "list leads"))?;

    Ok(Json(DataResponse::success(
        format!("{} leads", leads.len()),
        leads,
        None,
    )))
}

pub async fn mark_handled_handler(
    id: &str,
    request: Option<Json<MarkHandledRequest>>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Lead>> {
    let handled = request.map_or(true, |r| r.handled);

    let lead = LeadRepository::new(db.pool())
        .mark_handled(id, handled)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "update lead"))?;

    info!("Lead {} marked handled={} by {}", id, handled, auth.user().email);

    Ok(Json(DataResponse::success(
        if handled {
            "Lead marked as handled".to_string()
        } else {
            "Lead reopened".to_string()
        },
        lead,
        None,
    )))
}

pub async fn export_leads_handler(
    handled: Option<bool>,
    auth: Authorized,
    db: &State<Database>,
) -> Result<CsvResponse, ApiError> {
    let data = LeadRepository::new(db.pool())
        .export_csv(handled)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "export leads"))?;

    info!("Leads exported by {}", auth.user().email);

    Ok(CsvResponse {
        data,
        filename: format!("leads-{}.csv", chrono::Utc::now().format("%Y%m%d")),
    })
}
