// src/web/handlers/system_handlers.rs
use crate::auth::{AuthenticatedUser, Authorized, OptionalAuth};
use crate::core::Database;
use crate::web::types::*;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

pub async fn health_handler(
    auth: OptionalAuth,
    db: &State<Database>,
) -> Result<Json<DataResponse<HealthStatus>>, ApiError> {
    if let Some(user) = &auth.user {
        info!("Health check by authenticated user: {} ({})", user.email, user.role);
    } else {
        info!("Health check by anonymous user");
    }

    match db.health_check().await {
        Ok(()) => Ok(Json(DataResponse::success(
            "OK".to_string(),
            HealthStatus {
                status: "ok".to_string(),
                database: "ok".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            None,
        ))),
        Err(e) => {
            error!("Health check failed: {}", e);
            Err(ApiError::new(
                Status::ServiceUnavailable,
                "Database unavailable",
                "DATABASE_ERROR",
                vec!["Try again in a few moments".to_string()],
            ))
        }
    }
}

pub async fn get_current_user_handler(auth: Authorized) -> Json<DataResponse<AuthenticatedUser>> {
    let user = auth.0;
    Json(DataResponse::success(
        format!("Signed in as {} ({})", user.email, user.role),
        user,
        None,
    ))
}
