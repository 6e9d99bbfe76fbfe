// src/web/handlers/cms_handlers.rs
use crate::auth::Authorized;
use crate::cms::{Article, ArticleInput, ArticleRepository, Case, CaseInput, CaseRepository};
use crate::core::{Bucket, Database, Storage, StoredObject, PUBLIC_PREFIX};
use crate::web::types::*;
use crate::web::AppState;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info, warn};

pub async fn list_articles_handler(
    _auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<Article>>> {
    let articles = ArticleRepository::new(db.pool())
        .list_all()
        .await
        .map_err(|e| ApiError::from_anyhow(e, "list articles"))?;

    Ok(Json(DataResponse::success(
        format!("{} articles", articles.len()),
        articles,
        None,
    )))
}

pub async fn create_article_handler(
    request: Json<StandardRequest<ArticleInput>>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Article>> {
    let conversation_id = request.conversation_id();
    let input = request.into_inner().data;

    let article = ArticleRepository::new(db.pool())
        .insert(input, Some(auth.user().user_id.as_str()))
        .await
        .map_err(|e| ApiError::from_anyhow(e, "create article").with_conversation_id(conversation_id.clone()))?;

    info!("Article '{}' created by {}", article.slug, auth.user().email);

    Ok(Json(DataResponse::success(
        format!("Article '{}' created", article.title),
        article,
        conversation_id,
    )))
}

pub async fn update_article_handler(
    id: &str,
    request: Json<StandardRequest<ArticleInput>>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Article>> {
    let conversation_id = request.conversation_id();
    let input = request.into_inner().data;

    let article = ArticleRepository::new(db.pool())
        .update(id, input)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "update article").with_conversation_id(conversation_id.clone()))?;

    info!("Article '{}' updated by {}", article.slug, auth.user().email);

    Ok(Json(DataResponse::success(
        format!("Article '{}' updated", article.title),
        article,
        conversation_id,
    )))
}

pub async fn delete_article_handler(
    id: &str,
    auth: Authorized,
    db: &State<Database>,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    let repo = ArticleRepository::new(db.pool());
    let existing = repo
        .get(id)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "load article"))?
        .ok_or_else(|| ApiError::not_found(&format!("Article '{}'", id)))?;

    let deleted = repo
        .delete(id)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "delete article"))?;

    if !deleted {
        return Err(ApiError::not_found(&format!("Article '{}'", id)));
    }

    remove_stored_cover(&state.storage, existing.cover_image_url.as_deref()).await;

    info!("Article {} deleted by {}", id, auth.user().email);
    Ok(Json(ActionResponse::success(
        "Article deleted".to_string(),
        "deleted".to_string(),
        None,
    )))
}

pub async fn list_cases_handler(
    _auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<Case>>> {
    let cases = CaseRepository::new(db.pool())
        .list_all()
        .await
        .map_err(|e| ApiError::from_anyhow(e, "list cases"))?;

    Ok(Json(DataResponse::success(
        format!("{} cases", cases.len()),
        cases,
        None,
    )))
}

pub async fn create_case_handler(
    request: Json<StandardRequest<CaseInput>>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Case>> {
    let conversation_id = request.conversation_id();
    let input = request.into_inner().data;

    let case = CaseRepository::new(db.pool())
        .insert(input)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "create case").with_conversation_id(conversation_id.clone()))?;

    info!("Case '{}' created by {}", case.slug, auth.user().email);

    Ok(Json(DataResponse::success(
        format!("Case '{}' created", case.title),
        case,
        conversation_id,
    )))
}

pub async fn update_case_handler(
    id: &str,
    request: Json<StandardRequest<CaseInput>>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Case>> {
    let conversation_id = request.conversation_id();
    let input = request.into_inner().data;

    let case = CaseRepository::new(db.pool())
        .update(id, input)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "update case").with_conversation_id(conversation_id.clone()))?;

    info!("Case '{}' updated by {}", case.slug, auth.user().email);

    Ok(Json(DataResponse::success(
        format!("Case '{}' updated", case.title),
        case,
        conversation_id,
    )))
}

pub async fn delete_case_handler(
    id: &str,
    auth: Authorized,
    db: &State<Database>,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    let repo = CaseRepository::new(db.pool());
    let existing = repo
        .get(id)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "load case"))?
        .ok_or_else(|| ApiError::not_found(&format!("Case '{}'", id)))?;

    let deleted = repo
        .delete(id)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "delete case"))?;

    if !deleted {
        return Err(ApiError::not_found(&format!("Case '{}'", id)));
    }

    remove_stored_cover(&state.storage, existing.cover_image_url.as_deref()).await;

    info!("Case {} deleted by {}", id, auth.user().email);
    Ok(Json(ActionResponse::success(
        "Case deleted".to_string(),
        "deleted".to_string(),
        None,
    )))
}

/// Drops an uploaded cover once its owner is gone. External URLs are left alone.
async fn remove_stored_cover(storage: &Storage, url: Option<&str>) {
    let Some(url) = url.filter(|u| u.starts_with(PUBLIC_PREFIX)) else {
        return;
    };

    match storage.delete(url).await {
        Ok(true) => info!("Removed stored cover {}", url),
        Ok(false) => {}
        Err(e) => warn!("Could not remove stored cover {}: {}", url, e),
    }
}

/// Name used to pick the stored extension: the client's file name, else the content type
fn upload_name(file: &TempFile<'_>) -> Option<String> {
    if let Some(raw) = file.raw_name() {
        let raw = raw.dangerous_unsafe_unsanitized_raw().as_str();
        if crate::utils::get_file_extension(raw).is_some() {
            return Some(raw.to_string());
        }
    }

    file.content_type()
        .and_then(|ct| ct.extension())
        .map(|ext| format!("upload.{}", ext))
}

pub async fn upload_image_handler(
    mut upload: Form<UploadForm<'_>>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<StoredObject>> {
    let bucket = Bucket::parse(&upload.bucket).ok_or_else(|| {
        ApiError::new(
            Status::UnprocessableEntity,
            format!("Unknown bucket '{}'", upload.bucket),
            "INVALID_BUCKET",
            vec!["Use one of: articles, cases, resumes".to_string()],
        )
    })?;

    let is_image = upload
        .file
        .content_type()
        .map_or(false, |ct| ct.top() == "image" && ct.sub() != "svg+xml");
    let name = match upload_name(&upload.file) {
        Some(name) if is_image => name,
        _ => {
            warn!("Rejected upload from {}: not an image", auth.user().email);
            return Err(ApiError::new(
                Status::UnprocessableEntity,
                "Invalid file type",
                "INVALID_FILE_TYPE",
                vec![
                    "Please upload an image file".to_string(),
                    "Supported formats: PNG, JPEG, WEBP, GIF".to_string(),
                ],
            ));
        }
    };

    let object = state
        .storage
        .allocate(bucket, &name)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "store upload"))?;

    if let Err(e) = upload.file.move_copy_to(&object.path).await {
        error!("Failed to persist upload {}: {}", object.key, e);
        return Err(ApiError::new(
            Status::InternalServerError,
            "Failed to store the uploaded file",
            "UPLOAD_ERROR",
            vec!["Try again with a different image".to_string()],
        ));
    }

    info!("Upload {} stored by {}", object.key, auth.user().email);

    Ok(Json(DataResponse::success(
        format!("Stored {}", object.url),
        object,
        None,
    )))
}
