// src/web/handlers/resume_handlers.rs
use crate::auth::Authorized;
use crate::resume::{BlockEdit, Language, NewResume, Resume, ResumeMetaUpdate, ResumeSummary};
use crate::resume::service::{EditResponse, EditorView};
use crate::web::types::*;
use crate::web::AppState;

use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

pub async fn list_resumes_handler(
    lang: Option<String>,
    _auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Vec<ResumeSummary>>> {
    let resumes = state
        .resumes
        .list_all(Language::parse(lang.as_deref()))
        .await
        .map_err(|e| ApiError::from_anyhow(e, "list resumes"))?;

    Ok(Json(DataResponse::success(
        format!("{} resumes", resumes.len()),
        resumes,
        None,
    )))
}

pub async fn create_resume_handler(
    request: Json<StandardRequest<NewResume>>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Resume>> {
    let conversation_id = request.conversation_id();
    let new_resume = request.into_inner().data;

    let resume = state
        .resumes
        .create(new_resume)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "create resume").with_conversation_id(conversation_id.clone()))?;

    info!("Resume {} ({}) created by {}", resume.slug, resume.id, auth.user().email);

    Ok(Json(DataResponse::success(
        format!("Resume created for {}", resume.person_name),
        resume,
        conversation_id,
    )))
}

pub async fn get_resume_handler(
    id: &str,
    lang: Option<String>,
    _auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<EditorView>> {
    let view = state
        .resumes
        .get_editor(id, Language::parse(lang.as_deref()))
        .await
        .map_err(|e| ApiError::from_anyhow(e, "load resume"))?;

    Ok(Json(DataResponse::success(
        view.source.person_name.clone(),
        view,
        None,
    )))
}

pub async fn update_resume_handler(
    id: &str,
    request: Json<StandardRequest<ResumeMetaUpdate>>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Resume>> {
    let conversation_id = request.conversation_id();
    let update = request.into_inner().data;

    let resume = state
        .resumes
        .update_meta(id, update)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "update resume").with_conversation_id(conversation_id.clone()))?;

    info!("Resume {} updated by {}", resume.id, auth.user().email);

    Ok(Json(DataResponse::success(
        "Resume updated".to_string(),
        resume,
        conversation_id,
    )))
}

pub async fn delete_resume_handler(
    id: &str,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    state
        .resumes
        .delete(id)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "delete resume"))?;

    info!("Resume {} deleted by {}", id, auth.user().email);

    Ok(Json(ActionResponse::success(
        format!("Resume {} deleted", id),
        "deleted".to_string(),
        None,
    )))
}

pub async fn replace_blocks_handler(
    id: &str,
    request: Json<StandardRequest<ReplaceBlocksRequest>>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Resume>> {
    let conversation_id = request.conversation_id();
    let blocks = request.into_inner().data.blocks;
    let count = blocks.len();

    let resume = state
        .resumes
        .replace_blocks(id, blocks)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "save blocks").with_conversation_id(conversation_id.clone()))?;

    info!("{} blocks saved on resume {} by {}", count, id, auth.user().email);

    Ok(Json(DataResponse::success(
        format!("{} blocks saved", count),
        resume,
        conversation_id,
    )))
}

pub async fn edit_resume_handler(
    id: &str,
    request: Json<StandardRequest<BlockEdit>>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<EditResponse>> {
    let conversation_id = request.conversation_id();
    let edit = request.into_inner().data;

    let response = state
        .resumes
        .edit(id, edit)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "edit resume").with_conversation_id(conversation_id.clone()))?;

    let message = if response.outcome.changed {
        "Resume updated"
    } else {
        "Nothing to change"
    };
    info!("Resume {} edited by {} (changed: {})", id, auth.user().email, response.outcome.changed);

    Ok(Json(DataResponse::success(
        message.to_string(),
        response,
        conversation_id,
    )))
}
