// src/web/handlers/public_handlers.rs
use crate::cms::{ArticleRepository, CaseRepository, Article, Case};
use crate::core::Database;
use crate::leads::{LeadRepository, LeadSubmission, SubmitOutcome};
use crate::resume::{Language, RenderedResume, ResumeSummary};
use crate::web::types::*;
use crate::web::AppState;

use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

const HOME_ARTICLES: i64 = 3;

pub async fn home_handler(
    lang: Option<String>,
    state: &State<AppState>,
    db: &State<Database>,
) -> ApiResult<DataResponse<HomePage>> {
    let language = Language::parse(lang.as_deref());

    let featured_cases = CaseRepository::new(db.pool())
        .list_featured()
        .await
        .map_err(|e| ApiError::from_anyhow(e, "load featured cases"))?;
    let latest_articles = ArticleRepository::new(db.pool())
        .list_published(Some(HOME_ARTICLES))
        .await
        .map_err(|e| ApiError::from_anyhow(e, "load articles"))?;
    let consultants = state
        .resumes
        .list_public(language)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "load consultants"))?;

    let page = HomePage {
        site_name: state.site.name.clone(),
        tagline: state.site.tagline.resolve(language).to_string(),
        language: language.code().to_string(),
        featured_cases: featured_cases.iter().map(CaseCard::from).collect(),
        latest_articles: latest_articles.iter().map(ArticleCard::from).collect(),
        consultants,
    };

    Ok(Json(DataResponse::success("Home page".to_string(), page, None)))
}

pub async fn about_handler(
    lang: Option<String>,
    state: &State<AppState>,
) -> ApiResult<DataResponse<AboutPage>> {
    let language = Language::parse(lang.as_deref());
    let consultants = state
        .resumes
        .list_public(language)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "load consultants"))?;

    let page = AboutPage {
        site_name: state.site.name.clone(),
        language: language.code().to_string(),
        about: state.site.about.resolve(language).to_string(),
        contact_email: state.site.contact_email.clone(),
        consultants,
    };

    Ok(Json(DataResponse::success("About page".to_string(), page, None)))
}

pub async fn list_articles_handler(
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<ArticleCard>>> {
    let articles = ArticleRepository::new(db.pool())
        .list_published(None)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "list articles"))?;

    Ok(Json(DataResponse::success(
        format!("{} articles", articles.len()),
        articles.iter().map(ArticleCard::from).collect(),
        None,
    )))
}

pub async fn get_article_handler(
    slug: &str,
    db: &State<Database>,
) -> ApiResult<DataResponse<Article>> {
    match ArticleRepository::new(db.pool()).get_published_by_slug(slug).await {
        Ok(Some(article)) => Ok(Json(DataResponse::success(
            article.title.clone(),
            article,
            None,
        ))),
        Ok(None) => Err(ApiError::not_found(&format!("Article '{}'", slug))),
        Err(e) => Err(ApiError::from_anyhow(e, "load article")),
    }
}

pub async fn list_cases_handler(db: &State<Database>) -> ApiResult<DataResponse<Vec<CaseCard>>> {
    let cases = CaseRepository::new(db.pool())
        .list_published(None)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "list cases"))?;

    Ok(Json(DataResponse::success(
        format!("{} cases", cases.len()),
        cases.iter().map(CaseCard::from).collect(),
        None,
    )))
}

pub async fn get_case_handler(slug: &str, db: &State<Database>) -> ApiResult<DataResponse<Case>> {
    match CaseRepository::new(db.pool()).get_published_by_slug(slug).await {
        Ok(Some(case)) => Ok(Json(DataResponse::success(case.title.clone(), case, None))),
        Ok(None) => Err(ApiError::not_found(&format!("Case '{}'", slug))),
        Err(e) => Err(ApiError::from_anyhow(e, "load case")),
    }
}

pub async fn list_resumes_handler(
    lang: Option<String>,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Vec<ResumeSummary>>> {
    let language = Language::parse(lang.as_deref());
    let resumes = state
        .resumes
        .list_public(language)
        .await
        .map_err(|e| ApiError::from_anyhow(e, "list resumes"))?;

    Ok(Json(DataResponse::success(
        format!("{} consultants", resumes.len()),
        resumes,
        None,
    )))
}

pub async fn get_resume_handler(
    slug: &str,
    lang: Option<String>,
    state: &State<AppState>,
) -> ApiResult<DataResponse<RenderedResume>> {
    let language = Language::parse(lang.as_deref());
    match state.resumes.get_public(slug, language).await {
        Ok(Some(resume)) => Ok(Json(DataResponse::success(
            resume.person_name.clone(),
            resume,
            None,
        ))),
        Ok(None) => Err(ApiError::not_found(&format!("Resume '{}'", slug))),
        Err(e) => Err(ApiError::from_anyhow(e, "load resume")),
    }
}

pub async fn submit_lead_handler(
    request: Json<StandardRequest<LeadSubmission>>,
    db: &State<Database>,
) -> ApiResult<ActionResponse> {
    let conversation_id = request.conversation_id();
    let submission = request.into_inner().data;

    match LeadRepository::new(db.pool()).submit(submission).await {
        Ok(outcome) => {
            if let SubmitOutcome::Stored(lead) = &outcome {
                info!("New lead {} from {}", lead.id, lead.email);
            }
            // Spam gets the same answer as a real submission
            Ok(Json(ActionResponse::success(
                "Thank you, we will get back to you shortly".to_string(),
                "lead_received".to_string(),
                conversation_id,
            )))
        }
        Err(e) => Err(ApiError::from_anyhow(e, "submit contact form").with_conversation_id(conversation_id)),
    }
}
