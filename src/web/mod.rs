// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use crate::auth::{request_auth_error, AuthConfig, AuthenticatedUser, Authorized, OptionalAuth};
use crate::cms::{Article, ArticleInput, Case, CaseInput};
use crate::config::{ConfigManager, ResumeBackend, SiteConfig};
use crate::core::{Database, LlmClient, Storage, StoredObject, PUBLIC_PREFIX};
use crate::leads::{Lead, LeadSubmission};
use crate::resume::service::{EditResponse, EditorView};
use crate::resume::{
    BlockEdit, MockResumeStore, NewResume, RenderedResume, Resume, ResumeMetaUpdate,
    ResumeService, ResumeStore, ResumeSummary, SqliteResumeStore,
};
use crate::seo::{PageFetcher, SeoAnalyzer, SeoReportSummary, StoredSeoReport};
use anyhow::Result;
use handlers::AnalyzeResult;
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::form::Form;
use rocket::fs::{FileServer, Options};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{
    catchers, delete, get, options, post, put, routes, Build, Request, Response, Rocket, State,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const PAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Services shared by every route
pub struct AppState {
    pub site: SiteConfig,
    pub storage: Storage,
    pub resumes: ResumeService,
    pub seo: SeoAnalyzer,
}

impl AppState {
    pub fn from_config(config: &ConfigManager, database: &Database) -> Result<Self> {
        let store: Arc<dyn ResumeStore> = match config.resume_backend {
            ResumeBackend::Sqlite => Arc::new(SqliteResumeStore::new(database.pool().clone())),
            ResumeBackend::Mock => Arc::new(MockResumeStore::seeded()?),
        };

        let llm = LlmClient::from_settings(&config.llm)?;
        if llm.is_none() {
            info!("No LLM_API_KEY set, SEO reports will skip the AI assessment");
        }

        Ok(Self {
            site: config.site.clone(),
            storage: Storage::new(config.environment.storage_path.clone()),
            resumes: ResumeService::new(store),
            seo: SeoAnalyzer::new(PageFetcher::new(PAGE_FETCH_TIMEOUT)?, llm),
        })
    }
}

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, PATCH, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// Public routes

#[get("/health")]
pub async fn health(
    auth: OptionalAuth,
    db: &State<Database>,
) -> ApiResult<DataResponse<HealthStatus>> {
    handlers::system_handlers::health_handler(auth, db).await
}

#[get("/home?<lang>")]
pub async fn home(
    lang: Option<String>,
    state: &State<AppState>,
    db: &State<Database>,
) -> ApiResult<DataResponse<HomePage>> {
    handlers::public_handlers::home_handler(lang, state, db).await
}

#[get("/about?<lang>")]
pub async fn about(lang: Option<String>, state: &State<AppState>) -> ApiResult<DataResponse<AboutPage>> {
    handlers::public_handlers::about_handler(lang, state).await
}

#[get("/articles")]
pub async fn public_articles(db: &State<Database>) -> ApiResult<DataResponse<Vec<ArticleCard>>> {
    handlers::public_handlers::list_articles_handler(db).await
}

#[get("/articles/<slug>")]
pub async fn public_article(slug: &str, db: &State<Database>) -> ApiResult<DataResponse<Article>> {
    handlers::public_handlers::get_article_handler(slug, db).await
}

#[get("/cases")]
pub async fn public_cases(db: &State<Database>) -> ApiResult<DataResponse<Vec<CaseCard>>> {
    handlers::public_handlers::list_cases_handler(db).await
}

#[get("/cases/<slug>")]
pub async fn public_case(slug: &str, db: &State<Database>) -> ApiResult<DataResponse<Case>> {
    handlers::public_handlers::get_case_handler(slug, db).await
}

#[get("/resumes?<lang>")]
pub async fn public_resumes(
    lang: Option<String>,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Vec<ResumeSummary>>> {
    handlers::public_handlers::list_resumes_handler(lang, state).await
}

#[get("/resumes/<slug>?<lang>")]
pub async fn public_resume(
    slug: &str,
    lang: Option<String>,
    state: &State<AppState>,
) -> ApiResult<DataResponse<RenderedResume>> {
    handlers::public_handlers::get_resume_handler(slug, lang, state).await
}

#[post("/leads", data = "<request>")]
pub async fn submit_lead(
    request: Json<StandardRequest<LeadSubmission>>,
    db: &State<Database>,
) -> ApiResult<ActionResponse> {
    handlers::public_handlers::submit_lead_handler(request, db).await
}

// Internal routes (employees)

#[get("/internal/me")]
pub async fn get_current_user(auth: Authorized) -> Json<DataResponse<AuthenticatedUser>> {
    handlers::system_handlers::get_current_user_handler(auth).await
}

#[get("/internal/resumes?<lang>")]
pub async fn internal_resumes(
    lang: Option<String>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Vec<ResumeSummary>>> {
    handlers::resume_handlers::list_resumes_handler(lang, auth, state).await
}

#[post("/internal/resumes", data = "<request>")]
pub async fn create_resume(
    request: Json<StandardRequest<NewResume>>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Resume>> {
    handlers::resume_handlers::create_resume_handler(request, auth, state).await
}

#[get("/internal/resumes/<id>?<lang>")]
pub async fn internal_resume(
    id: &str,
    lang: Option<String>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<EditorView>> {
    handlers::resume_handlers::get_resume_handler(id, lang, auth, state).await
}

#[put("/internal/resumes/<id>", data = "<request>")]
pub async fn update_resume(
    id: &str,
    request: Json<StandardRequest<ResumeMetaUpdate>>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Resume>> {
    handlers::resume_handlers::update_resume_handler(id, request, auth, state).await
}

#[delete("/internal/resumes/<id>")]
pub async fn delete_resume(
    id: &str,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    handlers::resume_handlers::delete_resume_handler(id, auth, state).await
}

#[put("/internal/resumes/<id>/blocks", data = "<request>")]
pub async fn replace_blocks(
    id: &str,
    request: Json<StandardRequest<ReplaceBlocksRequest>>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Resume>> {
    handlers::resume_handlers::replace_blocks_handler(id, request, auth, state).await
}

#[post("/internal/resumes/<id>/edit", data = "<request>")]
pub async fn edit_resume(
    id: &str,
    request: Json<StandardRequest<BlockEdit>>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<EditResponse>> {
    handlers::resume_handlers::edit_resume_handler(id, request, auth, state).await
}

// Admin routes

#[get("/admin/articles")]
pub async fn admin_articles(auth: Authorized, db: &State<Database>) -> ApiResult<DataResponse<Vec<Article>>> {
    handlers::cms_handlers::list_articles_handler(auth, db).await
}

#[post("/admin/articles", data = "<request>")]
pub async fn create_article(
    request: Json<StandardRequest<ArticleInput>>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Article>> {
    handlers::cms_handlers::create_article_handler(request, auth, db).await
}

#[put("/admin/articles/<id>", data = "<request>")]
pub async fn update_article(
    id: &str,
    request: Json<StandardRequest<ArticleInput>>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Article>> {
    handlers::cms_handlers::update_article_handler(id, request, auth, db).await
}

#[delete("/admin/articles/<id>")]
pub async fn delete_article(
    id: &str,
    auth: Authorized,
    db: &State<Database>,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    handlers::cms_handlers::delete_article_handler(id, auth, db, state).await
}

#[get("/admin/cases")]
pub async fn admin_cases(auth: Authorized, db: &State<Database>) -> ApiResult<DataResponse<Vec<Case>>> {
    handlers::cms_handlers::list_cases_handler(auth, db).await
}

#[post("/admin/cases", data = "<request>")]
pub async fn create_case(
    request: Json<StandardRequest<CaseInput>>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Case>> {
    handlers::cms_handlers::create_case_handler(request, auth, db).await
}

#[put("/admin/cases/<id>", data = "<request>")]
pub async fn update_case(
    id: &str,
    request: Json<StandardRequest<CaseInput>>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Case>> {
    handlers::cms_handlers::update_case_handler(id, request, auth, db).await
}

#[delete("/admin/cases/<id>")]
pub async fn delete_case(
    id: &str,
    auth: Authorized,
    db: &State<Database>,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    handlers::cms_handlers::delete_case_handler(id, auth, db, state).await
}

#[post("/admin/uploads", data = "<upload>")]
pub async fn upload_image(
    upload: Form<UploadForm<'_>>,
    auth: Authorized,
    state: &State<AppState>,
) -> ApiResult<DataResponse<StoredObject>> {
    handlers::cms_handlers::upload_image_handler(upload, auth, state).await
}

#[get("/admin/leads?<handled>")]
pub async fn list_leads(
    handled: Option<bool>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<Lead>>> {
    handlers::lead_handlers::list_leads_handler(handled, auth, db).await
}

#[post("/admin/leads/<id>/handled", data = "<request>")]
pub async fn mark_lead_handled(
    id: &str,
    request: Option<Json<MarkHandledRequest>>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Lead>> {
    handlers::lead_handlers::mark_handled_handler(id, request, auth, db).await
}

#[get("/admin/leads/export?<handled>")]
pub async fn export_leads(
    handled: Option<bool>,
    auth: Authorized,
    db: &State<Database>,
) -> Result<CsvResponse, ApiError> {
    handlers::lead_handlers::export_leads_handler(handled, auth, db).await
}

#[post("/admin/seo/analyze", data = "<request>")]
pub async fn analyze_page(
    request: Json<StandardRequest<AnalyzeRequest>>,
    auth: Authorized,
    state: &State<AppState>,
    db: &State<Database>,
) -> ApiResult<DataResponse<AnalyzeResult>> {
    handlers::seo_handlers::analyze_handler(request, auth, state, db).await
}

#[get("/admin/seo/reports?<limit>")]
pub async fn seo_reports(
    limit: Option<i64>,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<SeoReportSummary>>> {
    handlers::seo_handlers::list_reports_handler(limit, auth, db).await
}

#[get("/admin/seo/reports/<id>")]
pub async fn seo_report(
    id: &str,
    auth: Authorized,
    db: &State<Database>,
) -> ApiResult<DataResponse<StoredSeoReport>> {
    handlers::seo_handlers::get_report_handler(id, auth, db).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> ApiError {
    ApiError::new(
        Status::BadRequest,
        "Invalid request format",
        "BAD_REQUEST",
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    )
}

fn auth_failure(status: Status, req: &Request<'_>) -> ApiError {
    let mut err = match request_auth_error(req) {
        Some(auth_error) => ApiError::from(auth_error),
        None => ApiError::new(
            status,
            status.reason_lossy(),
            "AUTHORIZATION_ERROR",
            vec!["Login is required".to_string()],
        ),
    };
    err.status = status;
    err
}

#[rocket::catch(401)]
pub fn unauthorized(req: &Request<'_>) -> ApiError {
    auth_failure(Status::Unauthorized, req)
}

#[rocket::catch(403)]
pub fn forbidden(req: &Request<'_>) -> ApiError {
    auth_failure(Status::Forbidden, req)
}

#[rocket::catch(404)]
pub fn not_found(req: &Request<'_>) -> ApiError {
    ApiError::new(
        Status::NotFound,
        format!("No route for {}", req.uri().path()),
        "NOT_FOUND",
        vec!["Check the URL and HTTP method".to_string()],
    )
}

#[rocket::catch(422)]
pub fn unprocessable() -> ApiError {
    ApiError::new(
        Status::UnprocessableEntity,
        "Request body could not be parsed",
        "VALIDATION_ERROR",
        vec!["Check field names and types".to_string()],
    )
}

#[rocket::catch(500)]
pub fn internal_error() -> ApiError {
    ApiError::new(
        Status::InternalServerError,
        "Internal server error",
        "INTERNAL_ERROR",
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    )
}

/// Rocket figment with the upload limits raised for images
pub fn server_figment(port: u16) -> Figment {
    let limits = Limits::default()
        .limit("file", 10.mebibytes())
        .limit("data-form", 12.mebibytes());

    rocket::Config::figment()
        .merge(("port", port))
        .merge(("limits", limits))
}

pub fn build_rocket(
    figment: Figment,
    database: Database,
    auth_config: AuthConfig,
    state: AppState,
) -> Rocket<Build> {
    let storage_root = state.storage.root().clone();

    rocket::custom(figment)
        .attach(Cors)
        .manage(database)
        .manage(auth_config)
        .manage(state)
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                internal_error
            ],
        )
        .mount(
            "/api",
            routes![
                health,
                home,
                about,
                public_articles,
                public_article,
                public_cases,
                public_case,
                public_resumes,
                public_resume,
                submit_lead,
                get_current_user,
                internal_resumes,
                create_resume,
                internal_resume,
                update_resume,
                delete_resume,
                replace_blocks,
                edit_resume,
                admin_articles,
                create_article,
                update_article,
                delete_article,
                admin_cases,
                create_case,
                update_case,
                delete_case,
                upload_image,
                list_leads,
                mark_lead_handled,
                export_leads,
                analyze_page,
                seo_reports,
                seo_report,
                options,
            ],
        )
        .mount(PUBLIC_PREFIX, FileServer::new(storage_root, Options::Missing))
}

// Main server start function
pub async fn start_web_server(config: ConfigManager, port: u16) -> Result<()> {
    config.ensure_directories().await?;

    let database = match Database::new(&config.environment.database_path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {:#}", e);
            return Err(e);
        }
    };

    let auth_config = AuthConfig::from_settings(&config.auth)?;
    let state = AppState::from_config(&config, &database)?;

    info!("Starting konsult API server ({})", config.environment_name);
    info!("Database: {}", config.environment.database_path.display());
    info!("Storage: {}", config.environment.storage_path.display());
    info!("Resume backend: {:?}", config.resume_backend);

    build_rocket(server_figment(port), database, auth_config, state)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket failed: {}", e))?;

    Ok(())
}
