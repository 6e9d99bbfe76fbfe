use std::sync::Arc;
use std::time::Duration;

use konsult::auth::{AuthConfig, ProfileRepository, Role, RoleRepository};
use konsult::config::SiteConfig;
use konsult::core::{Database, Storage};
use konsult::resume::{LocalizedText, MockResumeStore, ResumeService};
use konsult::seo::{PageFetcher, SeoAnalyzer};
use konsult::web::{build_rocket, server_figment, AppState};
use rocket::http::{ContentType, Cookie, Header, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use httpmock::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const SECRET: &str = "integration-secret";

struct TestApp {
    client: Client,
    auth: AuthConfig,
    storage: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let database = Database::in_memory().await.expect("database");
        let storage = tempfile::tempdir().expect("storage dir");

        let users = [
            ("member-1", "member@example.com", None),
            ("employee-1", "employee@example.com", Some(Role::Employee)),
            ("admin-1", "admin@example.com", Some(Role::Admin)),
            ("inactive-1", "inactive@example.com", Some(Role::Admin)),
        ];
        for (user_id, email, role) in users {
            ProfileRepository::new(database.pool())
                .create(user_id, email, None)
                .await
                .expect("profile");
            if let Some(role) = role {
                RoleRepository::new(database.pool())
                    .grant(user_id, role)
                    .await
                    .expect("role");
            }
        }
        ProfileRepository::new(database.pool())
            .set_active("inactive-1", false)
            .await
            .expect("deactivate");

        let site = SiteConfig {
            name: "Nordkonsult".to_string(),
            contact_email: "hej@nordkonsult.se".to_string(),
            tagline: LocalizedText::pair("Vi bygger mjukvara", "We build software"),
            about: LocalizedText::pair("Om oss", "About us"),
        };
        let state = AppState {
            site,
            storage: Storage::new(storage.path().to_path_buf()),
            resumes: ResumeService::new(Arc::new(MockResumeStore::seeded().expect("seed"))),
            seo: SeoAnalyzer::new(PageFetcher::new(Duration::from_secs(5)).expect("fetcher"), None),
        };

        let auth = AuthConfig::new(
            SECRET.to_string(),
            "sb-access-token".to_string(),
            "authenticated".to_string(),
        )
        .expect("auth config");
        let rocket_auth = AuthConfig::new(
            SECRET.to_string(),
            "sb-access-token".to_string(),
            "authenticated".to_string(),
        )
        .expect("auth config");

        let rocket = build_rocket(server_figment(8000), database, rocket_auth, state);
        let client = Client::tracked(rocket).await.expect("valid rocket");

        Self {
            client,
            auth,
            storage,
        }
    }

    fn bearer(&self, user_id: &str, email: &str) -> Header<'static> {
        let token = self.auth.issue_token(user_id, email, 600).expect("token");
        Header::new("Authorization", format!("Bearer {}", token))
    }

    fn employee(&self) -> Header<'static> {
        self.bearer("employee-1", "employee@example.com")
    }

    fn admin(&self) -> Header<'static> {
        self.bearer("admin-1", "admin@example.com")
    }
}

async fn body(response: LocalResponse<'_>) -> Value {
    response.into_json::<Value>().await.expect("json body")
}

#[tokio::test]
async fn health_reports_database_status() {
    let app = TestApp::new().await;

    let response = app.client.get("/api/health").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let json = body(response).await;
    assert_eq!(json["type"], "data");
    assert_eq!(json["data"]["database"], "ok");
}

#[tokio::test]
async fn home_shows_published_consultants_in_requested_language() {
    let app = TestApp::new().await;

    let response = app.client.get("/api/home?lang=en").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let json = body(response).await;
    assert_eq!(json["data"]["site_name"], "Nordkonsult");
    assert_eq!(json["data"]["tagline"], "We build software");

    let consultants = json["data"]["consultants"].as_array().unwrap();
    assert_eq!(consultants.len(), 1);
    assert_eq!(consultants[0]["slug"], "anna-berg");
    assert_eq!(consultants[0]["headline"], "Senior software engineer");

    let json = body(app.client.get("/api/about").dispatch().await).await;
    assert_eq!(json["data"]["about"], "Om oss");
}

#[tokio::test]
async fn public_resume_hides_drafts() {
    let app = TestApp::new().await;

    let response = app.client.get("/api/resumes/anna-berg?lang=sv").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let json = body(response).await;
    assert_eq!(json["data"]["headline"], "Senior systemutvecklare");
    assert!(!json["data"]["blocks"].as_array().unwrap().is_empty());

    let response = app.client.get("/api/resumes/erik-lind").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let json = body(response).await;
    assert_eq!(json["type"], "error");
    assert_eq!(json["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let app = TestApp::new().await;

    let response = app.client.get("/api/nothing-here").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(body(response).await["success"], false);
}

#[tokio::test]
async fn internal_routes_require_a_token() {
    let app = TestApp::new().await;

    let response = app.client.get("/api/internal/me").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    let json = body(response).await;
    assert_eq!(json["error_code"], "AUTHORIZATION_ERROR");
    assert_eq!(json["error"], "Authorization token required");

    let response = app
        .client
        .get("/api/internal/me")
        .header(Header::new("Authorization", "Basic abc"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[tokio::test]
async fn token_cookie_is_accepted() {
    let app = TestApp::new().await;
    let token = app
        .auth
        .issue_token("employee-1", "employee@example.com", 600)
        .unwrap();

    let response = app
        .client
        .get("/api/internal/me")
        .cookie(Cookie::new("sb-access-token", token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let json = body(response).await;
    assert_eq!(json["data"]["role"], "employee");
}

#[tokio::test]
async fn roles_gate_internal_and_admin_routes() {
    let app = TestApp::new().await;
    let member = app.bearer("member-1", "member@example.com");

    let response = app
        .client
        .get("/api/internal/resumes")
        .header(member.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = app.client.get("/api/admin/articles").header(member).dispatch().await;
    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(body(response).await["error"], "Insufficient role for this resource");

    let response = app
        .client
        .get("/api/admin/leads")
        .header(app.employee())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = app
        .client
        .get("/api/internal/resumes")
        .header(app.admin())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
}

#[tokio::test]
async fn deactivated_profiles_are_rejected() {
    let app = TestApp::new().await;
    let inactive = app.bearer("inactive-1", "inactive@example.com");

    let response = app
        .client
        .get("/api/internal/me")
        .header(inactive.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
    let json = body(response).await;
    assert_eq!(json["error_code"], "AUTHORIZATION_ERROR");
    assert_eq!(json["error"], "Account is deactivated");

    // The admin role does not help a deactivated account
    let response = app
        .client
        .get("/api/admin/articles")
        .header(inactive)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(body(response).await["error"], "Account is deactivated");
}

#[tokio::test]
async fn first_login_creates_a_member_profile() {
    let app = TestApp::new().await;
    let newcomer = app.bearer("new-user", "new@example.com");

    let response = app.client.get("/api/internal/me").header(newcomer).dispatch().await;
    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(body(response).await["error_code"], "AUTHORIZATION_ERROR");
}

#[tokio::test]
async fn employee_edits_resume_blocks() {
    let app = TestApp::new().await;

    let json = body(
        app.client
            .get("/api/internal/resumes")
            .header(app.employee())
            .dispatch()
            .await,
    )
    .await;
    let resumes = json["data"].as_array().unwrap();
    assert_eq!(resumes.len(), 2);
    let draft = resumes.iter().find(|r| r["slug"] == "erik-lind").unwrap();
    let id = draft["id"].as_str().unwrap().to_string();

    let response = app
        .client
        .post(format!("/api/internal/resumes/{}/edit", id))
        .header(app.employee())
        .header(ContentType::JSON)
        .body(json!({"op": "add", "block": {"type": "divider"}}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let json = body(response).await;
    assert_eq!(json["data"]["outcome"]["changed"], true);
    let block_id = json["data"]["outcome"]["block_id"].as_str().unwrap().to_string();
    assert!(block_id.starts_with("blk_"));
    assert_eq!(json["data"]["resume"]["blocks"].as_array().unwrap().len(), 3);

    let response = app
        .client
        .post(format!("/api/internal/resumes/{}/edit", id))
        .header(app.employee())
        .header(ContentType::JSON)
        .body(json!({"op": "remove", "id": "blk_missing"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(body(response).await["error_code"], "BLOCK_NOT_FOUND");

    let response = app
        .client
        .put(format!("/api/internal/resumes/{}", id))
        .header(app.employee())
        .header(ContentType::JSON)
        .body(json!({"published": true}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = app.client.get("/api/resumes/erik-lind?lang=en").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(body(response).await["data"]["headline"], "UX designer");
}

#[tokio::test]
async fn employee_reorders_and_hides_blocks() {
    let app = TestApp::new().await;

    let json = body(
        app.client
            .get("/api/internal/resumes")
            .header(app.employee())
            .dispatch()
            .await,
    )
    .await;
    let id = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["slug"] == "anna-berg")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let json = body(
        app.client
            .get(format!("/api/internal/resumes/{}?lang=en", id))
            .header(app.employee())
            .dispatch()
            .await,
    )
    .await;
    let ids: Vec<String> = json["data"]["source"]["blocks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 5);
    let mut reversed = ids.clone();
    reversed.reverse();

    let response = app
        .client
        .post(format!("/api/internal/resumes/{}/edit", id))
        .header(app.employee())
        .header(ContentType::JSON)
        .body(json!({"op": "reorder", "ids": reversed}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let json = body(response).await;
    assert_eq!(json["data"]["outcome"]["changed"], true);
    let order: Vec<&str> = json["data"]["resume"]["blocks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(order, reversed.iter().map(String::as_str).collect::<Vec<_>>());

    let response = app
        .client
        .post(format!("/api/internal/resumes/{}/edit", id))
        .header(app.employee())
        .header(ContentType::JSON)
        .body(json!({"op": "reorder", "ids": [ids[0], ids[0]]}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);
    assert_eq!(body(response).await["error_code"], "INVALID_ORDER");

    let header_id = ids[0].clone();
    let response = app
        .client
        .post(format!("/api/internal/resumes/{}/edit", id))
        .header(app.employee())
        .header(ContentType::JSON)
        .body(json!({"op": "toggle_hidden", "id": header_id}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let json = body(response).await;
    assert_eq!(json["data"]["outcome"]["block_id"], header_id.as_str());
    let blocks = json["data"]["resume"]["blocks"].as_array().unwrap();
    assert_eq!(blocks[4]["id"], header_id.as_str());
    assert_eq!(blocks[4]["hidden"], true);

    let json = body(app.client.get("/api/resumes/anna-berg").dispatch().await).await;
    let public = json["data"]["blocks"].as_array().unwrap();
    assert_eq!(public.len(), 4);
    assert!(public.iter().all(|b| b["id"] != header_id.as_str()));
    assert_eq!(public[0]["type"], "languages");
}

#[tokio::test]
async fn admin_publishes_articles_and_cases() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post("/api/admin/articles")
        .header(app.admin())
        .header(ContentType::JSON)
        .body(
            json!({
                "title": "Rust i produktion",
                "body": "Lärdomar från tre år.",
                "published": true
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let json = body(response).await;
    assert_eq!(json["data"]["slug"], "rust-i-produktion");
    assert_eq!(json["data"]["author_id"], "admin-1");

    let response = app
        .client
        .post("/api/admin/articles")
        .header(app.admin())
        .header(ContentType::JSON)
        .body(json!({"title": "Rust i produktion", "body": "Again"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let response = app
        .client
        .post("/api/admin/cases")
        .header(app.admin())
        .header(ContentType::JSON)
        .body(
            json!({
                "client": "Nordbank",
                "title": "Betalplattform",
                "body": "Ny plattform för kortbetalningar.",
                "tags": ["Rust", "rust", " Kafka "],
                "featured": true,
                "published": true
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(body(response).await["data"]["tags"], json!(["Rust", "Kafka"]));

    let json = body(app.client.get("/api/articles").dispatch().await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    let response = app.client.get("/api/articles/rust-i-produktion").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let json = body(app.client.get("/api/home").dispatch().await).await;
    assert_eq!(json["data"]["featured_cases"][0]["client"], "Nordbank");
    assert_eq!(json["data"]["latest_articles"][0]["slug"], "rust-i-produktion");
}

const BOUNDARY: &str = "konsult-boundary";

fn multipart_type() -> ContentType {
    ContentType::new("multipart", "form-data").with_params(("boundary", BOUNDARY))
}

fn multipart_upload(bucket: &str, filename: &str, content_type: &str, content: &str) -> String {
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"bucket\"\r\n\r\n\
         {bucket}\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\n\
         {content}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
    )
}

#[tokio::test]
async fn uploaded_covers_are_checked_and_removed_with_their_case() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post("/api/admin/uploads")
        .header(app.admin())
        .header(multipart_type())
        .body(multipart_upload("cases", "logo.svg", "image/svg+xml", "<svg onload=\"alert(1)\"/>"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);
    assert_eq!(body(response).await["error_code"], "INVALID_FILE_TYPE");

    let response = app
        .client
        .post("/api/admin/uploads")
        .header(app.admin())
        .header(multipart_type())
        .body(multipart_upload("cases", "cover.png", "image/png", "fake-png"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let json = body(response).await;
    let key = json["data"]["key"].as_str().unwrap().to_string();
    let url = json["data"]["url"].as_str().unwrap().to_string();
    assert!(key.starts_with("cases/"));
    let stored = app.storage.path().join(&key);
    assert!(stored.exists());

    let response = app
        .client
        .post("/api/admin/cases")
        .header(app.admin())
        .header(ContentType::JSON)
        .body(
            json!({
                "client": "Nordbank",
                "title": "Kortinlösen",
                "body": "Migrering av inlösenflödet.",
                "cover_image_url": url
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let case_id = body(response).await["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .client
        .delete(format!("/api/admin/cases/{}", case_id))
        .header(app.admin())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert!(!stored.exists());

    let response = app
        .client
        .delete(format!("/api/admin/cases/{}", case_id))
        .header(app.admin())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[tokio::test]
async fn invalid_article_is_rejected_with_problems() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post("/api/admin/articles")
        .header(app.admin())
        .header(ContentType::JSON)
        .body(json!({"title": "  ", "body": ""}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);
    let json = body(response).await;
    assert_eq!(json["error_code"], "VALIDATION_ERROR");
    assert!(!json["suggestions"].as_array().unwrap().is_empty());

    let response = app
        .client
        .post("/api/admin/articles")
        .header(app.admin())
        .header(ContentType::JSON)
        .body(json!({"title": "Missing body"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);
}

#[tokio::test]
async fn leads_flow_from_contact_form_to_export() {
    let app = TestApp::new().await;

    for submission in [
        json!({"name": "Kim", "email": "Kim@Example.com", "message": "We need a Rust team"}),
        json!({"name": "Bot", "email": "bot@spam.example", "message": "Buy now", "website": "http://spam.example"}),
    ] {
        let response = app
            .client
            .post("/api/leads")
            .header(ContentType::JSON)
            .body(submission.to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body(response).await["action"], "lead_received");
    }

    let response = app
        .client
        .post("/api/leads")
        .header(ContentType::JSON)
        .body(json!({"name": "Kim", "email": "not-an-email", "message": "Hi"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);

    let json = body(
        app.client
            .get("/api/admin/leads?handled=false")
            .header(app.admin())
            .dispatch()
            .await,
    )
    .await;
    let leads = json["data"].as_array().unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0]["email"], "kim@example.com");
    let lead_id = leads[0]["id"].as_str().unwrap().to_string();

    let response = app
        .client
        .post(format!("/api/admin/leads/{}/handled", lead_id))
        .header(app.admin())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(body(response).await["data"]["handled"], true);

    let response = app
        .client
        .get("/api/admin/leads/export?handled=true")
        .header(app.admin())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::CSV));
    let csv = response.into_string().await.unwrap();
    assert!(csv.starts_with("id,created_at,name,email"));
    assert!(csv.contains("kim@example.com"));
}

#[tokio::test]
async fn seo_analyze_rejects_non_http_urls() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post("/api/admin/seo/analyze")
        .header(app.admin())
        .header(ContentType::JSON)
        .body(json!({"url": "ftp://example.com/"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);

    let json = body(
        app.client
            .get("/api/admin/seo/reports")
            .header(app.admin())
            .dispatch()
            .await,
    )
    .await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn seo_analyze_reports_unreachable_pages_as_bad_gateway() {
    let app = TestApp::new().await;
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/broken");
            then.status(500).body("boom");
        })
        .await;

    let response = app
        .client
        .post("/api/admin/seo/analyze")
        .header(app.admin())
        .header(ContentType::JSON)
        .body(json!({"url": server.url("/broken")}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadGateway);
    let json = body(response).await;
    assert_eq!(json["error_code"], "FETCH_ERROR");
    assert_eq!(json["success"], false);

    let json = body(
        app.client
            .get("/api/admin/seo/reports")
            .header(app.admin())
            .dispatch()
            .await,
    )
    .await;
    assert!(json["data"].as_array().unwrap().is_empty());
}
