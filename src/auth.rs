// src/auth.rs
use crate::app_log;
use crate::config::AuthSettings;
use crate::core::Database;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use regex::Regex;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::{Request, State};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Employee,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "member" => Some(Role::Member),
            "employee" | "staff" => Some(Role::Employee),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Employee => "employee",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct ProfileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, user_id: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, email, display_name, is_active, created_at, updated_at
            FROM profiles
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to query profile by user id")?;

        Ok(profile)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, email, display_name, is_active, created_at, updated_at
            FROM profiles
            WHERE email = ?
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_optional(self.pool)
        .await
        .context("Failed to query profile by email")?;

        Ok(profile)
    }

    pub async fn create(
        &self,
        user_id: &str,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<Profile> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, email, display_name, is_active, created_at, updated_at)
            VALUES (?, ?, ?, TRUE, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(email.to_lowercase())
        .bind(display_name)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to create profile for {}", email))?;

        app_log!(info, "Created profile {} ({})", user_id, email);

        self.find(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Profile {} missing after insert", user_id))
    }

    /// First valid login creates the profile
    pub async fn get_or_create(&self, user_id: &str, email: &str) -> Result<Profile> {
        match self.find(user_id).await? {
            Some(profile) => Ok(profile),
            None => self.create(user_id, email, None).await,
        }
    }

    pub async fn set_active(&self, user_id: &str, active: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE profiles SET is_active = ?, updated_at = ? WHERE user_id = ?",
        )
        .bind(active)
        .bind(Utc::now())
        .bind(user_id)
        .execute(self.pool)
        .await
        .context("Failed to update profile status")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(&self) -> Result<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, email, display_name, is_active, created_at, updated_at
            FROM profiles
            ORDER BY email
            "#,
        )
        .fetch_all(self.pool)
        .await
        .context("Failed to list profiles")?;

        Ok(profiles)
    }
}

pub struct RoleRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RoleRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Users without a role row are members
    pub async fn role_for(&self, user_id: &str) -> Result<Role> {
        let row: Option<(String,)> = sqlx::query_as("SELECT role FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
            .context("Failed to query user role")?;

        match row {
            Some((role,)) => Role::parse(&role)
                .ok_or_else(|| anyhow::anyhow!("Unknown role '{}' for user {}", role, user_id)),
            None => Ok(Role::Member),
        }
    }

    pub async fn grant(&self, user_id: &str, role: Role) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role, granted_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET role = excluded.role, granted_at = excluded.granted_at
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to grant role {} to {}", role, user_id))?;

        app_log!(info, "Granted role {} to {}", role, user_id);
        Ok(())
    }

    pub async fn revoke(&self, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await
            .context("Failed to revoke role")?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct AccessRule {
    pub pattern: Regex,
    pub required: Role,
}

/// Ordered path rules, first match wins
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new(rules: &[(&str, Role)]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|(pattern, required)| {
                Ok(AccessRule {
                    pattern: Regex::new(pattern)
                        .with_context(|| format!("Invalid access rule pattern: {}", pattern))?,
                    required: *required,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    pub fn standard() -> Result<Self> {
        Self::new(&[
            (r"^/api/admin(/.*)?$", Role::Admin),
            (r"^/api/internal(/.*)?$", Role::Employee),
        ])
    }

    /// `None` means any authenticated user may pass
    pub fn required_role(&self, path: &str) -> Option<Role> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(path))
            .map(|rule| rule.required)
    }

    pub fn allows(&self, path: &str, role: Role) -> bool {
        self.required_role(path).map_or(true, |required| role >= required)
    }
}

pub struct AuthConfig {
    secret: String,
    pub cookie_name: String,
    pub audience: String,
    pub policy: AccessPolicy,
}

impl AuthConfig {
    pub fn new(secret: String, cookie_name: String, audience: String) -> Result<Self> {
        Ok(Self {
            secret,
            cookie_name,
            audience,
            policy: AccessPolicy::standard()?,
        })
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        Self::new(
            settings.require_secret()?.to_string(),
            settings.cookie_name.clone(),
            settings.audience.clone(),
        )
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;

        Ok(token_data.claims)
    }

    /// Sign a token the same way the identity provider does; used by the CLI for local testing
    pub fn issue_token(&self, user_id: &str, email: &str, ttl_seconds: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            aud: self.audience.clone(),
            exp: (now + ttl_seconds).max(0) as usize,
            iat: now.max(0) as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")
    }
}

/// Cookie first, then `Authorization: Bearer`
fn extract_token(cookie: Option<&str>, authorization: Option<&str>) -> Result<String, AuthError> {
    if let Some(value) = cookie.map(str::trim).filter(|v| !v.is_empty()) {
        // Some clients store `["access", "refresh"]` in the cookie
        if value.starts_with('[') {
            let parts: Vec<String> =
                serde_json::from_str(value).map_err(|_| AuthError::InvalidToken)?;
            return parts
                .into_iter()
                .next()
                .filter(|t| !t.is_empty())
                .ok_or(AuthError::InvalidToken);
        }
        return Ok(value.to_string());
    }

    match authorization {
        Some(header) if header.starts_with("Bearer ") => {
            let token = header[7..].trim();
            if token.is_empty() {
                Err(AuthError::InvalidToken)
            } else {
                Ok(token.to_string())
            }
        }
        Some(_) => Err(AuthError::InvalidToken),
        None => Err(AuthError::MissingToken),
    }
}

/// Remember the failure so the error catcher can explain it
fn reject<T>(req: &Request<'_>, status: Status, error: AuthError) -> Outcome<T, AuthError> {
    req.local_cache(|| Some(error));
    Outcome::Error((status, error))
}

/// The auth failure recorded for this request, if any
pub fn request_auth_error(req: &Request<'_>) -> Option<AuthError> {
    *req.local_cache(|| None::<AuthError>)
}

/// Authenticated user with profile and role
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_config = match req.guard::<&State<AuthConfig>>().await {
            Outcome::Success(config) => config,
            Outcome::Error((status, _)) => return reject(req, status, AuthError::NotConfigured),
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let database = match req.guard::<&State<Database>>().await {
            Outcome::Success(db) => db,
            Outcome::Error((status, _)) => return reject(req, status, AuthError::DatabaseError),
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let cookie = req.cookies().get(&auth_config.cookie_name).map(|c| c.value().to_string());
        let token = match extract_token(cookie.as_deref(), req.headers().get_one("Authorization")) {
            Ok(token) => token,
            Err(e) => {
                app_log!(warn, "Rejected request to {}: {}", req.uri().path(), e.message());
                return reject(req, Status::Unauthorized, e);
            }
        };

        let claims = match auth_config.verify_token(&token) {
            Ok(claims) => claims,
            Err(e) => {
                app_log!(warn, "Token verification failed: {}", e);
                return reject(req, Status::Unauthorized, AuthError::TokenVerificationFailed);
            }
        };

        let pool = database.pool();

        let profile = match ProfileRepository::new(pool)
            .get_or_create(&claims.sub, &claims.email)
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                app_log!(error, "Profile lookup failed for {}: {}", claims.email, e);
                return reject(req, Status::InternalServerError, AuthError::DatabaseError);
            }
        };

        if !profile.is_active {
            app_log!(warn, "Inactive profile {} attempted access", profile.email);
            return reject(req, Status::Forbidden, AuthError::InactiveProfile);
        }

        let role = match RoleRepository::new(pool).role_for(&profile.user_id).await {
            Ok(role) => role,
            Err(e) => {
                app_log!(error, "Role lookup failed for {}: {}", profile.user_id, e);
                return reject(req, Status::InternalServerError, AuthError::DatabaseError);
            }
        };

        app_log!(debug, "User {} authenticated as {}", profile.email, role);

        Outcome::Success(AuthenticatedUser {
            user_id: profile.user_id,
            email: profile.email,
            display_name: profile.display_name,
            role,
        })
    }
}

/// Authenticated user whose role satisfies the access policy for the request path
pub struct Authorized(pub AuthenticatedUser);

impl Authorized {
    pub fn user(&self) -> &AuthenticatedUser {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Authorized {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user = match AuthenticatedUser::from_request(req).await {
            Outcome::Success(user) => user,
            Outcome::Error(e) => return Outcome::Error(e),
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let auth_config = match req.guard::<&State<AuthConfig>>().await {
            Outcome::Success(config) => config,
            Outcome::Error((status, _)) => return reject(req, status, AuthError::NotConfigured),
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let path = req.uri().path();
        if auth_config.policy.allows(path.as_str(), user.role) {
            Outcome::Success(Authorized(user))
        } else {
            app_log!(
                warn,
                "User {} ({}) denied access to {}",
                user.email,
                user.role,
                path
            );
            reject(req, Status::Forbidden, AuthError::NotAuthorized)
        }
    }
}

// Optional auth guard that doesn't fail if no auth is provided
pub struct OptionalAuth {
    pub user: Option<AuthenticatedUser>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OptionalAuth {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(req).await {
            Outcome::Success(user) => Outcome::Success(OptionalAuth { user: Some(user) }),
            _ => Outcome::Success(OptionalAuth { user: None }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenVerificationFailed,
    InactiveProfile,
    NotAuthorized,
    NotConfigured,
    DatabaseError,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Authorization token required",
            AuthError::InvalidToken => "Invalid authorization token format",
            AuthError::TokenVerificationFailed => "Token verification failed",
            AuthError::InactiveProfile => "Account is deactivated",
            AuthError::NotAuthorized => "Insufficient role for this resource",
            AuthError::NotConfigured => "Authentication is not configured",
            AuthError::DatabaseError => "Database error occurred",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            "test-secret".to_string(),
            "sb-access-token".to_string(),
            "authenticated".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_role_ordering_and_parse() {
        assert!(Role::Admin > Role::Employee);
        assert!(Role::Employee > Role::Member);
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("staff"), Some(Role::Employee));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_standard_policy() {
        let policy = AccessPolicy::standard().unwrap();

        assert_eq!(policy.required_role("/api/admin"), Some(Role::Admin));
        assert_eq!(policy.required_role("/api/admin/articles/1"), Some(Role::Admin));
        assert_eq!(policy.required_role("/api/internal/me"), Some(Role::Employee));
        assert_eq!(policy.required_role("/api/administrator"), None);
        assert_eq!(policy.required_role("/api/resumes"), None);

        assert!(policy.allows("/api/internal/resumes", Role::Admin));
        assert!(policy.allows("/api/internal/resumes", Role::Employee));
        assert!(!policy.allows("/api/internal/resumes", Role::Member));
        assert!(!policy.allows("/api/admin/leads", Role::Employee));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let policy = AccessPolicy::new(&[
            (r"^/api/admin/seo(/.*)?$", Role::Employee),
            (r"^/api/admin(/.*)?$", Role::Admin),
        ])
        .unwrap();

        assert_eq!(policy.required_role("/api/admin/seo/analyze"), Some(Role::Employee));
        assert_eq!(policy.required_role("/api/admin/leads"), Some(Role::Admin));
        assert!(AccessPolicy::new(&[("(", Role::Admin)]).is_err());
    }

    #[test]
    fn test_token_round_trip() {
        let config = config();
        let token = config.issue_token("user-1", "anna@example.com", 3600).unwrap();
        let claims = config.verify_token(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "anna@example.com");
        assert_eq!(claims.aud, "authenticated");
    }

    #[test]
    fn test_token_rejections() {
        let config = config();

        let expired = config.issue_token("user-1", "a@example.com", -3600).unwrap();
        assert!(config.verify_token(&expired).is_err());

        let other = AuthConfig::new("other".into(), "c".into(), "authenticated".into()).unwrap();
        let foreign = other.issue_token("user-1", "a@example.com", 3600).unwrap();
        assert!(config.verify_token(&foreign).is_err());

        let wrong_aud = AuthConfig::new("test-secret".into(), "c".into(), "anon".into()).unwrap();
        let token = wrong_aud.issue_token("user-1", "a@example.com", 3600).unwrap();
        assert!(config.verify_token(&token).is_err());
    }

    #[test]
    fn test_extract_token_sources() {
        assert_eq!(extract_token(Some("abc"), None).unwrap(), "abc");
        assert_eq!(
            extract_token(Some("abc"), Some("Bearer xyz")).unwrap(),
            "abc"
        );
        assert_eq!(extract_token(None, Some("Bearer xyz")).unwrap(), "xyz");
        assert_eq!(
            extract_token(Some(r#"["acc","ref"]"#), None).unwrap(),
            "acc"
        );
        assert_eq!(extract_token(None, Some("Basic abc")), Err(AuthError::InvalidToken));
        assert_eq!(extract_token(None, None), Err(AuthError::MissingToken));
        assert_eq!(extract_token(Some("  "), None), Err(AuthError::MissingToken));
    }

    #[tokio::test]
    async fn test_profile_and_role_lookups() {
        let db = Database::in_memory().await.unwrap();
        let profiles = ProfileRepository::new(db.pool());
        let roles = RoleRepository::new(db.pool());

        let created = profiles.get_or_create("u1", "Anna@Example.com").await.unwrap();
        assert_eq!(created.email, "anna@example.com");
        assert!(created.is_active);

        let again = profiles.get_or_create("u1", "anna@example.com").await.unwrap();
        assert_eq!(again.created_at, created.created_at);

        assert_eq!(roles.role_for("u1").await.unwrap(), Role::Member);
        roles.grant("u1", Role::Employee).await.unwrap();
        roles.grant("u1", Role::Admin).await.unwrap();
        assert_eq!(roles.role_for("u1").await.unwrap(), Role::Admin);

        assert!(roles.revoke("u1").await.unwrap());
        assert!(!roles.revoke("u1").await.unwrap());
        assert_eq!(roles.role_for("u1").await.unwrap(), Role::Member);

        assert!(profiles.set_active("u1", false).await.unwrap());
        assert!(!profiles.find("u1").await.unwrap().unwrap().is_active);
        assert!(profiles.find_by_email("ANNA@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_role_requires_profile() {
        let db = Database::in_memory().await.unwrap();
        let roles = RoleRepository::new(db.pool());
        assert!(roles.grant("ghost", Role::Admin).await.is_err());
    }
}
