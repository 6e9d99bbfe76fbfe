// src/config.rs
//! Configuration: `config.yaml` sections per environment plus environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::FsOps;
use crate::resume::LocalizedText;

pub const DEFAULT_COOKIE_NAME: &str = "sb-access-token";
pub const DEFAULT_AUDIENCE: &str = "authenticated";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment_name: String,
    pub environment: EnvironmentConfig,
    pub auth: AuthSettings,
    pub llm: LlmSettings,
    pub site: SiteConfig,
    pub resume_backend: ResumeBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub database_path: PathBuf,
    pub storage_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: Option<String>,
    pub cookie_name: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
}

/// Static content of the public pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub contact_email: String,
    pub tagline: LocalizedText,
    pub about: LocalizedText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeBackend {
    Sqlite,
    Mock,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    local: Option<EnvironmentConfig>,
    #[serde(default)]
    production: Option<EnvironmentConfig>,
    #[serde(default)]
    site: Option<SiteConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Konsult".to_string(),
            contact_email: "hello@example.com".to_string(),
            tagline: LocalizedText::pair(
                "Digitala lösningar som håller",
                "Digital solutions that last",
            ),
            about: LocalizedText::pair(
                "Vi är en digital konsultbyrå som bygger produkter tillsammans med våra kunder.",
                "We are a digital consultancy building products together with our clients.",
            ),
        }
    }
}

impl LlmSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().map_or(false, |k| !k.trim().is_empty())
    }
}

impl AuthSettings {
    pub fn require_secret(&self) -> Result<&str> {
        self.jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("AUTH_JWT_SECRET environment variable not set"))
    }
}

impl ConfigManager {
    /// Load configuration from the working directory and process environment
    pub fn load() -> Result<Self> {
        let base_dir = std::env::current_dir().context("Failed to get current directory")?;
        let config_path = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir.join("config.yaml"));

        let file_content = if config_path.exists() {
            Some(
                std::fs::read_to_string(&config_path)
                    .with_context(|| format!("Failed to read {}", config_path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(&base_dir, file_content.as_deref(), |key| std::env::var(key).ok())
    }

    /// Assemble configuration from explicit sources
    pub fn from_sources<F>(base_dir: &Path, file_content: Option<&str>, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment_name = var("ENVIRONMENT").unwrap_or_else(|| "local".to_string());
        info!("Loading configuration for environment: {}", environment_name);

        let file: ConfigFile = match file_content {
            Some(content) => serde_yaml::from_str(content).context("Failed to parse config.yaml")?,
            None => ConfigFile::default(),
        };

        let section = match environment_name.as_str() {
            "production" => file.production,
            _ => file.local,
        };

        let environment = match section {
            Some(env) => EnvironmentConfig {
                database_path: FsOps::normalize_path(base_dir, &env.database_path),
                storage_path: FsOps::normalize_path(base_dir, &env.storage_path),
            },
            None => Self::default_environment(base_dir, &environment_name),
        };

        let environment = EnvironmentConfig {
            database_path: var("DATABASE_PATH")
                .map(|p| FsOps::normalize_path(base_dir, Path::new(&p)))
                .unwrap_or(environment.database_path),
            storage_path: var("STORAGE_PATH")
                .map(|p| FsOps::normalize_path(base_dir, Path::new(&p)))
                .unwrap_or(environment.storage_path),
        };

        let auth = AuthSettings {
            jwt_secret: var("AUTH_JWT_SECRET"),
            cookie_name: var("AUTH_COOKIE_NAME").unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
            audience: var("AUTH_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
        };

        let llm = LlmSettings {
            api_url: var("LLM_API_URL").unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            api_key: var("LLM_API_KEY"),
            model: var("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            timeout_seconds: var("LLM_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        };

        let resume_backend = match var("RESUME_BACKEND").as_deref() {
            Some("mock") => ResumeBackend::Mock,
            Some("sqlite") | None => ResumeBackend::Sqlite,
            Some(other) => anyhow::bail!("Unknown RESUME_BACKEND '{}': use sqlite or mock", other),
        };

        Ok(Self {
            environment_name,
            environment,
            auth,
            llm,
            site: file.site.unwrap_or_default(),
            resume_backend,
        })
    }

    fn default_environment(base_dir: &Path, environment_name: &str) -> EnvironmentConfig {
        let root = if environment_name == "production" {
            PathBuf::from("/app")
        } else {
            base_dir.to_path_buf()
        };

        EnvironmentConfig {
            database_path: root.join("data").join("site.db"),
            storage_path: root.join("data").join("storage"),
        }
    }

    pub async fn ensure_directories(&self) -> Result<()> {
        FsOps::ensure_dir_exists(&self.environment.storage_path).await?;
        if let Some(db_parent) = self.environment.database_path.parent() {
            FsOps::ensure_dir_exists(db_parent).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::Language;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const YAML: &str = r#"
local:
  database_path: data/local.db
  storage_path: data/files
production:
  database_path: /var/lib/site/site.db
  storage_path: /var/lib/site/storage
site:
  name: Nordkonsult
  contact_email: hej@nordkonsult.se
  tagline: Vi bygger
  about:
    sv: Om oss
    en: About us
"#;

    #[test]
    fn test_defaults_without_file() {
        let config = ConfigManager::from_sources(Path::new("/srv"), None, vars(&[])).unwrap();

        assert_eq!(config.environment_name, "local");
        assert_eq!(config.environment.database_path, PathBuf::from("/srv/data/site.db"));
        assert_eq!(config.auth.cookie_name, DEFAULT_COOKIE_NAME);
        assert!(config.auth.require_secret().is_err());
        assert!(!config.llm.is_configured());
        assert_eq!(config.resume_backend, ResumeBackend::Sqlite);
        assert_eq!(config.site.name, "Konsult");
    }

    #[test]
    fn test_yaml_sections_and_site() {
        let config = ConfigManager::from_sources(
            Path::new("/srv"),
            Some(YAML),
            vars(&[("ENVIRONMENT", "production"), ("AUTH_JWT_SECRET", "s3cret")]),
        )
        .unwrap();

        assert_eq!(
            config.environment.database_path,
            PathBuf::from("/var/lib/site/site.db")
        );
        assert_eq!(config.auth.require_secret().unwrap(), "s3cret");
        assert_eq!(config.site.name, "Nordkonsult");
        assert_eq!(config.site.about.resolve(Language::En), "About us");
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigManager::from_sources(
            Path::new("/srv"),
            Some(YAML),
            vars(&[
                ("DATABASE_PATH", "tmp/test.db"),
                ("RESUME_BACKEND", "mock"),
                ("LLM_API_KEY", "key"),
                ("LLM_TIMEOUT_SECONDS", "5"),
            ]),
        )
        .unwrap();

        assert_eq!(config.environment.database_path, PathBuf::from("/srv/tmp/test.db"));
        assert_eq!(config.environment.storage_path, PathBuf::from("/srv/data/files"));
        assert_eq!(config.resume_backend, ResumeBackend::Mock);
        assert!(config.llm.is_configured());
        assert_eq!(config.llm.timeout_seconds, 5);
    }

    #[test]
    fn test_unknown_backend_fails() {
        let result =
            ConfigManager::from_sources(Path::new("/srv"), None, vars(&[("RESUME_BACKEND", "redis")]));
        assert!(result.is_err());
    }
}
