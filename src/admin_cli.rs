// src/admin_cli.rs
use crate::app_log;
use crate::auth::{AuthConfig, ProfileRepository, Role, RoleRepository};
use crate::config::{ConfigManager, ResumeBackend};
use crate::core::Database;
use crate::leads::LeadRepository;
use crate::resume::import::read_seed_file;
use crate::resume::{ResumeService, SqliteResumeStore};
use crate::seo::SeoReportRepository;
use crate::web::AppState;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct AdminCli {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Initialize the database
    Init,
    /// Create a user profile
    AddUser {
        user_id: String,
        email: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Import users from a CSV file (user_id,email[,role])
    ImportUsers { csv_file: PathBuf },
    /// Grant a role (member, employee, admin)
    GrantRole { user_id: String, role: String },
    /// Remove the role row; the user falls back to member
    RevokeRole { user_id: String },
    /// Block or re-enable a user
    SetActive {
        user_id: String,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
    /// List all user profiles with their roles
    ListUsers,
    /// Sign a token for local testing (needs AUTH_JWT_SECRET)
    IssueToken {
        user_id: String,
        email: String,
        #[arg(long, default_value_t = 3600)]
        ttl_seconds: i64,
    },
    /// Import or update resumes from a TOML seed file
    ImportResume { path: PathBuf },
    /// Write contact form leads to a CSV file
    ExportLeads {
        output: PathBuf,
        #[arg(long)]
        handled: Option<bool>,
    },
    /// Run an SEO analysis and store the report
    Analyze { url: String },
}

pub async fn handle_admin_command(cli: AdminCli, config: ConfigManager) -> Result<()> {
    config.ensure_directories().await?;
    let database = Database::new(&config.environment.database_path).await?;
    let pool = database.pool();
    let profiles = ProfileRepository::new(pool);
    let roles = RoleRepository::new(pool);

    match cli.command {
        AdminCommand::Init => {
            app_log!(
                info,
                "✅ Database initialized at: {}",
                config.environment.database_path.display()
            );
            app_log!(info, "   Storage directory: {}", config.environment.storage_path.display());
            app_log!(info, "");
            app_log!(info, "Usage:");
            app_log!(info, "  konsult admin add-user <user-id> <email>      # Create a profile");
            app_log!(info, "  konsult admin grant-role <user-id> admin      # Promote a user");
            app_log!(info, "  konsult admin import-resume resumes.toml      # Load resumes");
        }

        AdminCommand::AddUser {
            user_id,
            email,
            display_name,
        } => {
            if let Some(existing) = profiles.find_by_email(&email).await? {
                app_log!(
                    info,
                    "❌ Error: '{}' is already registered to user '{}'",
                    existing.email,
                    existing.user_id
                );
                return Ok(());
            }

            match profiles.create(&user_id, &email, display_name.as_deref()).await {
                Ok(profile) => {
                    app_log!(info, "✅ Profile created:");
                    app_log!(info, "   User ID: {}", profile.user_id);
                    app_log!(info, "   Email: {}", profile.email);
                }
                Err(e) => {
                    app_log!(error, "Failed to create profile: {:#}", e);
                    if format!("{:#}", e).contains("UNIQUE constraint failed") {
                        app_log!(info, "❌ Error: user '{}' already exists", user_id);
                    } else {
                        app_log!(info, "❌ Error: {:#}", e);
                    }
                }
            }
        }

        AdminCommand::ImportUsers { csv_file } => {
            if !csv_file.exists() {
                app_log!(info, "❌ CSV file not found: {}", csv_file.display());
                return Ok(());
            }

            let content = tokio::fs::read_to_string(&csv_file).await?;
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(content.as_bytes());

            let mut success_count = 0;
            let mut error_count = 0;

            for result in reader.records() {
                let record = match result {
                    Ok(record) => record,
                    Err(e) => {
                        error_count += 1;
                        app_log!(info, "❌ CSV parsing error: {}", e);
                        continue;
                    }
                };

                let user_id = record.get(0).unwrap_or("").trim();
                let email = record.get(1).unwrap_or("").trim();
                if user_id.is_empty() || email.is_empty() {
                    error_count += 1;
                    app_log!(info, "⚠️  Skipping invalid record (need user_id,email[,role])");
                    continue;
                }

                let role = match record.get(2).map(str::trim).filter(|r| !r.is_empty()) {
                    Some(raw) => match Role::parse(raw) {
                        Some(role) => Some(role),
                        None => {
                            error_count += 1;
                            app_log!(info, "⚠️  Unknown role '{}' for {}", raw, email);
                            continue;
                        }
                    },
                    None => None,
                };

                if let Err(e) = profiles.get_or_create(user_id, email).await {
                    error_count += 1;
                    app_log!(info, "❌ Failed to add {}: {:#}", email, e);
                    continue;
                }
                if let Some(role) = role {
                    if let Err(e) = roles.grant(user_id, role).await {
                        error_count += 1;
                        app_log!(info, "❌ Failed to grant {} to {}: {:#}", role, email, e);
                        continue;
                    }
                }

                success_count += 1;
                app_log!(info, "✅ Added: {} ({})", email, role.unwrap_or(Role::Member));
            }

            app_log!(info, "\nImport completed:");
            app_log!(info, "  ✅ Success: {}", success_count);
            app_log!(info, "  ❌ Errors:  {}", error_count);
        }

        AdminCommand::GrantRole { user_id, role } => {
            let Some(role) = Role::parse(&role) else {
                app_log!(info, "❌ Unknown role '{}': use member, employee or admin", role);
                return Ok(());
            };
            if profiles.find(&user_id).await?.is_none() {
                app_log!(info, "❌ No profile for user '{}', run add-user first", user_id);
                return Ok(());
            }
            roles.grant(&user_id, role).await?;
            app_log!(info, "✅ {} is now {}", user_id, role);
        }

        AdminCommand::RevokeRole { user_id } => {
            if roles.revoke(&user_id).await? {
                app_log!(info, "✅ Role removed, {} is a member", user_id);
            } else {
                app_log!(info, "❌ No role granted to {}", user_id);
            }
        }

        AdminCommand::SetActive { user_id, active } => {
            if profiles.set_active(&user_id, active).await? {
                app_log!(
                    info,
                    "✅ {} {}",
                    user_id,
                    if active { "enabled" } else { "blocked" }
                );
            } else {
                app_log!(info, "❌ No profile for user '{}'", user_id);
            }
        }

        AdminCommand::ListUsers => {
            let users = profiles.list().await?;
            if users.is_empty() {
                app_log!(info, "No profiles found.");
                return Ok(());
            }

            app_log!(
                info,
                "{:<38} {:<30} {:<10} {:<8} {:<20}",
                "User ID", "Email", "Role", "Active", "Created"
            );
            app_log!(info, "{}", "-".repeat(110));
            for profile in users {
                let role = roles.role_for(&profile.user_id).await?;
                app_log!(
                    info,
                    "{:<38} {:<30} {:<10} {:<8} {:<20}",
                    profile.user_id,
                    profile.email,
                    role,
                    if profile.is_active { "yes" } else { "no" },
                    profile.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }

        AdminCommand::IssueToken {
            user_id,
            email,
            ttl_seconds,
        } => {
            let auth = AuthConfig::from_settings(&config.auth)?;
            let token = auth.issue_token(&user_id, &email, ttl_seconds)?;
            println!("{}", token);
        }

        AdminCommand::ImportResume { path } => {
            // Always the database: a mock store would drop the import on exit
            if config.resume_backend == ResumeBackend::Mock {
                app_log!(
                    warn,
                    "RESUME_BACKEND=mock: importing into {} anyway, the server will not show these until it runs with sqlite",
                    config.environment.database_path.display()
                );
            }
            let resumes = ResumeService::new(Arc::new(SqliteResumeStore::new(pool.clone())));
            let seeds = read_seed_file(&path).await?;
            let total = seeds.len();
            let mut imported = 0;

            for seed in seeds {
                let name = seed.person_name.clone();
                match resumes.import(seed).await {
                    Ok(resume) => {
                        imported += 1;
                        app_log!(info, "✅ {} -> /resumes/{}", resume.person_name, resume.slug);
                    }
                    Err(e) => app_log!(info, "❌ Failed to import {}: {:#}", name, e),
                }
            }

            app_log!(info, "Imported {}/{} resumes", imported, total);
        }

        AdminCommand::ExportLeads { output, handled } => {
            let csv = LeadRepository::new(pool).export_csv(handled).await?;
            crate::core::FsOps::write_file_safe(&output, &csv).await?;
            app_log!(info, "✅ Leads written to {}", output.display());
        }

        AdminCommand::Analyze { url } => {
            let state = AppState::from_config(&config, &database)?;
            let report = state.seo.analyze(&url).await?;
            let summary = SeoReportRepository::new(pool).save(&report).await?;

            app_log!(info, "SEO report {} for {}", summary.id, report.final_url);
            app_log!(info, "  Heuristic score: {}", report.heuristics.score);
            match (&report.ai, &report.ai_error) {
                (Some(ai), _) => {
                    app_log!(info, "  AI readability: {}", ai.ai_readability_score);
                    app_log!(info, "  {}", ai.summary);
                }
                (None, Some(reason)) => app_log!(info, "  AI assessment skipped: {}", reason),
                (None, None) => {}
            }
            for issue in &report.heuristics.issues {
                app_log!(info, "  [{:?}] {}: {}", issue.severity, issue.code, issue.message);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::ResumeStore;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        admin: AdminCli,
    }

    #[test]
    fn test_parses_subcommands() {
        let cli = TestCli::parse_from(["konsult", "grant-role", "u1", "admin"]);
        assert!(matches!(
            cli.admin.command,
            AdminCommand::GrantRole { ref user_id, ref role } if user_id == "u1" && role == "admin"
        ));

        let cli = TestCli::parse_from(["konsult", "export-leads", "out.csv", "--handled", "false"]);
        assert!(matches!(
            cli.admin.command,
            AdminCommand::ExportLeads { handled: Some(false), .. }
        ));

        let cli = TestCli::parse_from(["konsult", "set-active", "u1", "false"]);
        assert!(matches!(cli.admin.command, AdminCommand::SetActive { active: false, .. }));
    }

    fn test_config(dir: &std::path::Path) -> ConfigManager {
        config_with_backend(dir, "sqlite")
    }

    fn config_with_backend(dir: &std::path::Path, backend: &'static str) -> ConfigManager {
        ConfigManager::from_sources(dir, None, move |key| match key {
            "AUTH_JWT_SECRET" => Some("cli-secret".to_string()),
            "RESUME_BACKEND" => Some(backend.to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_user_and_role_commands() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        for command in [
            AdminCommand::AddUser {
                user_id: "u1".into(),
                email: "Ada@Example.com".into(),
                display_name: Some("Ada".into()),
            },
            AdminCommand::GrantRole {
                user_id: "u1".into(),
                role: "employee".into(),
            },
            AdminCommand::AddUser {
                user_id: "u9".into(),
                email: "ada@example.com".into(),
                display_name: None,
            },
        ] {
            handle_admin_command(AdminCli { command }, config.clone()).await.unwrap();
        }

        let database = Database::new(&config.environment.database_path).await.unwrap();
        let profile = ProfileRepository::new(database.pool())
            .find("u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.email, "ada@example.com");
        assert!(ProfileRepository::new(database.pool())
            .find("u9")
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            RoleRepository::new(database.pool()).role_for("u1").await.unwrap(),
            Role::Employee
        );
    }

    #[tokio::test]
    async fn test_import_users_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let users = dir.path().join("users.csv");
        std::fs::write(&users, "u1,ada@example.com,admin\nu2,bob@example.com\n,broken\n").unwrap();
        let seeds = dir.path().join("resumes.toml");
        std::fs::write(&seeds, crate::resume::import::SAMPLE_SEEDS).unwrap();

        handle_admin_command(
            AdminCli {
                command: AdminCommand::ImportUsers { csv_file: users },
            },
            config.clone(),
        )
        .await
        .unwrap();
        handle_admin_command(
            AdminCli {
                command: AdminCommand::ImportResume { path: seeds },
            },
            config.clone(),
        )
        .await
        .unwrap();

        let database = Database::new(&config.environment.database_path).await.unwrap();
        assert_eq!(ProfileRepository::new(database.pool()).list().await.unwrap().len(), 2);
        let roles = RoleRepository::new(database.pool());
        assert_eq!(roles.role_for("u1").await.unwrap(), Role::Admin);
        assert_eq!(roles.role_for("u2").await.unwrap(), Role::Member);

        let state = AppState::from_config(&config, &database).unwrap();
        let resumes = state.resumes.list_all(crate::resume::Language::Sv).await.unwrap();
        assert!(!resumes.is_empty());
    }

    #[tokio::test]
    async fn test_import_resume_writes_to_database_with_mock_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_backend(dir.path(), "mock");
        assert_eq!(config.resume_backend, ResumeBackend::Mock);

        let seeds = dir.path().join("resumes.toml");
        std::fs::write(&seeds, crate::resume::import::SAMPLE_SEEDS).unwrap();
        handle_admin_command(
            AdminCli {
                command: AdminCommand::ImportResume { path: seeds },
            },
            config.clone(),
        )
        .await
        .unwrap();

        let database = Database::new(&config.environment.database_path).await.unwrap();
        let stored = SqliteResumeStore::new(database.pool().clone());
        assert_eq!(stored.list().await.unwrap().len(), 2);
        assert!(stored.get_by_slug("anna-berg").await.unwrap().is_some());
    }
}
