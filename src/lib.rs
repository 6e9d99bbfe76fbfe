//! Back-office and public API for a consultancy website: CMS, leads,
//! localized block-based resumes and an SEO/readability auditor.

pub mod admin_cli;
pub mod auth;
pub mod cms;
pub mod config;
pub mod core;
pub mod leads;
pub mod resume;
pub mod seo;
pub mod types;
pub mod utils;
pub mod web;

pub use config::ConfigManager;
pub use web::{build_rocket, start_web_server, AppState};

/// Log through `tracing` under the crate's fixed target
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!(target: "konsult", $($arg)+)
    };
}
