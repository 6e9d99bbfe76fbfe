// src/core/mod.rs
//! Core services shared by the web server and the admin CLI

pub mod database;
pub mod fs_ops;
pub mod llm_client;
pub mod storage;

pub use database::Database;
pub use fs_ops::FsOps;
pub use llm_client::LlmClient;
pub use storage::{Bucket, Storage, StoredObject, PUBLIC_PREFIX};
