// src/resume/mod.rs
//! Localized, block-based consultant resumes

pub mod blocks;
pub mod document;
pub mod import;
pub mod localized;
pub mod projection;
pub mod service;
pub mod store;

pub use blocks::{assign_block_ids, BlockContent, BlockId, ResumeBlock};
pub use document::{BlockEdit, Direction, EditOutcome, Resume, ResumeEditError};
pub use localized::{Language, LocalizedText};
pub use projection::{project, project_resume, ProjectionMode, RenderedBlock, RenderedResume};
pub use service::{NewResume, ResumeMetaUpdate, ResumeService, ResumeSummary};
pub use store::{MockResumeStore, ResumeStore, SqliteResumeStore};
