// src/types/mod.rs
pub mod errors;

pub use errors::DomainError;
