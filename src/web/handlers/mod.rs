pub mod cms_handlers;
pub mod lead_handlers;
pub mod public_handlers;
pub mod resume_handlers;
pub mod seo_handlers;
pub mod system_handlers;

pub use seo_handlers::AnalyzeResult;
