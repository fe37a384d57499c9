pub mod discover;
pub mod error;
pub mod history;
pub mod indicators;
pub mod ingest;
pub mod pipeline;
pub mod process;
pub mod roles;
pub mod store;

pub use error::{SurveyError, SurveyResult};
