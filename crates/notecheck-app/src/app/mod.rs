//! Use cases

mod inference_service;
mod query_service;

pub use inference_service::InferenceService;
pub use query_service::{dashboard, find_record_upload, history};
