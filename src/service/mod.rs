//! Analysis service boundary.
//!
//! The controller only sees [`AnalysisBackend`]; [`ServiceClient`] is the HTTP implementation.

mod client;
mod error;

pub use client::ServiceClient;
pub use error::{ServiceError, FALLBACK_MESSAGE};

use crate::model::{AnalysisRequest, AnalysisResult};
use async_trait::async_trait;

/// Something that can resolve one analysis request into a result or a failure.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ServiceError>;
}
