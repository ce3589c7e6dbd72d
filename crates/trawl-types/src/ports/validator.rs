//! AI-backed content validator contract (spec §4.13). The LLM API client
//! itself is a Non-goal/external collaborator; this is the seam it plugs into.

use crate::error::Result;
use crate::extraction::ValidationOutcome;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ValidationRequest<'a> {
    pub html: &'a str,
    pub text: &'a str,
    pub markdown: &'a str,
    pub url: &'a str,
    pub task_description: Option<&'a str>,
    pub page_title: Option<&'a str>,
}

#[async_trait]
pub trait ValidatorPort: Send + Sync {
    async fn validate(&self, request: ValidationRequest<'_>) -> Result<ValidationOutcome>;
}
