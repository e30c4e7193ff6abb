//! Upstream model abstraction.

use crate::error::UpstreamError;

/// A language model that answers a prompt with free-form text.
#[cfg_attr(test, mockall::automock)]
pub trait ModelClient {
    /// Send the system instruction and user prompt, returning the first candidate's text.
    fn generate(&self, system_instruction: &str, prompt: &str) -> Result<String, UpstreamError>;
}
