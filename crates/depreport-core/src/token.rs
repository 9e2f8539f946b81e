//! GitHub token lookup from a `<provider>:<path>` specifier.
//!
//! Supported providers:
//! - `file:<path>`: trimmed contents of a local file
//! - `env:<name>`: trimmed value of an environment variable, empty if unset

use std::io;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenProviderError {
    #[error("GitHub Token Provider is empty")]
    EmptyProvider,
    #[error("GitHub Token Path is empty")]
    EmptyPath,
    #[error("GitHub Token Provider '{0}' is not supported")]
    Unsupported(String),
    #[error("Error reading GitHub Token from '{path}': {reason}")]
    Read { path: String, reason: String },
}

/// Resolve the token described by `spec`.
pub fn get_github_token(spec: &str) -> Result<String, TokenProviderError> {
    let (provider, path) = spec.split_once(':').unwrap_or((spec, ""));
    let provider = provider.to_lowercase();
    if provider.is_empty() {
        return Err(TokenProviderError::EmptyProvider);
    }
    if path.is_empty() {
        return Err(TokenProviderError::EmptyPath);
    }

    let token = match provider.as_str() {
        "file" => std::fs::read_to_string(path).map_err(|e| TokenProviderError::Read {
            path: path.to_string(),
            reason: os_reason(&e),
        })?,
        "env" => std::env::var(path).unwrap_or_default(),
        _ => return Err(TokenProviderError::Unsupported(provider)),
    };
    Ok(token.trim().to_string())
}

/// OS description of an I/O failure, without the ` (os error N)` suffix.
fn os_reason(err: &io::Error) -> String {
    let msg = err.to_string();
    match msg.rfind(" (os error ") {
        Some(idx) if msg.ends_with(')') => msg[..idx].to_string(),
        _ => msg,
    }
}
