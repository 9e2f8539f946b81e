#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("GitHub API returned {status} for {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("refusing to follow pagination link {url} outside of {api_url}")]
    ForeignLink { url: String, api_url: String },
    #[error("unexpected response body from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GithubError {
    /// HTTP status of an API error response, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            GithubError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }
}

/// Extract the `message` field of a GitHub error body, falling back to the raw text.
pub(crate) fn api_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(b) => b.message,
        Err(_) => {
            let trimmed = body.trim();
            match trimmed.char_indices().nth(200) {
                Some((idx, _)) => format!("{}...", &trimmed[..idx]),
                None => trimmed.to_string(),
            }
        }
    }
}
