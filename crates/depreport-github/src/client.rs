use std::fmt;

use depreport_core::{
    Affiliation, Alert, AlertFetch, AlertSource, Repositories, RepositoryDescriptor, SourceError,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{api_message, GithubError};
use crate::pages::{next_link, Paginated};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("dependabot-report/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: u32 = 100;

// ── Builder ──

pub struct GithubClientBuilder {
    token: String,
    api_url: String,
    proxy_from_env: bool,
}

impl GithubClientBuilder {
    /// Base URL of the REST API, e.g. `https://ghe.example.com/api/v3`.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Whether `HTTP(S)_PROXY`/`ALL_PROXY` are honored (default: yes).
    pub fn proxy_from_env(mut self, enabled: bool) -> Self {
        self.proxy_from_env = enabled;
        self
    }

    pub fn build(self) -> GithubClient {
        let mut config = ureq::Agent::config_builder().http_status_as_error(false);
        if !self.proxy_from_env {
            config = config.proxy(None);
        }
        GithubClient {
            agent: config.build().new_agent(),
            api_url: self.api_url.trim_end_matches('/').to_string(),
            token: self.token,
        }
    }
}

// ── Client ──

/// Authenticated user as returned by `GET /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

pub(crate) struct Page {
    pub body: String,
    pub next: Option<String>,
}

/// Blocking client for the REST endpoints the report needs.
pub struct GithubClient {
    agent: ureq::Agent,
    api_url: String,
    token: String,
}

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GithubClient {
    pub fn builder(token: impl Into<String>) -> GithubClientBuilder {
        GithubClientBuilder {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            proxy_from_env: true,
        }
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self::builder(token).build()
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub(crate) fn get_page(&self, url: &str) -> Result<Page, GithubError> {
        debug!("GET {url}");
        let mut request = self
            .agent
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT);
        if !self.token.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.token));
        }
        let mut response = request.call().map_err(|source| GithubError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status().as_u16();
        let next = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|source| GithubError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !(200..300).contains(&status) {
            return Err(GithubError::Status {
                status,
                url: url.to_string(),
                message: api_message(&body),
            });
        }
        Ok(Page { body, next })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GithubError> {
        let page = self.get_page(url)?;
        serde_json::from_str(&page.body).map_err(|source| GithubError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// `GET /user`
    pub fn authenticated_user(&self) -> Result<User, GithubError> {
        self.get_json(&format!("{}/user", self.api_url))
    }

    /// `GET /user/repos`, sorted by full name ascending, fetched page by page.
    pub fn list_repositories(
        &self,
        affiliation: &Affiliation,
    ) -> Paginated<'_, RepositoryDescriptor> {
        let url = format!(
            "{}/user/repos?affiliation={}&sort=full_name&direction=asc&per_page={PER_PAGE}",
            self.api_url,
            affiliation.as_query()
        );
        Paginated::new(self, url)
    }

    /// `GET /repos/{full_name}/dependabot/alerts?state=open`, all pages.
    pub fn open_dependabot_alerts(&self, full_name: &str) -> Result<Vec<Alert>, GithubError> {
        let url = format!(
            "{}/repos/{full_name}/dependabot/alerts?state=open&per_page={PER_PAGE}",
            self.api_url
        );
        Paginated::new(self, url).collect()
    }
}

/// Map an alert query result onto the aggregation outcome; 403 means disabled.
pub fn alert_fetch(result: Result<Vec<Alert>, GithubError>) -> AlertFetch {
    match result {
        Ok(alerts) => AlertFetch::Alerts(alerts),
        Err(e) if e.is_forbidden() => {
            debug!("Alerts refused: {e}");
            AlertFetch::Disabled
        }
        Err(e) => AlertFetch::Failed(Box::new(e)),
    }
}

impl AlertSource for GithubClient {
    fn authenticated_login(&self) -> Result<String, SourceError> {
        Ok(self.authenticated_user()?.login)
    }

    fn repositories<'a>(&'a self, affiliation: &Affiliation) -> Repositories<'a> {
        Box::new(
            self.list_repositories(affiliation)
                .map(|r| r.map_err(|e| Box::new(e) as SourceError)),
        )
    }

    fn open_alerts(&self, repo: &RepositoryDescriptor) -> AlertFetch {
        alert_fetch(self.open_dependabot_alerts(&repo.full_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> GithubError {
        GithubError::Status {
            status: code,
            url: "https://api.github.com/repos/a/b/dependabot/alerts".into(),
            message: "nope".into(),
        }
    }

    #[test]
    fn forbidden_maps_to_disabled() {
        assert!(matches!(alert_fetch(Err(status(403))), AlertFetch::Disabled));
    }

    #[test]
    fn other_statuses_are_failures() {
        for code in [401, 404, 422, 500, 502] {
            match alert_fetch(Err(status(code))) {
                AlertFetch::Failed(e) => {
                    let gh = e.downcast_ref::<GithubError>().unwrap();
                    assert_eq!(gh.status(), Some(code));
                }
                other => panic!("{code}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn ok_maps_to_alerts() {
        match alert_fetch(Ok(Vec::new())) {
            AlertFetch::Alerts(a) => assert!(a.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let client = GithubClient::builder("t")
            .api_url("https://ghe.example.com/api/v3/")
            .build();
        assert_eq!(client.api_url(), "https://ghe.example.com/api/v3");
        assert_eq!(GithubClient::new("t").api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn debug_redacts_token() {
        let client = GithubClient::new("ghp_secret");
        let dbg = format!("{client:?}");
        assert!(!dbg.contains("ghp_secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
