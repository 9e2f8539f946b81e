//! Repository enumeration → alert collection → namespace grouping.
//!
//! The walk is strictly sequential: one repository at a time, in the order the
//! source delivers them. A repository whose alerts are disabled is recorded and
//! skipped over; every other failure aborts the run.

use tracing::{debug, info, warn};

use crate::affiliation::Affiliation;
use crate::context::RunContext;
use crate::source::{AlertFetch, AlertSource, SourceError};
use crate::types::{Alert, HtmlFilter, NamespaceGroup, RepositoryResult, Severity};

// ── Options & Errors ──

/// Which repositories take part in a run.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub affiliation: Affiliation,
    /// Owner logins whose repositories are skipped entirely.
    pub exclude_owners: Vec<String>,
    pub exclude_forks: bool,
}

impl AggregateOptions {
    pub fn new(affiliation: Affiliation) -> Self {
        Self {
            affiliation,
            exclude_owners: Vec::new(),
            exclude_forks: false,
        }
    }

    fn is_owner_excluded(&self, login: &str) -> bool {
        self.exclude_owners.iter().any(|o| o == login)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("authentication to GitHub failed")]
    Authentication(#[source] SourceError),
    #[error("failed to list repositories")]
    Repositories(#[source] SourceError),
    #[error("failed to fetch Dependabot alerts of '{repo}'")]
    Alerts {
        repo: String,
        #[source]
        source: SourceError,
    },
    #[error("alert #{number} of '{repo}' has unknown severity '{severity}'")]
    UnknownSeverity {
        repo: String,
        number: u64,
        severity: String,
    },
    #[error("alert #{number} of '{repo}' carries no severity")]
    MissingSeverity { repo: String, number: u64 },
}

// ── Pipeline ──

/// Collect open alerts of every eligible repository into a [`RunContext`].
///
/// The returned context is not yet finished; callers stamp it with
/// [`RunContext::finish`] once they stop the clock.
pub fn get_dependabot_data<S: AlertSource + ?Sized>(
    source: &S,
    options: &AggregateOptions,
) -> Result<RunContext, AggregateError> {
    let login = source
        .authenticated_login()
        .map_err(AggregateError::Authentication)?;
    info!("Authentication to GitHub successful - authenticated as '{login}'.");

    let mut namespaces: Vec<NamespaceGroup> = Vec::new();
    for repo in source.repositories(&options.affiliation) {
        let repo = repo.map_err(AggregateError::Repositories)?;
        let namespace = repo.owner.login.as_str();
        if options.is_owner_excluded(namespace) {
            debug!("Skip '{namespace}' based on GitHub owner filter.");
            continue;
        }

        let idx = match namespaces.iter().position(|ns| ns.login == namespace) {
            Some(idx) => idx,
            None => {
                namespaces.push(NamespaceGroup::new(&repo.owner));
                namespaces.len() - 1
            }
        };

        if options.exclude_forks && repo.fork {
            debug!("Skip repository '{}' because it's a fork.", repo.full_name);
            continue;
        }

        let mut detail = RepositoryResult::new(&repo);
        match source.open_alerts(&repo) {
            AlertFetch::Alerts(alerts) => {
                for alert in alerts {
                    record_alert(&mut detail, alert)?;
                }
            }
            AlertFetch::Disabled => {
                warn!(
                    "Dependabot alerts of '{}' are not accessible, most likely disabled.",
                    repo.full_name
                );
                detail.alerts_error = true;
                detail.html_filters.insert(HtmlFilter::RepoError);
            }
            AlertFetch::Failed(err) => {
                return Err(AggregateError::Alerts {
                    repo: repo.full_name.clone(),
                    source: err,
                });
            }
        }

        if detail.alerts.is_empty() {
            detail.html_filters.insert(HtmlFilter::RepoEmpty);
        }
        if detail.fork {
            detail.html_filters.insert(HtmlFilter::RepoFork);
        }
        debug!(
            "Repository '{}': {} open alert(s).",
            detail.full_name,
            detail.alerts.len()
        );
        let repos = &mut namespaces[idx].repos;
        match repos.iter().position(|r| r.full_name == detail.full_name) {
            Some(pos) => {
                debug!(
                    "Repository '{}' listed twice; keeping the latest result.",
                    detail.full_name
                );
                repos[pos] = detail;
            }
            None => repos.push(detail),
        }
    }

    Ok(RunContext::new(namespaces))
}

/// Store `alert` under its number and count it once.
fn record_alert(detail: &mut RepositoryResult, alert: Alert) -> Result<(), AggregateError> {
    let raw = alert.severity().ok_or_else(|| AggregateError::MissingSeverity {
        repo: detail.full_name.clone(),
        number: alert.number,
    })?;
    let severity: Severity = raw.parse().map_err(|_| AggregateError::UnknownSeverity {
        repo: detail.full_name.clone(),
        number: alert.number,
        severity: raw.to_string(),
    })?;
    if detail.alert(alert.number).is_some() {
        debug!(
            "Alert #{} of '{}' delivered twice; keeping the first.",
            alert.number, detail.full_name
        );
        return Ok(());
    }
    detail.alerts_stats.increment(severity);
    detail.alerts.push(alert);
    Ok(())
}
