use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Remote Records ──

/// Account owning a repository (user or organization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// `User` or `Organization`, as reported by the API.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// A repository accessible to the authenticated identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub full_name: String,
    #[serde(default)]
    pub name: String,
    pub owner: Owner,
    #[serde(default)]
    pub fork: bool,
    pub html_url: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub ecosystem: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(default)]
    pub package: Option<Package>,
    #[serde(default)]
    pub manifest_path: Option<String>,
}

/// Weakness identifier referenced by an advisory, e.g. `CWE-79`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cwe {
    pub cwe_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityAdvisory {
    #[serde(default)]
    pub ghsa_id: String,
    #[serde(default)]
    pub cve_id: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub cwes: Vec<Cwe>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchedVersion {
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityVulnerability {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub vulnerable_version_range: Option<String>,
    #[serde(default)]
    pub first_patched_version: Option<PatchedVersion>,
}

/// One open Dependabot alert. `number` is unique within its repository only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub number: u64,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub dependency: Option<Dependency>,
    #[serde(default)]
    pub security_advisory: Option<SecurityAdvisory>,
    #[serde(default)]
    pub security_vulnerability: Option<SecurityVulnerability>,
}

impl Alert {
    /// Raw severity string as delivered: the advisory's, else the vulnerability's.
    pub fn severity(&self) -> Option<&str> {
        self.security_advisory
            .as_ref()
            .and_then(|a| a.severity.as_deref())
            .or_else(|| {
                self.security_vulnerability
                    .as_ref()
                    .and_then(|v| v.severity.as_deref())
            })
    }

    /// CWE identifiers of the advisory; empty without an advisory.
    pub fn cwe_ids(&self) -> impl Iterator<Item = &str> {
        self.security_advisory
            .iter()
            .flat_map(|a| a.cwes.iter())
            .map(|c| c.cwe_id.as_str())
    }

    /// `ecosystem/name` of the affected package, when known.
    pub fn package_label(&self) -> Option<String> {
        let pkg = self.dependency.as_ref()?.package.as_ref()?;
        Some(format!("{}/{}", pkg.ecosystem, pkg.name))
    }
}

// ── Severity ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; anything outside the four known buckets is rejected.
impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// Open alert counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityStats {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl SeverityStats {
    pub fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn total(&self) -> u64 {
        self.critical + self.high + self.medium + self.low
    }
}

// ── Display Tags ──

/// Categorical tag a report uses to filter repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HtmlFilter {
    #[serde(rename = "github-repo-error")]
    RepoError,
    #[serde(rename = "github-repo-empty")]
    RepoEmpty,
    #[serde(rename = "github-repo-fork")]
    RepoFork,
}

impl HtmlFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            HtmlFilter::RepoError => "github-repo-error",
            HtmlFilter::RepoEmpty => "github-repo-empty",
            HtmlFilter::RepoFork => "github-repo-fork",
        }
    }
}

impl fmt::Display for HtmlFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Aggregated Records ──

/// Findings collected for one repository during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryResult {
    pub full_name: String,
    /// Keyed by alert number, in delivery order.
    pub alerts: Vec<Alert>,
    pub alerts_error: bool,
    pub alerts_stats: SeverityStats,
    pub fork: bool,
    pub html_url: String,
    pub html_filters: BTreeSet<HtmlFilter>,
}

impl RepositoryResult {
    pub fn new(repo: &RepositoryDescriptor) -> Self {
        Self {
            full_name: repo.full_name.clone(),
            alerts: Vec::new(),
            alerts_error: false,
            alerts_stats: SeverityStats::default(),
            fork: repo.fork,
            html_url: repo.html_url.clone(),
            html_filters: BTreeSet::new(),
        }
    }

    pub fn alert(&self, number: u64) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.number == number)
    }

    pub fn has_filter(&self, filter: HtmlFilter) -> bool {
        self.html_filters.contains(&filter)
    }

    /// Space-separated tag list, suitable for a CSS `class` attribute.
    pub fn filter_classes(&self) -> String {
        self.html_filters
            .iter()
            .map(HtmlFilter::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// All processed repositories of one owner, in processing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceGroup {
    pub login: String,
    pub owner: Owner,
    pub repos: Vec<RepositoryResult>,
}

impl NamespaceGroup {
    pub fn new(owner: &Owner) -> Self {
        Self {
            login: owner.login.clone(),
            owner: owner.clone(),
            repos: Vec::new(),
        }
    }

    pub fn repo(&self, full_name: &str) -> Option<&RepositoryResult> {
        self.repos.iter().find(|r| r.full_name == full_name)
    }

    pub fn stats(&self) -> SeverityStats {
        let mut out = SeverityStats::default();
        for repo in &self.repos {
            out.critical += repo.alerts_stats.critical;
            out.high += repo.alerts_stats.high;
            out.medium += repo.alerts_stats.medium;
            out.low += repo.alerts_stats.low;
        }
        out
    }
}
