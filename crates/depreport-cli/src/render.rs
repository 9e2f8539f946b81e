//! HTML report rendering.
//!
//! A template is a complete HTML page with marker comments where generated
//! content goes. Only `<!-- depreport:namespaces -->` is mandatory.

use std::path::{Path, PathBuf};

use depreport_core::{
    has_cisa_cwe, has_owasp_cwe, Alert, NamespaceGroup, RepositoryResult, RunContext, Severity,
    SeverityStats,
};

// ── Template ──

pub const NAMESPACES_MARKER: &str = "<!-- depreport:namespaces -->";
pub const MTIME_MARKER: &str = "<!-- depreport:report_mtime -->";
pub const TIMING_MARKER: &str = "<!-- depreport:timing_sec -->";
pub const SUMMARY_MARKER: &str = "<!-- depreport:summary -->";

const BUILTIN_TEMPLATE: &str = include_str!("../templates/dependabot_report.html");

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read template '{}'", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template '{name}' lacks the <!-- depreport:namespaces --> marker")]
    MissingMarker { name: String },
}

pub struct Template {
    name: String,
    text: String,
}

impl Template {
    pub fn builtin() -> Self {
        Self {
            name: "<builtin>".to_string(),
            text: BUILTIN_TEMPLATE.to_string(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, RenderError> {
        let text = std::fs::read_to_string(path).map_err(|source| RenderError::Template {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.display().to_string();
        if !text.contains(NAMESPACES_MARKER) {
            return Err(RenderError::MissingMarker { name });
        }
        Ok(Self { name, text })
    }

    /// Template at `path`, or the built-in one.
    pub fn load(path: Option<&Path>) -> Result<Self, RenderError> {
        match path {
            Some(p) => {
                tracing::debug!("Template file name: '{}'.", p.display());
                Self::from_file(p)
            }
            None => Ok(Self::builtin()),
        }
    }
}

/// Fill `template` with the report for `ctx`.
pub fn render(template: &Template, ctx: &RunContext) -> Result<String, RenderError> {
    if !template.text.contains(NAMESPACES_MARKER) {
        return Err(RenderError::MissingMarker {
            name: template.name.clone(),
        });
    }
    let mtime = ctx.report_mtime.as_deref().unwrap_or("-");
    Ok(template
        .text
        .replace(MTIME_MARKER, &escape_html(mtime))
        .replace(TIMING_MARKER, &escape_html(&ctx.timing_sec))
        .replace(SUMMARY_MARKER, &render_summary(ctx))
        .replace(NAMESPACES_MARKER, &render_namespaces(ctx)))
}

// ── Sections ──

fn render_summary(ctx: &RunContext) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<p class=\"summary\">{} namespace(s), {} repositories, {} open alert(s)</p>\n",
        ctx.namespaces.len(),
        ctx.repo_count(),
        ctx.stats().total()
    ));
    out.push_str(&render_stats(&ctx.stats()));
    out
}

fn render_namespaces(ctx: &RunContext) -> String {
    if ctx.namespaces.is_empty() {
        return "<p class=\"empty\">No repositories matched.</p>\n".to_string();
    }
    let mut out = String::new();
    out.push_str("<nav class=\"toc\"><ul>\n");
    for ns in &ctx.namespaces {
        out.push_str(&format!(
            "<li><a href=\"#ns-{id}\">{login}</a></li>\n",
            id = escape_html(&ns.login),
            login = escape_html(&ns.login)
        ));
    }
    out.push_str("</ul></nav>\n");
    for ns in &ctx.namespaces {
        render_namespace(&mut out, ns);
    }
    out
}

fn render_namespace(out: &mut String, ns: &NamespaceGroup) {
    let login = escape_html(&ns.login);
    out.push_str(&format!("<section class=\"namespace\" id=\"ns-{login}\">\n"));
    match ns.owner.html_url.as_deref() {
        Some(url) => out.push_str(&format!(
            "<h2><a href=\"{}\">{login}</a></h2>\n",
            escape_html(url)
        )),
        None => out.push_str(&format!("<h2>{login}</h2>\n")),
    }
    out.push_str(&render_stats(&ns.stats()));
    if ns.repos.is_empty() {
        out.push_str("<p class=\"empty\">No repositories reported.</p>\n");
    }
    for repo in &ns.repos {
        render_repo(out, repo);
    }
    out.push_str("</section>\n");
}

fn render_repo(out: &mut String, repo: &RepositoryResult) {
    let mut classes = String::from("repo");
    if !repo.html_filters.is_empty() {
        classes.push(' ');
        classes.push_str(&repo.filter_classes());
    }
    out.push_str(&format!(
        "<div class=\"{classes}\">\n<h3><a href=\"{}\">{}</a></h3>\n",
        escape_html(&repo.html_url),
        escape_html(&repo.full_name)
    ));
    if repo.alerts_error {
        out.push_str(
            "<p class=\"error\">Dependabot alerts are not accessible; most likely Dependabot is disabled.</p>\n",
        );
    } else if repo.alerts.is_empty() {
        out.push_str("<p class=\"empty\">No open alerts.</p>\n");
    } else {
        out.push_str(&render_stats(&repo.alerts_stats));
        out.push_str(
            "<table class=\"alerts\">\n<thead><tr><th>#</th><th>Severity</th><th>Package</th><th>Summary</th><th>CWE</th></tr></thead>\n<tbody>\n",
        );
        for alert in &repo.alerts {
            render_alert(out, alert);
        }
        out.push_str("</tbody>\n</table>\n");
    }
    out.push_str("</div>\n");
}

fn render_alert(out: &mut String, alert: &Alert) {
    let severity = alert.severity().unwrap_or("").to_lowercase();
    let summary = alert
        .security_advisory
        .as_ref()
        .map(|a| a.summary.as_str())
        .unwrap_or("");
    let package = alert.package_label().unwrap_or_default();

    let mut cwes = alert
        .cwe_ids()
        .map(escape_html)
        .collect::<Vec<_>>()
        .join(", ");
    if has_cisa_cwe(alert) {
        cwes.push_str(" <span class=\"badge cisa\">CISA KEV</span>");
    }
    if has_owasp_cwe(alert) {
        cwes.push_str(" <span class=\"badge owasp\">OWASP</span>");
    }

    out.push_str(&format!(
        "<tr class=\"severity-{sev}\"><td><a href=\"{url}\">{number}</a></td><td>{sev}</td><td>{package}</td><td>{summary}</td><td>{cwes}</td></tr>\n",
        sev = escape_html(&severity),
        url = escape_html(&alert.html_url),
        number = alert.number,
        package = escape_html(&package),
        summary = escape_html(summary),
    ));
}

fn render_stats(stats: &SeverityStats) -> String {
    let mut out = String::from("<ul class=\"stats\">");
    for severity in Severity::ALL {
        out.push_str(&format!(
            "<li class=\"severity-{sev}\">{sev}: {count}</li>",
            sev = severity,
            count = stats.get(severity)
        ));
    }
    out.push_str("</ul>\n");
    out
}

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
