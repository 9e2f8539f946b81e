use std::time::{Duration, Instant};

use serde::Serialize;
use time::OffsetDateTime;

use crate::types::{NamespaceGroup, SeverityStats};

/// `%Y-%m-%d %H:%M:%S%z`
const MTIME_FORMAT: &str =
    "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]";

/// Everything a report renderer needs from one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunContext {
    /// Keyed by owner login, in first-seen order.
    pub namespaces: Vec<NamespaceGroup>,
    /// Unset until [`RunContext::finish`] is called.
    pub report_mtime: Option<String>,
    pub timing_sec: String,
}

impl RunContext {
    pub fn new(namespaces: Vec<NamespaceGroup>) -> Self {
        Self {
            namespaces,
            report_mtime: None,
            timing_sec: "0".to_string(),
        }
    }

    pub fn namespace(&self, login: &str) -> Option<&NamespaceGroup> {
        self.namespaces.iter().find(|ns| ns.login == login)
    }

    pub fn repo_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.repos.len()).sum()
    }

    pub fn stats(&self) -> SeverityStats {
        let mut out = SeverityStats::default();
        for ns in &self.namespaces {
            let s = ns.stats();
            out.critical += s.critical;
            out.high += s.high;
            out.medium += s.medium;
            out.low += s.low;
        }
        out
    }

    /// Stamp completion time and elapsed wall-clock time since `started`.
    pub fn finish(&mut self, started: Instant) {
        self.finish_at(OffsetDateTime::now_utc(), started.elapsed());
    }

    fn finish_at(&mut self, now: OffsetDateTime, elapsed: Duration) {
        self.report_mtime = Some(format_mtime(now));
        self.timing_sec = format_timing(elapsed);
    }
}

fn format_mtime(dt: OffsetDateTime) -> String {
    let format =
        time::format_description::parse(MTIME_FORMAT).expect("mtime format description is valid");
    dt.format(&format)
        .expect("mtime formatting should not fail")
}

fn format_timing(elapsed: Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64())
}
