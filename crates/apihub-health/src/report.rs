//! Health report assembly and rendering

use apihub_core::HealthCheckResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Overall verdict of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

/// Result of one sweep over the selected services
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub status: OverallStatus,
    pub total_checks: usize,
    pub healthy_count: usize,
    pub unhealthy_count: usize,
    pub checks: BTreeMap<String, HealthCheckResult>,
}

impl HealthReport {
    pub fn new(checks: BTreeMap<String, HealthCheckResult>) -> Self {
        let healthy_count = checks.values().filter(|r| r.healthy).count();
        let unhealthy_count = checks.len() - healthy_count;

        Self {
            timestamp: Utc::now(),
            status: if unhealthy_count == 0 {
                OverallStatus::Healthy
            } else {
                OverallStatus::Degraded
            },
            total_checks: checks.len(),
            healthy_count,
            unhealthy_count,
            checks,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == OverallStatus::Healthy
    }

    /// One line per service followed by a summary
    pub fn render_text(&self) -> String {
        let width = self.checks.keys().map(String::len).max().unwrap_or(0);
        let mut out = String::new();

        for (name, result) in &self.checks {
            let marker = if result.healthy { " OK " } else { "FAIL" };
            let status = result
                .status_code
                .map(|s| s.to_string())
                .unwrap_or_else(|| "---".to_string());

            let _ = write!(
                out,
                "[{}] {:<width$}  {}  {:>8.1}ms",
                marker,
                name,
                status,
                result.latency_ms,
                width = width
            );
            if let Some(error) = &result.error {
                let _ = write!(out, "  {}", first_line(error));
            }
            out.push('\n');
        }

        let _ = writeln!(
            out,
            "{}: {}/{} services healthy",
            match self.status {
                OverallStatus::Healthy => "HEALTHY",
                OverallStatus::Degraded => "DEGRADED",
            },
            self.healthy_count,
            self.total_checks
        );
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
