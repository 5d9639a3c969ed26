//! Final report rendering
//!
//! The report is rendered once per run from the [`CheckOutcome`], whatever
//! stage the run stopped at. The same text goes to the terminal and the run
//! log, so colors are only applied when asked for.

use crate::error::SuggestionEngine;
use crate::i18n::{text, Locale};
use crate::models::CheckOutcome;
use crate::types::StageStatus;
use colored::*;
use std::fmt::Write as _;
use std::path::Path;

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
        }
    }
}

/// Where the run log ended up, for the closing line
#[derive(Debug, Clone, Copy)]
pub enum LogNote<'a> {
    Saved(&'a Path),
    NotSaved,
}

pub struct ReportRenderer {
    locale: Locale,
    use_color: bool,
    color_scheme: ColorScheme,
}

impl ReportRenderer {
    pub fn new(locale: Locale, use_color: bool) -> Self {
        Self {
            locale,
            use_color,
            color_scheme: ColorScheme::default(),
        }
    }

    fn t<'a>(&self, key: &'a str) -> &'a str {
        text(key, self.locale)
    }

    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.use_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.use_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    fn heading(&self, text: &str, color: Color) -> ColoredString {
        if self.use_color {
            text.color(color).bold()
        } else {
            text.normal()
        }
    }

    fn line(&self, out: &mut String, label_key: &str, value: impl std::fmt::Display) {
        let _ = writeln!(out, "{}: {}", self.bold(self.t(label_key)), value);
    }

    /// Render the report for `operation` (`upload` or `download`)
    pub fn render(
        &self,
        operation: &str,
        outcome: &CheckOutcome,
        suggestions: &SuggestionEngine,
        log: LogNote<'_>,
    ) -> String {
        let mut out = String::new();
        let title = format!("==== {} ====", self.t("report.title"));
        let _ = writeln!(out, "{}", self.heading(&title, self.color_scheme.header));

        // Request validation verdict
        let request = if outcome.request_valid() {
            self.colorize(self.t("verdict.passed"), self.color_scheme.success)
        } else {
            self.colorize(self.t("verdict.failed"), self.color_scheme.error)
        };
        self.line(&mut out, "report.request_check", request);

        // Overall verdict
        let overall = if outcome.is_success() {
            self.colorize(self.t("verdict.success"), self.color_scheme.success)
        } else {
            self.colorize(self.t("verdict.failure"), self.color_scheme.error)
        };
        let operation_key = format!("report.{}", operation);
        let _ = writeln!(
            out,
            "{} ({}): {}",
            self.bold(self.t("report.overall")),
            self.t(&operation_key),
            overall
        );

        if outcome.net_status.is_checked() {
            let color = match outcome.net_status {
                crate::types::NetStatus::Reachable => self.color_scheme.success,
                _ => self.color_scheme.warning,
            };
            self.line(
                &mut out,
                "report.network",
                self.colorize(self.t(outcome.net_status.label_key()), color),
            );
        }

        if let Some(endpoint) = &outcome.endpoint {
            self.line(
                &mut out,
                "report.endpoint",
                format!("{} ({})", endpoint.endpoint, self.t(endpoint.source.label_key())),
            );
        }

        let stages = outcome
            .stages
            .iter()
            .map(|r| {
                let status = self.t(r.status.label_key());
                let status = match r.status {
                    StageStatus::Passed => self.colorize(status, self.color_scheme.success),
                    StageStatus::Failed => self.colorize(status, self.color_scheme.error),
                    _ => self.colorize(status, self.color_scheme.muted),
                };
                format!("{}={}", r.stage.name(), status)
            })
            .collect::<Vec<_>>()
            .join(", ");
        self.line(&mut out, "report.stages", stages);

        if let Some(detail) = &outcome.detail {
            self.line(&mut out, "report.object", &detail.name);
            self.line(&mut out, "report.size", format_bytes(detail.size_bytes));
            self.line(&mut out, "report.elapsed", format_duration(detail.elapsed_ms));
            if let Some(rate) = detail.throughput_bytes_per_sec() {
                let rate = format!("{}/s", format_bytes(rate as u64));
                self.line(&mut out, "report.throughput", rate);
            }
        }

        let error_text = outcome.error.as_deref().unwrap_or("");
        if !outcome.is_success() {
            let heading = self.heading(self.t("report.detail"), self.color_scheme.error);
            let _ = writeln!(out, "{}:", heading);
            let _ = writeln!(out, "  {}: {}", self.t("report.code"), outcome.code);
            let _ = writeln!(out, "  {}: {}", self.t("report.error"), error_text);
        }

        let suggestion = suggestions.suggest(&outcome.code, error_text);
        let suggestion = self.colorize(&suggestion, self.color_scheme.info);
        self.line(&mut out, "report.suggestion", suggestion);

        if let Some(response) = &outcome.response {
            if let Some(id) = &response.request_id {
                self.line(&mut out, "report.request_id", id);
            }
            if let Some(id) = &response.debug_id {
                self.line(&mut out, "report.debug_id", id);
            }
        }

        match log {
            LogNote::Saved(path) => {
                let _ = writeln!(out, "{} {}", self.t("report.log_saved"), path.display());
            }
            LogNote::NotSaved => {
                let note = self.colorize(self.t("report.log_not_saved"), self.color_scheme.warning);
                let _ = writeln!(out, "{}", note);
            }
        }

        out
    }
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Format duration in human-readable format
pub fn format_duration(duration_ms: u64) -> String {
    if duration_ms < 1000 {
        format!("{}ms", duration_ms)
    } else if duration_ms < 60_000 {
        format!("{:.1}s", duration_ms as f64 / 1000.0)
    } else {
        let minutes = duration_ms / 60_000;
        let seconds = (duration_ms % 60_000) as f64 / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}
