/// Report rendering
///
/// Markdown is the reference layout: Endpoints, Signals, Trades, Market,
/// Balance, Logs Growth, System, Summary. JSON is the serde form of Report.
/// Findings render as `- [TAG] item: message`.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use super::aggregator::{Report, Summary};
use super::finding::{Finding, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}

pub struct Reporter;

impl Reporter {
    pub fn render(report: &Report, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Markdown => Self::markdown(report),
            ReportFormat::Json => {
                serde_json::to_string_pretty(report).context("Failed to serialize report")
            }
        }
    }

    pub fn markdown(report: &Report) -> Result<String> {
        let mut out = String::new();
        write_markdown(&mut out, report).context("Failed to render markdown report")?;
        Ok(out)
    }

    /// Write the rendered report, creating parent directories
    pub fn write_to<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
        }

        fs::write(path, contents)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        Ok(())
    }

    /// One-line colored summary for the terminal
    pub fn summary_line(summary: &Summary) -> String {
        let fail = format!("FAIL: {}", summary.fail);
        let warn = format!("WARN: {}", summary.warn);
        let pass = format!("PASS: {}", summary.pass);

        format!(
            "{}  {}  {}",
            if summary.fail > 0 { fail.red().bold() } else { fail.normal() },
            if summary.warn > 0 { warn.yellow() } else { warn.normal() },
            pass.green()
        )
    }
}

fn write_markdown(out: &mut String, report: &Report) -> fmt::Result {
    writeln!(out, "# Smoketest Report")?;
    writeln!(out)?;
    writeln!(out, "- Time: {}", report.timestamp)?;
    writeln!(out, "- Base URL: {}", report.base_url)?;
    writeln!(out, "- Logs dir: {}", report.logs_dir)?;

    write_section(out, Section::Endpoints, report.findings_in(Section::Endpoints))?;

    for section in Section::BODY_SECTIONS {
        write_section(out, section, report.findings_in(section))?;
    }

    let log_findings: Vec<Finding> = report.log_growth.iter().map(|r| r.to_finding()).collect();
    write_section(out, Section::Logs, log_findings.iter())?;

    writeln!(out)?;
    writeln!(out, "## {}", Section::System.title())?;
    let resources = &report.resources;
    writeln!(out, "- Disk free: {}", fmt_metric(resources.disk_free_gb, " GB"))?;
    writeln!(out, "- CPU: {}", fmt_metric(resources.cpu_percent, "%"))?;
    writeln!(out, "- MEM: {}", fmt_metric(resources.mem_percent, "%"))?;
    write_findings(out, Section::System, report.findings_in(Section::System))?;

    writeln!(out)?;
    writeln!(out, "## Summary")?;
    writeln!(out, "- FAIL: {}", report.summary.fail)?;
    writeln!(out, "- WARN: {}", report.summary.warn)?;
    writeln!(out, "- PASS: {}", report.summary.pass)
}

fn write_section<'a>(
    out: &mut String,
    section: Section,
    findings: impl Iterator<Item = &'a Finding>,
) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "## {}", section.title())?;

    if write_findings(out, section, findings)? == 0 {
        writeln!(out, "- (no findings)")?;
    }

    Ok(())
}

/// Tagged Finding lines; returns how many were written
fn write_findings<'a>(
    out: &mut String,
    section: Section,
    findings: impl Iterator<Item = &'a Finding>,
) -> Result<usize, fmt::Error> {
    let mut written = 0;
    for finding in findings {
        writeln!(out, "- {} {}", section.tag(finding.severity), finding.display_message())?;
        written += 1;
    }
    Ok(written)
}

fn fmt_metric(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.2}{}", v, unit),
        None => "n/a".to_string(),
    }
}
