/// Report aggregation
///
/// Folds every Finding of a run exactly once into the Summary and assembles the
/// immutable Report. Total over its inputs: there is no failure path here.

use serde::{Deserialize, Serialize};

use super::finding::{Finding, Section, SectionResult, Severity};
use super::log_growth::LogGrowthRecord;
use super::resources::ResourceSnapshot;

/// Run metadata captured once by the runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub timestamp: String,
    pub base_url: String,
    pub logs_dir: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub fail: usize,
    pub warn: usize,
    pub pass: usize,
}

impl Summary {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Ok => self.pass += 1,
            Severity::Warn => self.warn += 1,
            Severity::Fail => self.fail += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.fail + self.warn + self.pass
    }

    /// WARN alone never fails a run
    pub fn has_failures(&self) -> bool {
        self.fail > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub timestamp: String,
    pub base_url: String,
    pub logs_dir: String,
    pub sections: Vec<SectionResult>,
    pub log_growth: Vec<LogGrowthRecord>,
    pub resources: ResourceSnapshot,
    /// WARNs for host metrics that were unavailable
    #[serde(default)]
    pub system: Vec<Finding>,
    pub summary: Summary,
}

impl Report {
    /// Findings of one report section, across endpoints, in endpoint order.
    /// Log growth records are kept apart in `log_growth`.
    pub fn findings_in(&self, section: Section) -> impl Iterator<Item = &Finding> + '_ {
        self.sections
            .iter()
            .flat_map(|s| s.findings.iter())
            .chain(self.system.iter())
            .filter(move |f| f.section == section)
    }

    pub fn finding_count(&self) -> usize {
        self.sections.iter().map(|s| s.findings.len()).sum::<usize>() + self.log_growth.len() + self.system.len()
    }
}

pub fn aggregate(
    context: RunContext,
    sections: Vec<SectionResult>,
    log_growth: Vec<LogGrowthRecord>,
    resources: ResourceSnapshot,
) -> Report {
    let mut summary = Summary::default();
    let system = resources.findings();

    sections
        .iter()
        .flat_map(|s| s.findings.iter().map(|f| f.severity))
        .chain(log_growth.iter().map(|r| r.status))
        .chain(system.iter().map(|f| f.severity))
        .for_each(|severity| summary.record(severity));

    Report {
        timestamp: context.timestamp,
        base_url: context.base_url,
        logs_dir: context.logs_dir,
        sections,
        log_growth,
        resources,
        system,
        summary,
    }
}
