/// Findings: the classified observations every check produces
///
/// A run never aborts on a failed check. Each check returns Findings and the
/// aggregator counts them.

use serde::{Deserialize, Serialize};

/// Severity of a Finding, ordered by increasing concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Warn,
    Fail,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warn => "WARN",
            Severity::Fail => "FAIL",
        }
    }
}

/// Report grouping a Finding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Endpoints,
    Signals,
    Trades,
    Market,
    Balance,
    Logs,
    System,
}

impl Section {
    /// Body sections in rendering order (Endpoints and Logs are rendered separately)
    pub const BODY_SECTIONS: [Section; 4] = [
        Section::Signals,
        Section::Trades,
        Section::Market,
        Section::Balance,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Endpoints => "Endpoints",
            Section::Signals => "Signals",
            Section::Trades => "Trades",
            Section::Market => "Market",
            Section::Balance => "Balance",
            Section::Logs => "Logs Growth",
            Section::System => "System",
        }
    }

    /// Tag printed in front of a failing Finding.
    /// Reachability failures read `[FAIL]`, content failures read `[ISSUE]`.
    pub fn tag(&self, severity: Severity) -> &'static str {
        match (severity, self) {
            (Severity::Ok, _) => "[OK]",
            (Severity::Warn, _) => "[WARN]",
            (Severity::Fail, Section::Endpoints | Section::Logs) => "[FAIL]",
            (Severity::Fail, _) => "[ISSUE]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub section: Section,
    pub severity: Severity,
    pub message: String,
    /// Symbol, endpoint name or log file the Finding is about.
    /// Rendered in front of the message, which never repeats it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

impl Finding {
    pub fn new(section: Section, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            section,
            severity,
            message: message.into(),
            item: None,
        }
    }

    pub fn ok(section: Section, message: impl Into<String>) -> Self {
        Self::new(section, Severity::Ok, message)
    }

    pub fn warn(section: Section, message: impl Into<String>) -> Self {
        Self::new(section, Severity::Warn, message)
    }

    pub fn fail(section: Section, message: impl Into<String>) -> Self {
        Self::new(section, Severity::Fail, message)
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    /// Message with the item prefixed, as shown in the report
    pub fn display_message(&self) -> String {
        match &self.item {
            Some(item) => format!("{}: {}", item, self.message),
            None => self.message.clone(),
        }
    }
}

/// All Findings for one probed endpoint, reachability first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionResult {
    /// Endpoint name
    pub name: String,
    /// Number of items the body carried (list length, symbol count), when meaningful
    pub item_count: Option<usize>,
    pub findings: Vec<Finding>,
}

impl SectionResult {
    pub fn worst(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}
