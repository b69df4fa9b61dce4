//! Suite reports.

use std::fmt;
use std::time::Duration;

/// How a case ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
    /// Left out by the label filter.
    Skipped,
}

/// Result of one case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    /// Context summaries from the outermost directory down, then the case.
    pub breadcrumb: Vec<String>,
    pub outcome: Outcome,
    pub duration: Duration,
}

impl CaseReport {
    pub fn name(&self) -> String {
        self.breadcrumb.join(" / ")
    }
}

/// Results of a whole run, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn push(&mut self, case: CaseReport) {
        self.cases.push(case);
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Failed cases with their messages.
    pub fn failures(&self) -> impl Iterator<Item = (&CaseReport, &str)> {
        self.cases.iter().filter_map(|c| match &c.outcome {
            Outcome::Failed(message) => Some((c, message.as_str())),
            _ => None,
        })
    }

    /// One line: `N passed, N failed, N skipped`.
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }

    fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.cases.iter().filter(|c| f(&c.outcome)).count()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for case in &self.cases {
            let status = match case.outcome {
                Outcome::Passed => "ok",
                Outcome::Failed(_) => "FAILED",
                Outcome::Skipped => "skipped",
            };
            writeln!(f, "{} ... {} ({:?})", case.name(), status, case.duration)?;
        }
        for (case, message) in self.failures() {
            writeln!(f, "\n---- {} ----", case.name())?;
            for line in message.lines() {
                writeln!(f, "  {}", line)?;
            }
        }
        write!(f, "\n{}", self.summary())
    }
}
