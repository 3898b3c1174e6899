use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct AdmissionRecord {
    pub employee_name: Option<String>,
    pub code: Option<String>,
    pub role: Option<String>,
    pub admitted_on: Option<NaiveDate>,
    pub status: Option<String>,
    pub supervisor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TerminationRecord {
    pub employee_name: Option<String>,
    pub code: Option<String>,
    pub terminated_on: Option<NaiveDate>,
    pub area: Option<String>,
    pub reason: Option<String>,
    pub status: Option<String>,
    pub supervisor: Option<String>,
}

/// Week, month and year counts for one record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowCounts {
    pub week: usize,
    pub month: usize,
    pub year: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupervisorCount {
    pub supervisor: String,
    pub count: usize,
}

/// Per-supervisor counts sorted by key. Records without a resolvable
/// supervisor land in `unknown` and never get a row of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupervisorTally {
    pub rows: Vec<SupervisorCount>,
    pub unknown: usize,
}

impl SupervisorTally {
    pub fn attributed(&self) -> usize {
        self.rows.iter().map(|row| row.count).sum()
    }

    pub fn total(&self) -> usize {
        self.attributed() + self.unknown
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnoverSummary {
    pub today: NaiveDate,
    pub admissions: WindowCounts,
    pub terminations: WindowCounts,
    pub admissions_by_supervisor: SupervisorTally,
    pub terminations_by_supervisor: SupervisorTally,
}
