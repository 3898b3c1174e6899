use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::models::{
    AdmissionRecord, SupervisorCount, SupervisorTally, TerminationRecord, TurnoverSummary,
    WindowCounts,
};

/// Start dates of the current week (Monday), month and year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub week_start: NaiveDate,
    pub month_start: NaiveDate,
    pub year_start: NaiveDate,
}

impl Windows {
    pub fn for_day(today: NaiveDate) -> Self {
        let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        // Day 1 and January 1 exist in every month/year.
        let month_start = today.with_day(1).unwrap_or(today);
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(month_start);

        Self {
            week_start,
            month_start,
            year_start,
        }
    }

    pub fn count<I>(&self, dates: I) -> WindowCounts
    where
        I: IntoIterator<Item = Option<NaiveDate>>,
    {
        let mut counts = WindowCounts::default();
        for date in dates.into_iter().flatten() {
            if date >= self.week_start {
                counts.week += 1;
            }
            if date >= self.month_start {
                counts.month += 1;
            }
            if date >= self.year_start {
                counts.year += 1;
            }
        }
        counts
    }
}

/// Normalizes free-text supervisor names into grouping keys. An empty key
/// means the supervisor is unknown.
pub fn supervisor_key(raw: Option<&str>) -> String {
    raw.map(|value| value.trim().to_uppercase())
        .unwrap_or_default()
}

fn normalized_code(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|code| !code.is_empty())
}

/// Maps employee codes to the supervisor of their most recent admission.
#[derive(Debug, Default, Clone)]
pub struct SupervisorDirectory {
    by_code: HashMap<String, String>,
}

impl SupervisorDirectory {
    /// Expects admissions newest first; the first known supervisor seen for a
    /// code is kept.
    pub fn from_admissions<'a, I>(admissions: I) -> Self
    where
        I: IntoIterator<Item = &'a AdmissionRecord>,
    {
        let mut by_code = HashMap::new();
        for admission in admissions {
            let Some(code) = normalized_code(admission.code.as_deref()) else {
                continue;
            };
            let key = supervisor_key(admission.supervisor.as_deref());
            if key.is_empty() {
                continue;
            }
            by_code.entry(code.to_string()).or_insert(key);
        }
        Self { by_code }
    }

    pub fn lookup(&self, code: Option<&str>) -> Option<&str> {
        normalized_code(code).and_then(|code| self.by_code.get(code).map(String::as_str))
    }

    pub fn known_codes(&self) -> usize {
        self.by_code.len()
    }
}

/// Supervisor key for a termination: its own supervisor when present,
/// otherwise the directory entry for its code, otherwise empty.
pub fn resolve_termination_supervisor(
    termination: &TerminationRecord,
    directory: &SupervisorDirectory,
) -> String {
    let direct = supervisor_key(termination.supervisor.as_deref());
    if !direct.is_empty() {
        return direct;
    }

    directory
        .lookup(termination.code.as_deref())
        .map(str::to_string)
        .unwrap_or_default()
}

pub fn tally<I>(keys: I) -> SupervisorTally
where
    I: IntoIterator<Item = String>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut unknown = 0usize;

    for key in keys {
        if key.is_empty() {
            unknown += 1;
        } else {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    SupervisorTally {
        rows: counts
            .into_iter()
            .map(|(supervisor, count)| SupervisorCount { supervisor, count })
            .collect(),
        unknown,
    }
}

fn group<'a, T>(
    records: &[&'a T],
    keys: &[String],
) -> BTreeMap<String, Vec<&'a T>> {
    let mut groups: BTreeMap<String, Vec<&'a T>> = BTreeMap::new();
    for (record, key) in records.iter().zip(keys) {
        if key.is_empty() {
            continue;
        }
        groups.entry(key.clone()).or_default().push(*record);
    }
    groups
}

fn newest_first<T, F>(records: &[T], date: F) -> Vec<&T>
where
    F: Fn(&T) -> Option<NaiveDate>,
{
    let mut sorted: Vec<&T> = records.iter().collect();
    // Stable, so records sharing a date keep the order the source gave them.
    // Undated records sort last.
    sorted.sort_by(|a, b| date(b).cmp(&date(a)));
    sorted
}

/// Everything the report needs, computed from the two record sets.
#[derive(Debug)]
pub struct TurnoverBreakdown<'a> {
    pub windows: Windows,
    pub summary: TurnoverSummary,
    pub admission_groups: BTreeMap<String, Vec<&'a AdmissionRecord>>,
    pub termination_groups: BTreeMap<String, Vec<&'a TerminationRecord>>,
}

pub fn analyze<'a>(
    admissions: &'a [AdmissionRecord],
    terminations: &'a [TerminationRecord],
    today: NaiveDate,
) -> TurnoverBreakdown<'a> {
    let windows = Windows::for_day(today);
    let admissions = newest_first(admissions, |record| record.admitted_on);
    let terminations = newest_first(terminations, |record| record.terminated_on);

    let directory = SupervisorDirectory::from_admissions(admissions.iter().copied());
    debug!(codes = directory.known_codes(), "supervisor directory built");

    let admission_keys: Vec<String> = admissions
        .iter()
        .map(|record| supervisor_key(record.supervisor.as_deref()))
        .collect();
    let termination_keys: Vec<String> = terminations
        .iter()
        .map(|record| resolve_termination_supervisor(record, &directory))
        .collect();

    let summary = TurnoverSummary {
        today,
        admissions: windows.count(admissions.iter().map(|record| record.admitted_on)),
        terminations: windows.count(terminations.iter().map(|record| record.terminated_on)),
        admissions_by_supervisor: tally(admission_keys.iter().cloned()),
        terminations_by_supervisor: tally(termination_keys.iter().cloned()),
    };

    TurnoverBreakdown {
        windows,
        summary,
        admission_groups: group(&admissions, &admission_keys),
        termination_groups: group(&terminations, &termination_keys),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn admission(code: &str, supervisor: Option<&str>, admitted_on: NaiveDate) -> AdmissionRecord {
        AdmissionRecord {
            employee_name: Some("Maria Souza".to_string()),
            code: Some(code.to_string()),
            role: Some("Auxiliar de Estoque".to_string()),
            admitted_on: Some(admitted_on),
            status: Some("Ativo".to_string()),
            supervisor: supervisor.map(str::to_string),
        }
    }

    fn termination(code: &str, supervisor: Option<&str>, terminated_on: NaiveDate) -> TerminationRecord {
        TerminationRecord {
            employee_name: Some("João Lima".to_string()),
            code: Some(code.to_string()),
            terminated_on: Some(terminated_on),
            area: Some("Logística".to_string()),
            reason: Some("Pedido de demissão".to_string()),
            status: Some("Concluído".to_string()),
            supervisor: supervisor.map(str::to_string),
        }
    }

    #[test]
    fn windows_start_on_monday_first_of_month_and_new_year() {
        let windows = Windows::for_day(day(2024, 3, 15));
        assert_eq!(windows.week_start, day(2024, 3, 11));
        assert_eq!(windows.month_start, day(2024, 3, 1));
        assert_eq!(windows.year_start, day(2024, 1, 1));
    }

    #[test]
    fn week_can_start_in_previous_month() {
        let windows = Windows::for_day(day(2024, 3, 1));
        assert_eq!(windows.week_start, day(2024, 2, 26));
        assert_eq!(windows.month_start, day(2024, 3, 1));
    }

    #[test]
    fn monday_is_its_own_week_start() {
        let windows = Windows::for_day(day(2024, 3, 11));
        assert_eq!(windows.week_start, day(2024, 3, 11));
    }

    #[test]
    fn counts_this_week_and_earlier_this_month() {
        let windows = Windows::for_day(day(2024, 3, 15));
        let counts = windows.count([Some(day(2024, 3, 11)), Some(day(2024, 3, 4))]);
        assert_eq!(counts, WindowCounts { week: 1, month: 2, year: 2 });
    }

    #[test]
    fn previous_month_only_reaches_year_window() {
        let windows = Windows::for_day(day(2024, 3, 15));
        let counts = windows.count([Some(day(2024, 3, 11)), Some(day(2024, 2, 1))]);
        assert_eq!(counts, WindowCounts { week: 1, month: 1, year: 2 });
    }

    #[test]
    fn undated_and_last_year_records_never_count() {
        let windows = Windows::for_day(day(2024, 3, 15));
        let counts = windows.count([None, Some(day(2023, 12, 31))]);
        assert_eq!(counts, WindowCounts::default());
    }

    #[test]
    fn windows_widen_monotonically() {
        let windows = Windows::for_day(day(2024, 6, 19));
        let dates: Vec<Option<NaiveDate>> = (0..400)
            .map(|offset| Some(day(2024, 6, 19) - Duration::days(offset)))
            .collect();
        let counts = windows.count(dates);
        assert!(counts.week <= counts.month);
        assert!(counts.month <= counts.year);
        assert_eq!(counts.week, 3);
        assert_eq!(counts.month, 19);
    }

    #[test]
    fn supervisor_key_trims_and_uppercases() {
        assert_eq!(supervisor_key(Some("  ana paula ")), "ANA PAULA");
        assert_eq!(supervisor_key(Some("   ")), "");
        assert_eq!(supervisor_key(None), "");
    }

    #[test]
    fn directory_keeps_most_recent_admission_per_code() {
        let admissions = vec![
            admission("E100", Some("Bruno"), day(2024, 3, 1)),
            admission("E100", Some("Ana"), day(2023, 5, 1)),
        ];
        let directory = SupervisorDirectory::from_admissions(&admissions);
        assert_eq!(directory.lookup(Some("E100")), Some("BRUNO"));
        assert_eq!(directory.known_codes(), 1);
    }

    #[test]
    fn directory_skips_admissions_without_supervisor() {
        let admissions = vec![
            admission("E100", None, day(2024, 3, 1)),
            admission("E100", Some("ana"), day(2023, 5, 1)),
            admission(" ", Some("carla"), day(2023, 5, 1)),
        ];
        let directory = SupervisorDirectory::from_admissions(&admissions);
        assert_eq!(directory.lookup(Some(" E100 ")), Some("ANA"));
        assert_eq!(directory.lookup(Some("")), None);
        assert_eq!(directory.known_codes(), 1);
    }

    #[test]
    fn blank_termination_supervisor_resolves_through_code() {
        let admissions = vec![admission("E100", Some("ANA"), day(2024, 1, 10))];
        let directory = SupervisorDirectory::from_admissions(&admissions);

        let blank = termination("E100", Some("  "), day(2024, 3, 12));
        assert_eq!(resolve_termination_supervisor(&blank, &directory), "ANA");

        let direct = termination("E100", Some("carlos"), day(2024, 3, 12));
        assert_eq!(resolve_termination_supervisor(&direct, &directory), "CARLOS");

        let orphan = termination("E999", None, day(2024, 3, 12));
        assert_eq!(resolve_termination_supervisor(&orphan, &directory), "");
    }

    #[test]
    fn tally_sorts_keys_and_separates_unknown() {
        let tally = tally(
            ["PEDRO", "", "ANA", "PEDRO", ""]
                .into_iter()
                .map(str::to_string),
        );
        assert_eq!(
            tally.rows,
            vec![
                SupervisorCount { supervisor: "ANA".to_string(), count: 1 },
                SupervisorCount { supervisor: "PEDRO".to_string(), count: 2 },
            ]
        );
        assert_eq!(tally.unknown, 2);
        assert_eq!(tally.attributed() + tally.unknown, 5);
        assert_eq!(tally.total(), 5);
    }

    #[test]
    fn analyze_groups_terminations_under_resolved_supervisor() {
        let today = day(2024, 3, 15);
        let admissions = vec![
            admission("E200", Some("bruno"), day(2024, 3, 11)),
            admission("E100", Some("ana"), day(2024, 2, 1)),
            admission("E300", None, day(2024, 1, 5)),
        ];
        let terminations = vec![
            termination("E100", Some(""), day(2024, 3, 13)),
            termination("E404", None, day(2024, 3, 14)),
        ];

        let breakdown = analyze(&admissions, &terminations, today);

        assert_eq!(breakdown.summary.admissions, WindowCounts { week: 1, month: 1, year: 3 });
        assert_eq!(breakdown.summary.terminations, WindowCounts { week: 2, month: 2, year: 2 });
        assert_eq!(breakdown.summary.admissions_by_supervisor.unknown, 1);
        assert_eq!(breakdown.summary.admissions_by_supervisor.total(), admissions.len());
        assert_eq!(breakdown.summary.terminations_by_supervisor.unknown, 1);

        let grouped: Vec<&str> = breakdown
            .termination_groups
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(grouped, vec!["ANA"]);
        assert_eq!(breakdown.termination_groups["ANA"][0].code.as_deref(), Some("E100"));
        assert!(!breakdown.admission_groups.contains_key(""));
    }

    #[test]
    fn analyze_orders_records_newest_first_regardless_of_input() {
        let today = day(2024, 3, 15);
        let admissions = vec![
            admission("E100", Some("ana"), day(2023, 1, 1)),
            admission("E100", Some("bia"), day(2024, 3, 1)),
            admission("E101", Some("ana"), day(2024, 2, 1)),
        ];
        let terminations = vec![termination("E100", None, day(2024, 3, 14))];

        let breakdown = analyze(&admissions, &terminations, today);

        assert!(breakdown.termination_groups.contains_key("BIA"));
        let ana: Vec<Option<NaiveDate>> = breakdown.admission_groups["ANA"]
            .iter()
            .map(|record| record.admitted_on)
            .collect();
        assert_eq!(ana, vec![Some(day(2024, 2, 1)), Some(day(2023, 1, 1))]);
    }
}
