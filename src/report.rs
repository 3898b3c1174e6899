use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::layout::{self, Block, Card, HeadingLevel, Table};
use crate::models::{
    AdmissionRecord, SupervisorTally, TerminationRecord, TurnoverSummary,
};
use crate::pdf;
use crate::style::{ReportStyle, Rgb, ADMISSION_BLUE, TERMINATION_RED};
use crate::turnover::{self, TurnoverBreakdown};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A finished report, ready to be written to disk or sent as a response body.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub pages: usize,
}

pub fn text_or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => placeholder.to_string(),
    }
}

pub fn format_date(value: Option<NaiveDate>, placeholder: &str) -> String {
    value
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| placeholder.to_string())
}

pub fn summary_cards(summary: &TurnoverSummary) -> Vec<Card> {
    let figures = [
        ("Admissões Semana", summary.admissions.week),
        ("Admissões Mês", summary.admissions.month),
        ("Admissões Ano", summary.admissions.year),
        ("Desligamentos Semana", summary.terminations.week),
        ("Desligamentos Mês", summary.terminations.month),
        ("Desligamentos Ano", summary.terminations.year),
    ];

    figures
        .into_iter()
        .map(|(label, value)| Card {
            label: label.to_string(),
            value: value.to_string(),
        })
        .collect()
}

/// Supervisor rows in key order followed by a TOTAL of those rows.
pub fn supervisor_table(
    tally: &SupervisorTally,
    count_label: &str,
    widths: &[f32],
    header_color: Rgb,
) -> Table {
    let mut rows: Vec<Vec<String>> = tally
        .rows
        .iter()
        .map(|row| vec![row.supervisor.clone(), row.count.to_string()])
        .collect();
    rows.push(vec!["TOTAL".to_string(), tally.attributed().to_string()]);

    Table {
        header: vec!["Supervisor".to_string(), count_label.to_string()],
        rows,
        widths: widths.to_vec(),
        header_color,
    }
}

fn unattributed_note(tally: &SupervisorTally) -> Option<Block> {
    (tally.unknown > 0).then(|| {
        Block::Paragraph(format!(
            "Sem supervisor identificado: {} (fora da tabela; total geral {})",
            tally.unknown,
            tally.total()
        ))
    })
}

fn admission_rows(records: &[&AdmissionRecord], style: &ReportStyle) -> Vec<Vec<String>> {
    let dash = style.placeholder;
    records
        .iter()
        .map(|record| {
            vec![
                text_or_placeholder(record.employee_name.as_deref(), dash),
                text_or_placeholder(record.code.as_deref(), dash),
                text_or_placeholder(record.role.as_deref(), dash),
                format_date(record.admitted_on, dash),
                text_or_placeholder(record.status.as_deref(), dash),
            ]
        })
        .collect()
}

fn termination_rows(records: &[&TerminationRecord], style: &ReportStyle) -> Vec<Vec<String>> {
    let dash = style.placeholder;
    records
        .iter()
        .map(|record| {
            vec![
                text_or_placeholder(record.employee_name.as_deref(), dash),
                text_or_placeholder(record.area.as_deref(), dash),
                format_date(record.terminated_on, dash),
                text_or_placeholder(record.reason.as_deref(), dash),
                text_or_placeholder(record.status.as_deref(), dash),
            ]
        })
        .collect()
}

fn header(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| label.to_string()).collect()
}

fn section_heading(text: String, level: HeadingLevel) -> Block {
    Block::Heading { text, level }
}

/// Assembles the report body: executive summary, supervisor tables, then one
/// detail section per record type.
pub fn build_document(breakdown: &TurnoverBreakdown<'_>, style: &ReportStyle) -> Vec<Block> {
    let summary = &breakdown.summary;
    let windows = &breakdown.windows;
    let dash = style.placeholder;
    let mut blocks = vec![
        section_heading("Resumo Executivo".to_string(), HeadingLevel::Title),
        Block::Paragraph(format!(
            "Referência {} · semana desde {} · mês desde {} · ano desde {}",
            format_date(Some(summary.today), dash),
            format_date(Some(windows.week_start), dash),
            format_date(Some(windows.month_start), dash),
            format_date(Some(windows.year_start), dash),
        )),
        Block::Cards(summary_cards(summary)),
        Block::Spacer(25.0),
        Block::Table(supervisor_table(
            &summary.admissions_by_supervisor,
            "Qtd Admissões",
            &style.summary_widths,
            ADMISSION_BLUE,
        )),
    ];
    blocks.extend(unattributed_note(&summary.admissions_by_supervisor));
    blocks.push(Block::Spacer(20.0));
    blocks.push(Block::Table(supervisor_table(
        &summary.terminations_by_supervisor,
        "Qtd Desligamentos",
        &style.summary_widths,
        TERMINATION_RED,
    )));
    blocks.extend(unattributed_note(&summary.terminations_by_supervisor));
    blocks.push(Block::PageBreak);

    blocks.push(section_heading("ADMISSÕES".to_string(), HeadingLevel::Title));
    blocks.push(Block::Spacer(6.0));
    if breakdown.admission_groups.is_empty() {
        blocks.push(Block::Paragraph("Nenhuma admissão com supervisor identificado.".to_string()));
    }
    for (supervisor, records) in &breakdown.admission_groups {
        blocks.push(section_heading(
            format!("Supervisor: {supervisor}"),
            HeadingLevel::Section,
        ));
        blocks.push(Block::Table(Table {
            header: header(&["Nome", "Código", "Cargo", "Data", "Status"]),
            rows: admission_rows(records, style),
            widths: style.admission_widths.to_vec(),
            header_color: ADMISSION_BLUE,
        }));
        blocks.push(Block::Spacer(10.0));
    }
    blocks.push(Block::PageBreak);

    blocks.push(section_heading("DESLIGAMENTOS".to_string(), HeadingLevel::Title));
    blocks.push(Block::Spacer(6.0));
    if breakdown.termination_groups.is_empty() {
        blocks.push(Block::Paragraph(
            "Nenhum desligamento com supervisor identificado.".to_string(),
        ));
    }
    for (supervisor, records) in &breakdown.termination_groups {
        blocks.push(section_heading(
            format!("Supervisor: {supervisor}"),
            HeadingLevel::Section,
        ));
        blocks.push(Block::Table(Table {
            header: header(&["Nome", "Área", "Data", "Motivo", "Status"]),
            rows: termination_rows(records, style),
            widths: style.termination_widths.to_vec(),
            header_color: TERMINATION_RED,
        }));
        blocks.push(Block::Spacer(10.0));
    }

    blocks
}

pub fn build_report(
    admissions: &[AdmissionRecord],
    terminations: &[TerminationRecord],
    today: NaiveDate,
    generated_at: NaiveDateTime,
    style: &ReportStyle,
) -> anyhow::Result<RenderedReport> {
    let breakdown = turnover::analyze(admissions, terminations, today);
    debug!(
        admission_supervisors = breakdown.admission_groups.len(),
        termination_supervisors = breakdown.termination_groups.len(),
        "turnover aggregated"
    );

    let blocks = build_document(&breakdown, style);
    let pages = layout::paginate(&blocks, style, generated_at);
    let bytes = pdf::render(&pages, style).context("failed to encode turnover PDF")?;
    info!(pages = pages.len(), bytes = bytes.len(), "turnover report rendered");

    Ok(RenderedReport {
        bytes,
        media_type: PDF_MEDIA_TYPE,
        pages: pages.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn admission(name: Option<&str>, code: &str, supervisor: Option<&str>) -> AdmissionRecord {
        AdmissionRecord {
            employee_name: name.map(str::to_string),
            code: Some(code.to_string()),
            role: None,
            admitted_on: Some(day(2024, 3, 11)),
            status: Some("Ativo".to_string()),
            supervisor: supervisor.map(str::to_string),
        }
    }

    fn termination(code: &str, supervisor: Option<&str>) -> TerminationRecord {
        TerminationRecord {
            employee_name: Some("João Lima".to_string()),
            code: Some(code.to_string()),
            terminated_on: None,
            area: Some("  ".to_string()),
            reason: Some("Pedido de demissão".to_string()),
            status: None,
            supervisor: supervisor.map(str::to_string),
        }
    }

    fn headings(blocks: &[Block]) -> Vec<&str> {
        blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn tables(blocks: &[Block]) -> Vec<&Table> {
        blocks
            .iter()
            .filter_map(|block| match block {
                Block::Table(table) => Some(table),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn placeholders_replace_missing_text_and_dates() {
        assert_eq!(text_or_placeholder(None, "—"), "—");
        assert_eq!(text_or_placeholder(Some("   "), "—"), "—");
        assert_eq!(text_or_placeholder(Some(" Ativo "), "—"), "Ativo");
        assert_eq!(format_date(Some(day(2024, 3, 5)), "—"), "05/03/2024");
        assert_eq!(format_date(None, "—"), "—");
    }

    #[test]
    fn supervisor_table_ends_with_total_of_preceding_rows() {
        let tally = turnover::tally(
            ["PEDRO", "ANA", "", "PEDRO"].into_iter().map(str::to_string),
        );
        let table = supervisor_table(&tally, "Qtd Admissões", &[270.0, 140.0], ADMISSION_BLUE);

        let keys: Vec<&str> = table.rows.iter().map(|row| row[0].as_str()).collect();
        assert_eq!(keys, vec!["ANA", "PEDRO", "TOTAL"]);

        let sum: usize = table.rows[..table.rows.len() - 1]
            .iter()
            .map(|row| row[1].parse::<usize>().expect("numeric count"))
            .sum();
        assert_eq!(table.rows.last().map(|row| row[1].clone()), Some(sum.to_string()));
        assert_eq!(sum, 3);
    }

    #[test]
    fn document_follows_summary_then_detail_order() {
        let admissions = vec![
            admission(Some("Maria"), "E100", Some("ana")),
            admission(None, "E200", Some("bruno")),
        ];
        let terminations = vec![termination("E100", Some(""))];
        let style = ReportStyle::new("ACME");
        let breakdown = turnover::analyze(&admissions, &terminations, day(2024, 3, 15));

        let blocks = build_document(&breakdown, &style);

        assert_eq!(
            headings(&blocks),
            vec![
                "Resumo Executivo",
                "ADMISSÕES",
                "Supervisor: ANA",
                "Supervisor: BRUNO",
                "DESLIGAMENTOS",
                "Supervisor: ANA",
            ]
        );
        assert_eq!(
            blocks[1],
            Block::Paragraph(
                "Referência 15/03/2024 · semana desde 11/03/2024 · mês desde 01/03/2024 · ano desde 01/01/2024"
                    .to_string()
            )
        );
        assert!(matches!(blocks[2], Block::Cards(ref cards) if cards.len() == 6));
        assert_eq!(
            blocks.iter().filter(|block| matches!(block, Block::PageBreak)).count(),
            2
        );

        let tables = tables(&blocks);
        assert_eq!(tables.len(), 5);
        assert_eq!(tables[0].header_color, ADMISSION_BLUE);
        assert_eq!(tables[1].header_color, TERMINATION_RED);
        assert_eq!(tables[2].header, vec!["Nome", "Código", "Cargo", "Data", "Status"]);
        assert_eq!(tables[2].rows[0], vec!["Maria", "E100", "—", "11/03/2024", "Ativo"]);
        assert_eq!(tables[3].rows[0][0], "—");
        assert_eq!(tables[4].header, vec!["Nome", "Área", "Data", "Motivo", "Status"]);
        assert_eq!(
            tables[4].rows[0],
            vec!["João Lima", "—", "—", "Pedido de demissão", "—"]
        );
    }

    #[test]
    fn unknown_supervisors_get_a_note_instead_of_a_row() {
        let admissions = vec![admission(Some("Maria"), "E100", None)];
        let terminations = vec![termination("E999", None)];
        let style = ReportStyle::new("ACME");
        let breakdown = turnover::analyze(&admissions, &terminations, day(2024, 3, 15));

        let blocks = build_document(&breakdown, &style);
        let tables = tables(&blocks);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows, vec![vec!["TOTAL".to_string(), "0".to_string()]]);
        let notes = blocks
            .iter()
            .filter(|block| matches!(block, Block::Paragraph(text) if text.starts_with("Sem supervisor")))
            .count();
        assert_eq!(notes, 2);
    }

    #[test]
    fn build_report_produces_pdf_bytes() {
        let admissions = vec![admission(Some("Maria"), "E100", Some("ana"))];
        let terminations = vec![termination("E100", None)];
        let style = ReportStyle::new("ACME");
        let generated_at = day(2024, 3, 15)
            .and_hms_opt(8, 0, 0)
            .expect("valid timestamp");

        let report = build_report(&admissions, &terminations, day(2024, 3, 15), generated_at, &style)
            .expect("report renders");

        assert_eq!(report.media_type, "application/pdf");
        assert!(report.bytes.starts_with(b"%PDF"));
        assert_eq!(report.pages, 3);
    }
}
