use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{AdmissionRecord, TerminationRecord};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to apply migrations")?;
    Ok(())
}

/// Admissions newest first. Rows sharing a date come back newest insert first.
pub async fn fetch_admissions(pool: &PgPool) -> anyhow::Result<Vec<AdmissionRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT employee_name, code, role, admitted_on, status, supervisor
        FROM turnover.admissions
        ORDER BY admitted_on DESC NULLS LAST, created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to query admissions")?;

    let records: Vec<AdmissionRecord> = rows
        .into_iter()
        .map(|row| AdmissionRecord {
            employee_name: row.get("employee_name"),
            code: row.get("code"),
            role: row.get("role"),
            admitted_on: row.get("admitted_on"),
            status: row.get("status"),
            supervisor: row.get("supervisor"),
        })
        .collect();

    debug!(count = records.len(), "admissions fetched");
    Ok(records)
}

pub async fn fetch_terminations(pool: &PgPool) -> anyhow::Result<Vec<TerminationRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT employee_name, code, terminated_on, area, reason, status, supervisor
        FROM turnover.terminations
        ORDER BY terminated_on DESC NULLS LAST, created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to query terminations")?;

    let records: Vec<TerminationRecord> = rows
        .into_iter()
        .map(|row| TerminationRecord {
            employee_name: row.get("employee_name"),
            code: row.get("code"),
            terminated_on: row.get("terminated_on"),
            area: row.get("area"),
            reason: row.get("reason"),
            status: row.get("status"),
            supervisor: row.get("supervisor"),
        })
        .collect();

    debug!(count = records.len(), "terminations fetched");
    Ok(records)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdmissionRow {
    pub employee_name: Option<String>,
    pub code: Option<String>,
    pub role: Option<String>,
    pub admitted_on: Option<NaiveDate>,
    pub status: Option<String>,
    pub supervisor: Option<String>,
    pub source_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TerminationRow {
    pub employee_name: Option<String>,
    pub code: Option<String>,
    pub terminated_on: Option<NaiveDate>,
    pub area: Option<String>,
    pub reason: Option<String>,
    pub status: Option<String>,
    pub supervisor: Option<String>,
    pub source_key: Option<String>,
}

pub fn read_admission_rows<R: Read>(input: R) -> anyhow::Result<Vec<AdmissionRow>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut rows = Vec::new();
    for (line, result) in reader.deserialize::<AdmissionRow>().enumerate() {
        rows.push(result.with_context(|| format!("invalid admission row {}", line + 1))?);
    }
    Ok(rows)
}

pub fn read_termination_rows<R: Read>(input: R) -> anyhow::Result<Vec<TerminationRow>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut rows = Vec::new();
    for (line, result) in reader.deserialize::<TerminationRow>().enumerate() {
        rows.push(result.with_context(|| format!("invalid termination row {}", line + 1))?);
    }
    Ok(rows)
}

fn source_key_or_generated(key: Option<&str>) -> String {
    key.map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()))
}

/// Returns whether the row was new.
async fn insert_admission(pool: &PgPool, row: &AdmissionRow) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO turnover.admissions
        (id, employee_name, code, role, admitted_on, status, supervisor, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&row.employee_name)
    .bind(&row.code)
    .bind(&row.role)
    .bind(row.admitted_on)
    .bind(&row.status)
    .bind(&row.supervisor)
    .bind(source_key_or_generated(row.source_key.as_deref()))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_termination(pool: &PgPool, row: &TerminationRow) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO turnover.terminations
        (id, employee_name, code, terminated_on, area, reason, status, supervisor, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&row.employee_name)
    .bind(&row.code)
    .bind(row.terminated_on)
    .bind(&row.area)
    .bind(&row.reason)
    .bind(&row.status)
    .bind(&row.supervisor)
    .bind(source_key_or_generated(row.source_key.as_deref()))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn import_admissions(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = read_admission_rows(file)?;

    let mut inserted = 0usize;
    for row in &rows {
        if insert_admission(pool, row).await? {
            inserted += 1;
        }
    }

    info!(read = rows.len(), inserted, "admissions imported");
    Ok(inserted)
}

pub async fn import_terminations(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = read_termination_rows(file)?;

    let mut inserted = 0usize;
    for row in &rows {
        if insert_termination(pool, row).await? {
            inserted += 1;
        }
    }

    info!(read = rows.len(), inserted, "terminations imported");
    Ok(inserted)
}

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let days_ago = |days: i64| Some(today - Duration::days(days));

    let admissions = vec![
        ("seed-adm-001", "Ana Clara Ribeiro", "E100", "Auxiliar de Estoque", 2, "Ativo", "Marcos Paulo"),
        ("seed-adm-002", "Bruno Henrique Dias", "E101", "Conferente", 12, "Ativo", "marcos paulo "),
        ("seed-adm-003", "Carla Nogueira", "E102", "Motorista", 40, "Experiência", "Juliana Alves"),
        ("seed-adm-004", "Diego Martins", "E103", "Separador", 95, "Ativo", "Juliana Alves"),
        ("seed-adm-005", "Eduarda Lopes", "E104", "Assistente Administrativo", 200, "Ativo", ""),
    ];

    for (source_key, name, code, role, age, status, supervisor) in admissions {
        insert_admission(
            pool,
            &AdmissionRow {
                employee_name: text(name),
                code: text(code),
                role: text(role),
                admitted_on: days_ago(age),
                status: text(status),
                supervisor: Some(supervisor.to_string()).filter(|value| !value.is_empty()),
                source_key: text(source_key),
            },
        )
        .await?;
    }

    let terminations = vec![
        ("seed-des-001", "Carla Nogueira", "E102", 1, "Logística", "Pedido de demissão", "Concluído", None),
        ("seed-des-002", "Diego Martins", "E103", 20, "Armazém", "Término de contrato", "Concluído", Some("Juliana Alves")),
        ("seed-des-003", "Fábio Souza", "E900", 60, "Vendas", "Dispensa sem justa causa", "Em andamento", None),
    ];

    for (source_key, name, code, age, area, reason, status, supervisor) in terminations {
        insert_termination(
            pool,
            &TerminationRow {
                employee_name: text(name),
                code: text(code),
                terminated_on: days_ago(age),
                area: text(area),
                reason: text(reason),
                status: text(status),
                supervisor: supervisor.map(str::to_string),
                source_key: text(source_key),
            },
        )
        .await?;
    }

    info!("seed data inserted");
    Ok(())
}
