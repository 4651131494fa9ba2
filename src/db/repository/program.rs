//! Program repository: CRUD plus the enrollment counter recount.

use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{now_utc, parse_datetime, parse_uuid, DATETIME_FMT};
use crate::db::DatabaseError;
use crate::models::enums::ProgramStatus;
use crate::models::{
    NewProgram, Program, ProgramChanges, ProgramDetail, ProgramMetadata, ProgramMetadataFields,
    ProgramWithMetadata,
};

/// Joined select over programs and their optional metadata row. The
/// enrollment queries append columns after these, in this order.
const PROGRAM_SELECT: &str = "SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
            m.id, m.duration, m.department, m.max_capacity, m.current_enrollment,
            m.start_date, m.end_date, m.status, m.cost, m.created_at, m.updated_at
     FROM programs p
     LEFT JOIN program_metadata m ON m.program_id = p.id";

/// All programs with metadata attached, in insertion order.
pub fn list_programs(conn: &Connection) -> Result<Vec<ProgramWithMetadata>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{PROGRAM_SELECT} ORDER BY p.rowid"))?;
    let rows = stmt.query_map([], program_row_from_rusqlite)?;

    let mut programs = Vec::new();
    for row in rows {
        programs.push(program_from_row(row?)?);
    }
    Ok(programs)
}

/// Create a program and, when supplied, its metadata row in one
/// transaction. `current_enrollment` always starts at the schema
/// default of zero.
pub fn insert_program(conn: &Connection, new: &NewProgram) -> Result<ProgramWithMetadata, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let id = Uuid::new_v4();
    let stamp = now_utc().format(DATETIME_FMT).to_string();

    tx.execute(
        "INSERT INTO programs (id, name, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id.to_string(), new.name, new.description, stamp, stamp],
    )?;

    if let Some(fields) = &new.metadata {
        insert_program_metadata(&tx, &id, fields, &stamp)?;
    }

    tx.commit()?;
    tracing::info!(program_id = %id, "program created");
    get_program(conn, &id)
}

/// One program with metadata; `NotFound` when the id has no row.
pub fn get_program(conn: &Connection, id: &Uuid) -> Result<ProgramWithMetadata, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{PROGRAM_SELECT} WHERE p.id = ?1"))?;
    let row = stmt
        .query_row(params![id.to_string()], program_row_from_rusqlite)
        .optional()?;

    match row {
        Some(row) => program_from_row(row),
        None => Err(DatabaseError::not_found("Program", id)),
    }
}

/// Full detail view: metadata plus enrolled clients.
pub fn get_program_detail(conn: &Connection, id: &Uuid) -> Result<ProgramDetail, DatabaseError> {
    let base = get_program(conn, id)?;
    let clients = super::enrollment::clients_for_program(conn, id)?;
    Ok(ProgramDetail {
        program: base.program,
        metadata: base.metadata,
        clients,
    })
}

/// Merge a sparse change set into the stored program, metadata upsert
/// included, in a single transaction.
pub fn update_program(
    conn: &Connection,
    id: &Uuid,
    changes: &ProgramChanges,
) -> Result<ProgramWithMetadata, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let existing = get_program(&tx, id)?;

    let mut program = existing.program;
    if let Some(v) = &changes.name {
        program.name = v.clone();
    }
    if let Some(v) = &changes.description {
        program.description = v.clone();
    }

    let stamp = now_utc().format(DATETIME_FMT).to_string();
    tx.execute(
        "UPDATE programs SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
        params![program.name, program.description, stamp, id.to_string()],
    )?;

    if let Some(fields) = &changes.metadata {
        upsert_program_metadata(&tx, id, &existing.metadata, fields, &stamp)?;
    }

    tx.commit()?;
    tracing::info!(program_id = %id, "program updated");
    get_program(conn, id)
}

/// Delete a program. Metadata and enrollment rows cascade away; client
/// rows are untouched.
pub fn delete_program(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM programs WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Program", id));
    }
    tracing::info!(program_id = %id, "program deleted");
    Ok(())
}

/// Recount enrollment rows for a program and store the result in its
/// metadata. This is the sole writer of `current_enrollment`; a program
/// without a metadata row still gets its count reported.
pub fn recount_enrollment(conn: &Connection, id: &Uuid) -> Result<i64, DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    if !program_exists(&tx, id)? {
        return Err(DatabaseError::not_found("Program", id));
    }

    let count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM enrollments WHERE program_id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;

    tx.execute(
        "UPDATE program_metadata SET current_enrollment = ?1, updated_at = ?2 WHERE program_id = ?3",
        params![count, now_utc().format(DATETIME_FMT).to_string(), id.to_string()],
    )?;

    tx.commit()?;
    tracing::debug!(program_id = %id, count, "enrollment recounted");
    Ok(count)
}

/// True when a program row exists for the id.
pub fn program_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM programs WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn insert_program_metadata(
    conn: &Connection,
    program_id: &Uuid,
    fields: &ProgramMetadataFields,
    stamp: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO program_metadata (id, program_id, duration, department, max_capacity,
                start_date, end_date, status, cost, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            Uuid::new_v4().to_string(),
            program_id.to_string(),
            fields.duration,
            fields.department,
            fields.max_capacity,
            fields.start_date.map(|d| d.to_string()),
            fields.end_date.map(|d| d.to_string()),
            fields.status.as_ref().map(|s| s.as_str()),
            fields.cost.map(|c| c.to_string()),
            stamp,
            stamp,
        ],
    )?;
    Ok(())
}

/// Merge incoming metadata fields into the existing row, or create one
/// when the program has none yet. `current_enrollment` is never written
/// here.
fn upsert_program_metadata(
    conn: &Connection,
    program_id: &Uuid,
    existing: &Option<ProgramMetadata>,
    fields: &ProgramMetadataFields,
    stamp: &str,
) -> Result<(), DatabaseError> {
    let current = match existing {
        Some(meta) => meta,
        None => return insert_program_metadata(conn, program_id, fields, stamp),
    };

    let mut merged = current.clone();
    if let Some(v) = fields.duration {
        merged.duration = Some(v);
    }
    if let Some(v) = &fields.department {
        merged.department = Some(v.clone());
    }
    if let Some(v) = fields.max_capacity {
        merged.max_capacity = Some(v);
    }
    if let Some(v) = fields.start_date {
        merged.start_date = Some(v);
    }
    if let Some(v) = fields.end_date {
        merged.end_date = Some(v);
    }
    if let Some(v) = &fields.status {
        merged.status = Some(v.clone());
    }
    if let Some(v) = fields.cost {
        merged.cost = Some(v);
    }

    conn.execute(
        "UPDATE program_metadata SET duration = ?1, department = ?2, max_capacity = ?3,
                start_date = ?4, end_date = ?5, status = ?6, cost = ?7, updated_at = ?8
         WHERE program_id = ?9",
        params![
            merged.duration,
            merged.department,
            merged.max_capacity,
            merged.start_date.map(|d| d.to_string()),
            merged.end_date.map(|d| d.to_string()),
            merged.status.as_ref().map(|s| s.as_str()),
            merged.cost.map(|c| c.to_string()),
            stamp,
            program_id.to_string(),
        ],
    )?;
    Ok(())
}

pub(super) struct ProgramRow {
    id: String,
    name: String,
    description: String,
    created_at: String,
    updated_at: String,
    meta_id: Option<String>,
    duration: Option<i64>,
    department: Option<String>,
    max_capacity: Option<i64>,
    current_enrollment: Option<i64>,
    start_date: Option<String>,
    end_date: Option<String>,
    status: Option<String>,
    cost: Option<String>,
    meta_created_at: Option<String>,
    meta_updated_at: Option<String>,
}

pub(super) fn program_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ProgramRow, rusqlite::Error> {
    Ok(ProgramRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        meta_id: row.get(5)?,
        duration: row.get(6)?,
        department: row.get(7)?,
        max_capacity: row.get(8)?,
        current_enrollment: row.get(9)?,
        start_date: row.get(10)?,
        end_date: row.get(11)?,
        status: row.get(12)?,
        cost: row.get(13)?,
        meta_created_at: row.get(14)?,
        meta_updated_at: row.get(15)?,
    })
}

pub(super) fn program_from_row(row: ProgramRow) -> Result<ProgramWithMetadata, DatabaseError> {
    let program_id = parse_uuid(&row.id)?;

    let metadata = match row.meta_id {
        Some(meta_id) => Some(ProgramMetadata {
            id: parse_uuid(&meta_id)?,
            program_id,
            duration: row.duration,
            department: row.department,
            max_capacity: row.max_capacity,
            current_enrollment: row.current_enrollment.unwrap_or(0),
            start_date: row
                .start_date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            end_date: row
                .end_date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            status: row.status.as_deref().map(ProgramStatus::from_str).transpose()?,
            cost: row.cost.and_then(|c| Decimal::from_str(&c).ok()),
            created_at: parse_datetime(&row.meta_created_at.unwrap_or_default()),
            updated_at: parse_datetime(&row.meta_updated_at.unwrap_or_default()),
        }),
        None => None,
    };

    Ok(ProgramWithMetadata {
        program: Program {
            id: program_id,
            name: row.name,
            description: row.description,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        },
        metadata,
    })
}
