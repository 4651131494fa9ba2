//! Enrollment pivot: attach clients to programs and read either side.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

use super::program::{program_from_row, program_row_from_rusqlite};
use super::{parse_datetime, parse_uuid, DATETIME_FMT};
use crate::db::DatabaseError;
use crate::models::enums::Gender;
use crate::models::{Client, EnrolledClient, EnrolledProgram};

/// Outcome of an enroll call: which program ids were newly attached and
/// which pairs already existed.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentOutcome {
    pub attached: Vec<Uuid>,
    pub already_enrolled: Vec<Uuid>,
}

/// Insert the (client, program) pairs that do not already exist, all in
/// one transaction. Pairs outside `program_ids` are left untouched, so
/// repeating a request cannot detach anything.
pub fn enroll_client(
    conn: &Connection,
    client_id: &Uuid,
    program_ids: &[Uuid],
    enrolled_at: NaiveDateTime,
) -> Result<EnrollmentOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let stamp = enrolled_at.format(DATETIME_FMT).to_string();

    let mut outcome = EnrollmentOutcome {
        attached: Vec::new(),
        already_enrolled: Vec::new(),
    };
    for program_id in program_ids {
        let inserted = tx.execute(
            "INSERT INTO enrollments (client_id, program_id, enrolled_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (client_id, program_id) DO NOTHING",
            params![client_id.to_string(), program_id.to_string(), stamp],
        )?;
        if inserted > 0 {
            outcome.attached.push(*program_id);
        } else {
            outcome.already_enrolled.push(*program_id);
        }
    }

    tx.commit()?;
    tracing::info!(
        client_id = %client_id,
        attached = outcome.attached.len(),
        already_enrolled = outcome.already_enrolled.len(),
        "enrollments synced"
    );
    Ok(outcome)
}

/// Programs a client is enrolled in, each with its metadata and the
/// enrollment time.
pub fn programs_for_client(
    conn: &Connection,
    client_id: &Uuid,
) -> Result<Vec<EnrolledProgram>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
                m.id, m.duration, m.department, m.max_capacity, m.current_enrollment,
                m.start_date, m.end_date, m.status, m.cost, m.created_at, m.updated_at,
                e.enrolled_at
         FROM programs p
         JOIN enrollments e ON e.program_id = p.id
         LEFT JOIN program_metadata m ON m.program_id = p.id
         WHERE e.client_id = ?1
         ORDER BY e.enrolled_at, p.rowid",
    )?;
    let rows = stmt.query_map(params![client_id.to_string()], |row| {
        let program = program_row_from_rusqlite(row)?;
        let enrolled_at: String = row.get(16)?;
        Ok((program, enrolled_at))
    })?;

    let mut programs = Vec::new();
    for row in rows {
        let (program_row, enrolled_at) = row?;
        let with_meta = program_from_row(program_row)?;
        programs.push(EnrolledProgram {
            program: with_meta.program,
            metadata: with_meta.metadata,
            enrolled_at: parse_datetime(&enrolled_at),
        });
    }
    Ok(programs)
}

/// Clients enrolled in a program, with the enrollment time.
pub fn clients_for_program(
    conn: &Connection,
    program_id: &Uuid,
) -> Result<Vec<EnrolledClient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.first_name, c.last_name, c.date_of_birth, c.gender, c.contact_info,
                c.created_at, c.updated_at, e.enrolled_at
         FROM clients c
         JOIN enrollments e ON e.client_id = c.id
         WHERE e.program_id = ?1
         ORDER BY e.enrolled_at, c.rowid",
    )?;
    let rows = stmt.query_map(params![program_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, String>(8)?,
        ))
    })?;

    let mut clients = Vec::new();
    for row in rows {
        let (id, first_name, last_name, dob, gender, contact_info, created_at, updated_at, enrolled_at) =
            row?;
        clients.push(EnrolledClient {
            client: Client {
                id: parse_uuid(&id)?,
                first_name,
                last_name,
                date_of_birth: NaiveDate::parse_from_str(&dob, "%Y-%m-%d").unwrap_or_default(),
                gender: Gender::from_str(&gender)?,
                contact_info,
                created_at: parse_datetime(&created_at),
                updated_at: parse_datetime(&updated_at),
            },
            enrolled_at: parse_datetime(&enrolled_at),
        });
    }
    Ok(clients)
}

/// Live count of enrollment rows for a program.
pub fn enrollment_count(conn: &Connection, program_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM enrollments WHERE program_id = ?1",
        params![program_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}
