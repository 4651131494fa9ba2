//! Client repository: CRUD, search, and the public projection.

use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{now_utc, parse_datetime, parse_uuid, DATETIME_FMT};
use crate::db::DatabaseError;
use crate::models::enums::{ClientStatus, Gender};
use crate::models::{
    Client, ClientChanges, ClientDetail, ClientMetadata, ClientMetadataFields, ClientWithMetadata,
    NewClient, ProgramRef, PublicProfile,
};

/// Joined select over clients and their optional metadata row. Column
/// order is what the row mapper reads.
const CLIENT_SELECT: &str = "SELECT c.id, c.first_name, c.last_name, c.date_of_birth, c.gender, c.contact_info,
            c.created_at, c.updated_at,
            m.id, m.admission_date, m.department, m.diagnosis, m.status, m.contact, m.email,
            m.address, m.insurance_provider, m.insurance_number, m.created_at, m.updated_at
     FROM clients c
     LEFT JOIN client_metadata m ON m.client_id = c.id";

/// All clients with metadata attached, in insertion order.
pub fn list_clients(conn: &Connection) -> Result<Vec<ClientWithMetadata>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{CLIENT_SELECT} ORDER BY c.rowid"))?;
    let rows = stmt.query_map([], client_row_from_rusqlite)?;

    let mut clients = Vec::new();
    for row in rows {
        clients.push(client_from_row(row?)?);
    }
    Ok(clients)
}

/// Create a client and, when supplied, its metadata row in one
/// transaction. A metadata failure rolls the client row back too.
pub fn insert_client(conn: &Connection, new: &NewClient) -> Result<ClientWithMetadata, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let id = Uuid::new_v4();
    let stamp = now_utc().format(DATETIME_FMT).to_string();

    tx.execute(
        "INSERT INTO clients (id, first_name, last_name, date_of_birth, gender, contact_info, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id.to_string(),
            new.first_name,
            new.last_name,
            new.date_of_birth.to_string(),
            new.gender.as_str(),
            new.contact_info,
            stamp,
            stamp,
        ],
    )?;

    if let Some(fields) = &new.metadata {
        insert_client_metadata(&tx, &id, fields, &stamp)?;
    }

    tx.commit()?;
    tracing::info!(client_id = %id, "client created");
    get_client(conn, &id)
}

/// One client with metadata; `NotFound` when the id has no row.
pub fn get_client(conn: &Connection, id: &Uuid) -> Result<ClientWithMetadata, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{CLIENT_SELECT} WHERE c.id = ?1"))?;
    let row = stmt
        .query_row(params![id.to_string()], client_row_from_rusqlite)
        .optional()?;

    match row {
        Some(row) => client_from_row(row),
        None => Err(DatabaseError::not_found("Client", id)),
    }
}

/// Full detail view: metadata plus enrolled programs.
pub fn get_client_detail(conn: &Connection, id: &Uuid) -> Result<ClientDetail, DatabaseError> {
    let base = get_client(conn, id)?;
    let programs = super::enrollment::programs_for_client(conn, id)?;
    Ok(ClientDetail {
        client: base.client,
        metadata: base.metadata,
        programs,
    })
}

/// Merge a sparse change set into the stored client. Absent fields keep
/// their value; a metadata payload updates the existing row or creates
/// one. Root row and metadata move in a single transaction.
pub fn update_client(
    conn: &Connection,
    id: &Uuid,
    changes: &ClientChanges,
) -> Result<ClientWithMetadata, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let existing = get_client(&tx, id)?;

    let mut client = existing.client;
    if let Some(v) = &changes.first_name {
        client.first_name = v.clone();
    }
    if let Some(v) = &changes.last_name {
        client.last_name = v.clone();
    }
    if let Some(v) = changes.date_of_birth {
        client.date_of_birth = v;
    }
    if let Some(v) = &changes.gender {
        client.gender = v.clone();
    }
    if let Some(v) = &changes.contact_info {
        client.contact_info = Some(v.clone());
    }

    let stamp = now_utc().format(DATETIME_FMT).to_string();
    tx.execute(
        "UPDATE clients SET first_name = ?1, last_name = ?2, date_of_birth = ?3, gender = ?4,
                contact_info = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            client.first_name,
            client.last_name,
            client.date_of_birth.to_string(),
            client.gender.as_str(),
            client.contact_info,
            stamp,
            id.to_string(),
        ],
    )?;

    if let Some(fields) = &changes.metadata {
        upsert_client_metadata(&tx, id, &existing.metadata, fields, &stamp)?;
    }

    tx.commit()?;
    tracing::info!(client_id = %id, "client updated");
    get_client(conn, id)
}

/// Delete a client. Metadata and enrollment rows go with it via
/// foreign-key cascade.
pub fn delete_client(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM clients WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Client", id));
    }
    tracing::info!(client_id = %id, "client deleted");
    Ok(())
}

/// Case-insensitive substring search over first name, last name,
/// diagnosis, and department.
pub fn search_clients(conn: &Connection, text: &str) -> Result<Vec<ClientWithMetadata>, DatabaseError> {
    let pattern = format!("%{text}%");
    let mut stmt = conn.prepare(&format!(
        "{CLIENT_SELECT}
         WHERE LOWER(c.first_name) LIKE LOWER(?1)
            OR LOWER(c.last_name) LIKE LOWER(?1)
            OR LOWER(m.diagnosis) LIKE LOWER(?1)
            OR LOWER(m.department) LIKE LOWER(?1)
         ORDER BY c.rowid"
    ))?;
    let rows = stmt.query_map(params![pattern], client_row_from_rusqlite)?;

    let mut clients = Vec::new();
    for row in rows {
        clients.push(client_from_row(row?)?);
    }
    Ok(clients)
}

/// Reduced public projection: names and enrolled program references,
/// nothing from the metadata record.
pub fn public_profile(conn: &Connection, id: &Uuid) -> Result<PublicProfile, DatabaseError> {
    let names = conn
        .query_row(
            "SELECT first_name, last_name FROM clients WHERE id = ?1",
            params![id.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    let (first_name, last_name) = match names {
        Some(names) => names,
        None => return Err(DatabaseError::not_found("Client", id)),
    };

    let mut stmt = conn.prepare(
        "SELECT p.id, p.name
         FROM programs p
         JOIN enrollments e ON e.program_id = p.id
         WHERE e.client_id = ?1
         ORDER BY p.rowid",
    )?;
    let rows = stmt.query_map(params![id.to_string()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut programs = Vec::new();
    for row in rows {
        let (program_id, name) = row?;
        programs.push(ProgramRef {
            id: parse_uuid(&program_id)?,
            name,
        });
    }

    Ok(PublicProfile {
        id: *id,
        first_name,
        last_name,
        programs,
    })
}

/// True when a client row exists for the id.
pub fn client_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM clients WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn insert_client_metadata(
    conn: &Connection,
    client_id: &Uuid,
    fields: &ClientMetadataFields,
    stamp: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO client_metadata (id, client_id, admission_date, department, diagnosis, status,
                contact, email, address, insurance_provider, insurance_number, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            Uuid::new_v4().to_string(),
            client_id.to_string(),
            fields.admission_date.map(|d| d.to_string()),
            fields.department,
            fields.diagnosis,
            fields.status.as_ref().map(|s| s.as_str()),
            fields.contact,
            fields.email,
            fields.address,
            fields.insurance_provider,
            fields.insurance_number,
            stamp,
            stamp,
        ],
    )?;
    Ok(())
}

/// Merge incoming metadata fields into the existing row, or create one
/// when the client has none yet.
fn upsert_client_metadata(
    conn: &Connection,
    client_id: &Uuid,
    existing: &Option<ClientMetadata>,
    fields: &ClientMetadataFields,
    stamp: &str,
) -> Result<(), DatabaseError> {
    let current = match existing {
        Some(meta) => meta,
        None => return insert_client_metadata(conn, client_id, fields, stamp),
    };

    let mut merged = current.clone();
    if let Some(v) = fields.admission_date {
        merged.admission_date = Some(v);
    }
    if let Some(v) = &fields.department {
        merged.department = Some(v.clone());
    }
    if let Some(v) = &fields.diagnosis {
        merged.diagnosis = Some(v.clone());
    }
    if let Some(v) = &fields.status {
        merged.status = Some(v.clone());
    }
    if let Some(v) = &fields.contact {
        merged.contact = Some(v.clone());
    }
    if let Some(v) = &fields.email {
        merged.email = Some(v.clone());
    }
    if let Some(v) = &fields.address {
        merged.address = Some(v.clone());
    }
    if let Some(v) = &fields.insurance_provider {
        merged.insurance_provider = Some(v.clone());
    }
    if let Some(v) = &fields.insurance_number {
        merged.insurance_number = Some(v.clone());
    }

    conn.execute(
        "UPDATE client_metadata SET admission_date = ?1, department = ?2, diagnosis = ?3,
                status = ?4, contact = ?5, email = ?6, address = ?7, insurance_provider = ?8,
                insurance_number = ?9, updated_at = ?10
         WHERE client_id = ?11",
        params![
            merged.admission_date.map(|d| d.to_string()),
            merged.department,
            merged.diagnosis,
            merged.status.as_ref().map(|s| s.as_str()),
            merged.contact,
            merged.email,
            merged.address,
            merged.insurance_provider,
            merged.insurance_number,
            stamp,
            client_id.to_string(),
        ],
    )?;
    Ok(())
}

struct ClientRow {
    id: String,
    first_name: String,
    last_name: String,
    date_of_birth: String,
    gender: String,
    contact_info: Option<String>,
    created_at: String,
    updated_at: String,
    meta_id: Option<String>,
    admission_date: Option<String>,
    department: Option<String>,
    diagnosis: Option<String>,
    status: Option<String>,
    contact: Option<String>,
    email: Option<String>,
    address: Option<String>,
    insurance_provider: Option<String>,
    insurance_number: Option<String>,
    meta_created_at: Option<String>,
    meta_updated_at: Option<String>,
}

fn client_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ClientRow, rusqlite::Error> {
    Ok(ClientRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender: row.get(4)?,
        contact_info: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        meta_id: row.get(8)?,
        admission_date: row.get(9)?,
        department: row.get(10)?,
        diagnosis: row.get(11)?,
        status: row.get(12)?,
        contact: row.get(13)?,
        email: row.get(14)?,
        address: row.get(15)?,
        insurance_provider: row.get(16)?,
        insurance_number: row.get(17)?,
        meta_created_at: row.get(18)?,
        meta_updated_at: row.get(19)?,
    })
}

fn client_from_row(row: ClientRow) -> Result<ClientWithMetadata, DatabaseError> {
    let client_id = parse_uuid(&row.id)?;

    let metadata = match row.meta_id {
        Some(meta_id) => Some(ClientMetadata {
            id: parse_uuid(&meta_id)?,
            client_id,
            admission_date: row
                .admission_date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            department: row.department,
            diagnosis: row.diagnosis,
            status: row.status.as_deref().map(ClientStatus::from_str).transpose()?,
            contact: row.contact,
            email: row.email,
            address: row.address,
            insurance_provider: row.insurance_provider,
            insurance_number: row.insurance_number,
            created_at: parse_datetime(&row.meta_created_at.unwrap_or_default()),
            updated_at: parse_datetime(&row.meta_updated_at.unwrap_or_default()),
        }),
        None => None,
    };

    Ok(ClientWithMetadata {
        client: Client {
            id: client_id,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: NaiveDate::parse_from_str(&row.date_of_birth, "%Y-%m-%d")
                .unwrap_or_default(),
            gender: Gender::from_str(&row.gender)?,
            contact_info: row.contact_info,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        },
        metadata,
    })
}
