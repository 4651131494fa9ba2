//! Program administration: drafts in, validated commands through the
//! repository, read shapes out.

use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::ServiceError;
use crate::db::repository;
use crate::models::enums::ProgramStatus;
use crate::models::{
    NewProgram, ProgramChanges, ProgramDetail, ProgramMetadataFields, ProgramWithMetadata,
};
use crate::validation::{self, ValidationError};

// ═══════════════════════════════════════════════════════════════════════════
// Drafts — raw request bodies, everything optional
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<ProgramMetadataDraft>,
}

/// Numeric fields accept either JSON numbers or numeric strings, so
/// they arrive as raw values and are coerced during validation. There
/// is no `current_enrollment` here: the counter is never client-writable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramMetadataDraft {
    pub duration: Option<Value>,
    pub department: Option<String>,
    pub max_capacity: Option<Value>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub cost: Option<Value>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Validation — pure, no store access
// ═══════════════════════════════════════════════════════════════════════════

/// Check a create draft rule-by-rule and produce the typed command.
pub fn validate_new_program(draft: &ProgramDraft) -> Result<NewProgram, ValidationError> {
    let name = validation::require(draft.name.as_deref(), "name")?.to_string();
    let description = validation::require(draft.description.as_deref(), "description")?.to_string();
    let metadata = draft
        .metadata
        .as_ref()
        .map(validate_program_metadata)
        .transpose()?
        .filter(|fields| !fields.is_empty());

    Ok(NewProgram {
        name,
        description,
        metadata,
    })
}

/// Check an update draft; everything optional.
pub fn validate_program_changes(draft: &ProgramDraft) -> Result<ProgramChanges, ValidationError> {
    let metadata = draft
        .metadata
        .as_ref()
        .map(validate_program_metadata)
        .transpose()?
        .filter(|fields| !fields.is_empty());

    Ok(ProgramChanges {
        name: validation::opt_text(&draft.name),
        description: validation::opt_text(&draft.description),
        metadata,
    })
}

fn validate_program_metadata(
    draft: &ProgramMetadataDraft,
) -> Result<ProgramMetadataFields, ValidationError> {
    let duration = validation::opt_int(&draft.duration, "metadata.duration")?;
    let max_capacity = validation::opt_int(&draft.max_capacity, "metadata.max_capacity")?;
    let start_date = validation::opt_date(&draft.start_date, "metadata.start_date")?;
    let end_date = validation::opt_date(&draft.end_date, "metadata.end_date")?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            return Err(ValidationError::new(
                "metadata.end_date must be on or after metadata.start_date",
            ));
        }
    }
    let status = validation::opt_enum::<ProgramStatus>(
        &draft.status,
        "metadata.status",
        ProgramStatus::variants(),
    )?;
    let cost = validation::opt_cost(&draft.cost, "metadata.cost")?;

    Ok(ProgramMetadataFields {
        duration,
        department: validation::opt_text(&draft.department),
        max_capacity,
        start_date,
        end_date,
        status,
        cost,
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════════════════════════════════════

pub fn list_programs(conn: &Connection) -> Result<Vec<ProgramWithMetadata>, ServiceError> {
    Ok(repository::list_programs(conn)?)
}

pub fn create_program(conn: &Connection, draft: &ProgramDraft) -> Result<ProgramWithMetadata, ServiceError> {
    let command = validate_new_program(draft)?;
    Ok(repository::insert_program(conn, &command)?)
}

pub fn get_program(conn: &Connection, id: &Uuid) -> Result<ProgramDetail, ServiceError> {
    Ok(repository::get_program_detail(conn, id)?)
}

pub fn update_program(
    conn: &Connection,
    id: &Uuid,
    draft: &ProgramDraft,
) -> Result<ProgramWithMetadata, ServiceError> {
    let changes = validate_program_changes(draft)?;
    Ok(repository::update_program(conn, id, &changes)?)
}

pub fn delete_program(conn: &Connection, id: &Uuid) -> Result<(), ServiceError> {
    Ok(repository::delete_program(conn, id)?)
}
