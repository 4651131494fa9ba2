use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::Client;
use super::enums::ProgramStatus;

// ═══════════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════════

/// A care program clients can enroll in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Operational metadata for a program. At most one row per program.
/// `current_enrollment` is a stored count of enrollment rows, refreshed
/// only through the recount path; it is never accepted from callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramMetadata {
    pub id: Uuid,
    pub program_id: Uuid,
    pub duration: Option<i64>,
    pub department: Option<String>,
    pub max_capacity: Option<i64>,
    pub current_enrollment: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<ProgramStatus>,
    pub cost: Option<Decimal>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Program with its metadata attached; the standard read shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramWithMetadata {
    #[serde(flatten)]
    pub program: Program,
    pub metadata: Option<ProgramMetadata>,
}

/// Full program view: metadata plus the enrolled clients.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramDetail {
    #[serde(flatten)]
    pub program: Program,
    pub metadata: Option<ProgramMetadata>,
    pub clients: Vec<EnrolledClient>,
}

/// A program as seen from a client detail, with the enrollment time.
#[derive(Debug, Clone, Serialize)]
pub struct EnrolledProgram {
    #[serde(flatten)]
    pub program: Program,
    pub metadata: Option<ProgramMetadata>,
    pub enrolled_at: NaiveDateTime,
}

/// A client as seen from a program detail, with the enrollment time.
#[derive(Debug, Clone, Serialize)]
pub struct EnrolledClient {
    #[serde(flatten)]
    pub client: Client,
    pub enrolled_at: NaiveDateTime,
}

// ═══════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════

/// Validated fields for creating a program.
#[derive(Debug, Clone)]
pub struct NewProgram {
    pub name: String,
    pub description: String,
    pub metadata: Option<ProgramMetadataFields>,
}

/// Validated sparse field set for a partial update.
#[derive(Debug, Clone, Default)]
pub struct ProgramChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<ProgramMetadataFields>,
}

/// Metadata payload shared by create and update. `current_enrollment`
/// is deliberately absent: the column starts at zero and only the
/// recount path writes it.
#[derive(Debug, Clone, Default)]
pub struct ProgramMetadataFields {
    pub duration: Option<i64>,
    pub department: Option<String>,
    pub max_capacity: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<ProgramStatus>,
    pub cost: Option<Decimal>,
}

impl ProgramMetadataFields {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.duration.is_none()
            && self.department.is_none()
            && self.max_capacity.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.status.is_none()
            && self.cost.is_none()
    }
}
