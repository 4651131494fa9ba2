use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ClientStatus, Gender};
use super::program::EnrolledProgram;

// ═══════════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════════

/// A person receiving care. Demographics live here; administrative
/// detail lives in the optional 1:1 [`ClientMetadata`] record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub contact_info: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Administrative metadata for a client. At most one row per client,
/// removed together with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub id: Uuid,
    pub client_id: Uuid,
    pub admission_date: Option<NaiveDate>,
    pub department: Option<String>,
    pub diagnosis: Option<String>,
    pub status: Option<ClientStatus>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Client with its metadata attached; the standard read shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientWithMetadata {
    #[serde(flatten)]
    pub client: Client,
    pub metadata: Option<ClientMetadata>,
}

/// Full client view: metadata plus the programs the client is enrolled in.
#[derive(Debug, Clone, Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub metadata: Option<ClientMetadata>,
    pub programs: Vec<EnrolledProgram>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════

/// Validated fields for creating a client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub contact_info: Option<String>,
    pub metadata: Option<ClientMetadataFields>,
}

/// Validated sparse field set for a partial update. `None` leaves the
/// stored value unchanged.
#[derive(Debug, Clone, Default)]
pub struct ClientChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub contact_info: Option<String>,
    pub metadata: Option<ClientMetadataFields>,
}

/// Metadata payload shared by create and update; every field optional.
#[derive(Debug, Clone, Default)]
pub struct ClientMetadataFields {
    pub admission_date: Option<NaiveDate>,
    pub department: Option<String>,
    pub diagnosis: Option<String>,
    pub status: Option<ClientStatus>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
}

impl ClientMetadataFields {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.admission_date.is_none()
            && self.department.is_none()
            && self.diagnosis.is_none()
            && self.status.is_none()
            && self.contact.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.insurance_provider.is_none()
            && self.insurance_number.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Projections
// ═══════════════════════════════════════════════════════════════════════════

/// Reduced projection for non-privileged consumers: names and program
/// membership only. No metadata, contact, or insurance fields.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub programs: Vec<ProgramRef>,
}

/// Program reference exposed in the public profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramRef {
    pub id: Uuid,
    pub name: String,
}
