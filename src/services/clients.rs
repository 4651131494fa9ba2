//! Client administration: drafts in, validated commands through the
//! repository, read shapes out.

use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::ServiceError;
use crate::db::repository;
use crate::models::enums::{ClientStatus, Gender};
use crate::models::{
    ClientChanges, ClientDetail, ClientMetadataFields, ClientWithMetadata, NewClient, PublicProfile,
};
use crate::validation::{self, ValidationError};

// ═══════════════════════════════════════════════════════════════════════════
// Drafts — raw request bodies, everything optional
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub contact_info: Option<String>,
    pub metadata: Option<ClientMetadataDraft>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientMetadataDraft {
    pub admission_date: Option<String>,
    pub department: Option<String>,
    pub diagnosis: Option<String>,
    pub status: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Validation — pure, no store access
// ═══════════════════════════════════════════════════════════════════════════

/// Check a create draft rule-by-rule and produce the typed command.
pub fn validate_new_client(draft: &ClientDraft) -> Result<NewClient, ValidationError> {
    let first_name = validation::require(draft.first_name.as_deref(), "first_name")?.to_string();
    let last_name = validation::require(draft.last_name.as_deref(), "last_name")?.to_string();
    let dob = validation::require(draft.date_of_birth.as_deref(), "date_of_birth")?;
    let date_of_birth = validation::parse_date(dob, "date_of_birth")?;
    let gender_raw = validation::require(draft.gender.as_deref(), "gender")?;
    let gender = validation::parse_enum::<Gender>(gender_raw, "gender", Gender::variants())?;
    let metadata = draft
        .metadata
        .as_ref()
        .map(validate_client_metadata)
        .transpose()?
        .filter(|fields| !fields.is_empty());

    Ok(NewClient {
        first_name,
        last_name,
        date_of_birth,
        gender,
        contact_info: validation::opt_text(&draft.contact_info),
        metadata,
    })
}

/// Check an update draft. Everything is optional here; blank strings
/// read as "leave unchanged".
pub fn validate_client_changes(draft: &ClientDraft) -> Result<ClientChanges, ValidationError> {
    let date_of_birth = validation::opt_date(&draft.date_of_birth, "date_of_birth")?;
    let gender = validation::opt_enum::<Gender>(&draft.gender, "gender", Gender::variants())?;
    let metadata = draft
        .metadata
        .as_ref()
        .map(validate_client_metadata)
        .transpose()?
        .filter(|fields| !fields.is_empty());

    Ok(ClientChanges {
        first_name: validation::opt_text(&draft.first_name),
        last_name: validation::opt_text(&draft.last_name),
        date_of_birth,
        gender,
        contact_info: validation::opt_text(&draft.contact_info),
        metadata,
    })
}

fn validate_client_metadata(draft: &ClientMetadataDraft) -> Result<ClientMetadataFields, ValidationError> {
    let admission_date = validation::opt_date(&draft.admission_date, "metadata.admission_date")?;
    let status = validation::opt_enum::<ClientStatus>(
        &draft.status,
        "metadata.status",
        ClientStatus::variants(),
    )?;
    let email = validation::opt_text(&draft.email);
    if let Some(email) = &email {
        validation::check_email(email, "metadata.email")?;
    }

    Ok(ClientMetadataFields {
        admission_date,
        department: validation::opt_text(&draft.department),
        diagnosis: validation::opt_text(&draft.diagnosis),
        status,
        contact: validation::opt_text(&draft.contact),
        email,
        address: validation::opt_text(&draft.address),
        insurance_provider: validation::opt_text(&draft.insurance_provider),
        insurance_number: validation::opt_text(&draft.insurance_number),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════════════════════════════════════

/// All clients, or a filtered set when a search term is given.
pub fn list_clients(
    conn: &Connection,
    search: Option<&str>,
) -> Result<Vec<ClientWithMetadata>, ServiceError> {
    let clients = match search.map(str::trim) {
        Some(text) if !text.is_empty() => repository::search_clients(conn, text)?,
        _ => repository::list_clients(conn)?,
    };
    Ok(clients)
}

pub fn create_client(conn: &Connection, draft: &ClientDraft) -> Result<ClientWithMetadata, ServiceError> {
    let command = validate_new_client(draft)?;
    Ok(repository::insert_client(conn, &command)?)
}

pub fn get_client(conn: &Connection, id: &Uuid) -> Result<ClientDetail, ServiceError> {
    Ok(repository::get_client_detail(conn, id)?)
}

pub fn update_client(
    conn: &Connection,
    id: &Uuid,
    draft: &ClientDraft,
) -> Result<ClientWithMetadata, ServiceError> {
    let changes = validate_client_changes(draft)?;
    Ok(repository::update_client(conn, id, &changes)?)
}

pub fn delete_client(conn: &Connection, id: &Uuid) -> Result<(), ServiceError> {
    Ok(repository::delete_client(conn, id)?)
}

pub fn public_profile(conn: &Connection, id: &Uuid) -> Result<PublicProfile, ServiceError> {
    Ok(repository::public_profile(conn, id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn full_draft() -> ClientDraft {
        ClientDraft {
            first_name: Some("Amina".into()),
            last_name: Some("Diallo".into()),
            date_of_birth: Some("1990-04-12".into()),
            gender: Some("female".into()),
            contact_info: Some("+1 555 0100".into()),
            metadata: Some(ClientMetadataDraft {
                admission_date: Some("2024-01-15".into()),
                department: Some("Cardiology".into()),
                diagnosis: Some("Hypertension".into()),
                status: Some("INPATIENT".into()),
                email: Some("amina@example.com".into()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn create_requires_first_name() {
        let draft = ClientDraft {
            first_name: None,
            ..full_draft()
        };
        let err = validate_new_client(&draft).unwrap_err();
        assert_eq!(err.to_string(), "first_name is required");
    }

    #[test]
    fn create_rejects_unknown_gender() {
        let draft = ClientDraft {
            gender: Some("robot".into()),
            ..full_draft()
        };
        let err = validate_new_client(&draft).unwrap_err();
        assert_eq!(err.to_string(), "gender must be one of: male, female, other");
    }

    #[test]
    fn create_rejects_malformed_birth_date() {
        let draft = ClientDraft {
            date_of_birth: Some("12/04/1990".into()),
            ..full_draft()
        };
        assert!(validate_new_client(&draft).is_err());
    }

    #[test]
    fn create_accepts_full_draft() {
        let command = validate_new_client(&full_draft()).unwrap();
        assert_eq!(command.first_name, "Amina");
        assert_eq!(command.gender, Gender::Female);
        assert_eq!(
            command.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 4, 12).unwrap()
        );
        let meta = command.metadata.unwrap();
        assert_eq!(meta.status, Some(ClientStatus::Inpatient));
        assert_eq!(meta.email.as_deref(), Some("amina@example.com"));
    }

    #[test]
    fn metadata_email_is_checked() {
        let mut draft = full_draft();
        if let Some(meta) = &mut draft.metadata {
            meta.email = Some("not-an-email".into());
        }
        let err = validate_new_client(&draft).unwrap_err();
        assert_eq!(err.to_string(), "metadata.email must be a valid email address");
    }

    #[test]
    fn metadata_status_is_case_sensitive() {
        let mut draft = full_draft();
        if let Some(meta) = &mut draft.metadata {
            meta.status = Some("inpatient".into());
        }
        let err = validate_new_client(&draft).unwrap_err();
        assert!(err.to_string().contains("INPATIENT, OUTPATIENT"));
    }

    #[test]
    fn empty_metadata_object_is_dropped() {
        let draft = ClientDraft {
            metadata: Some(ClientMetadataDraft::default()),
            ..full_draft()
        };
        let command = validate_new_client(&draft).unwrap();
        assert!(command.metadata.is_none());
    }

    #[test]
    fn update_accepts_empty_draft() {
        let changes = validate_client_changes(&ClientDraft::default()).unwrap();
        assert!(changes.first_name.is_none());
        assert!(changes.gender.is_none());
        assert!(changes.metadata.is_none());
    }

    #[test]
    fn update_treats_blank_strings_as_absent() {
        let draft = ClientDraft {
            first_name: Some("  ".into()),
            gender: Some("".into()),
            ..Default::default()
        };
        let changes = validate_client_changes(&draft).unwrap();
        assert!(changes.first_name.is_none());
        assert!(changes.gender.is_none());
    }

    #[test]
    fn update_still_validates_present_fields() {
        let draft = ClientDraft {
            gender: Some("unknown".into()),
            ..Default::default()
        };
        assert!(validate_client_changes(&draft).is_err());
    }
}
