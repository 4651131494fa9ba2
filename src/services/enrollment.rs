//! Enrollment orchestration — the one cross-entity operation.
//!
//! Flow: validate the draft, confirm every referenced entity exists,
//! attach missing pairs, then recount every requested program. Enroll
//! and recount run as separate transactions; the stored counters are
//! only as fresh as the last recount.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ServiceError;
use crate::db::repository;
use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentDraft {
    pub client_id: Option<String>,
    pub program_ids: Option<Vec<String>>,
}

/// Typed command after shape validation: one client, a deduplicated
/// list of programs.
#[derive(Debug, Clone)]
pub struct EnrollmentRequest {
    pub client_id: Uuid,
    pub program_ids: Vec<Uuid>,
}

/// Response payload: what was attached, what already existed, and the
/// freshly recomputed counter per requested program.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentReport {
    pub client_id: Uuid,
    pub attached: Vec<Uuid>,
    pub already_enrolled: Vec<Uuid>,
    pub counts: Vec<ProgramCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramCount {
    pub program_id: Uuid,
    pub current_enrollment: i64,
}

/// Shape-check a draft: ids must parse and the program list must be
/// non-empty. Duplicates collapse, order preserved.
pub fn validate_enrollment(draft: &EnrollmentDraft) -> Result<EnrollmentRequest, ValidationError> {
    let client_raw = validation::require(draft.client_id.as_deref(), "client_id")?;
    let client_id = validation::parse_id(client_raw, "client_id")?;

    let raw_ids = draft.program_ids.as_deref().unwrap_or_default();
    if raw_ids.is_empty() {
        return Err(ValidationError::new("program_ids must be a non-empty list"));
    }
    let mut program_ids: Vec<Uuid> = Vec::with_capacity(raw_ids.len());
    for raw in raw_ids {
        let id = validation::parse_id(raw, "program_ids")?;
        if !program_ids.contains(&id) {
            program_ids.push(id);
        }
    }

    Ok(EnrollmentRequest {
        client_id,
        program_ids,
    })
}

/// Enroll a client in a set of programs and refresh their counters.
///
/// Every requested program is recounted, already-enrolled ones
/// included. A recount failure fails the whole call and names the
/// program; counters recomputed before the failure keep their values,
/// the rest stay stale until the next recount.
pub fn enroll(conn: &Connection, draft: &EnrollmentDraft) -> Result<EnrollmentReport, ServiceError> {
    let request = validate_enrollment(draft)?;

    // Unknown references are validation failures, not lookup misses.
    if !repository::client_exists(conn, &request.client_id)? {
        return Err(ValidationError::new(format!(
            "client_id {} does not reference an existing client",
            request.client_id
        ))
        .into());
    }
    let mut missing = Vec::new();
    for program_id in &request.program_ids {
        if !repository::program_exists(conn, program_id)? {
            missing.push(program_id.to_string());
        }
    }
    if !missing.is_empty() {
        return Err(ValidationError::new(format!(
            "program_ids do not reference existing programs: {}",
            missing.join(", ")
        ))
        .into());
    }

    let outcome = repository::enroll_client(
        conn,
        &request.client_id,
        &request.program_ids,
        repository::now_utc(),
    )?;

    let mut counts = Vec::with_capacity(request.program_ids.len());
    for program_id in &request.program_ids {
        let count = repository::recount_enrollment(conn, program_id).map_err(|source| {
            ServiceError::RecountFailed {
                program_id: *program_id,
                source,
            }
        })?;
        counts.push(ProgramCount {
            program_id: *program_id,
            current_enrollment: count,
        });
    }

    Ok(EnrollmentReport {
        client_id: request.client_id,
        attached: outcome.attached,
        already_enrolled: outcome.already_enrolled,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::services::{clients, programs};
    use rusqlite::Connection;

    fn draft(client_id: &Uuid, program_ids: &[Uuid]) -> EnrollmentDraft {
        EnrollmentDraft {
            client_id: Some(client_id.to_string()),
            program_ids: Some(program_ids.iter().map(|id| id.to_string()).collect()),
        }
    }

    fn make_client(conn: &Connection) -> Uuid {
        clients::create_client(
            conn,
            &clients::ClientDraft {
                first_name: Some("Ana".into()),
                last_name: Some("Paz".into()),
                date_of_birth: Some("1985-06-01".into()),
                gender: Some("female".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .client
        .id
    }

    fn make_program(conn: &Connection, name: &str) -> Uuid {
        programs::create_program(
            conn,
            &programs::ProgramDraft {
                name: Some(name.into()),
                description: Some("A care program".into()),
                metadata: Some(programs::ProgramMetadataDraft {
                    max_capacity: Some(serde_json::json!(10)),
                    ..Default::default()
                }),
            },
        )
        .unwrap()
        .program
        .id
    }

    #[test]
    fn validate_requires_client_id() {
        let err = validate_enrollment(&EnrollmentDraft::default()).unwrap_err();
        assert_eq!(err.to_string(), "client_id is required");
    }

    #[test]
    fn validate_rejects_empty_program_list() {
        let draft = EnrollmentDraft {
            client_id: Some(Uuid::new_v4().to_string()),
            program_ids: Some(vec![]),
        };
        let err = validate_enrollment(&draft).unwrap_err();
        assert_eq!(err.to_string(), "program_ids must be a non-empty list");
    }

    #[test]
    fn validate_rejects_malformed_ids() {
        let draft = EnrollmentDraft {
            client_id: Some("nope".into()),
            program_ids: Some(vec![Uuid::new_v4().to_string()]),
        };
        assert!(validate_enrollment(&draft).is_err());

        let draft = EnrollmentDraft {
            client_id: Some(Uuid::new_v4().to_string()),
            program_ids: Some(vec!["nope".into()]),
        };
        assert!(validate_enrollment(&draft).is_err());
    }

    #[test]
    fn validate_dedupes_program_ids() {
        let pid = Uuid::new_v4();
        let request = validate_enrollment(&EnrollmentDraft {
            client_id: Some(Uuid::new_v4().to_string()),
            program_ids: Some(vec![pid.to_string(), pid.to_string()]),
        })
        .unwrap();
        assert_eq!(request.program_ids, vec![pid]);
    }

    #[test]
    fn enroll_unknown_client_is_validation_error() {
        let conn = open_memory_database().unwrap();
        let pid = make_program(&conn, "Rehab");
        let ghost = Uuid::new_v4();

        let err = enroll(&conn, &draft(&ghost, &[pid])).unwrap_err();
        match err {
            ServiceError::Validation(e) => assert!(e.to_string().contains(&ghost.to_string())),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn enroll_names_missing_programs() {
        let conn = open_memory_database().unwrap();
        let cid = make_client(&conn);
        let real = make_program(&conn, "Rehab");
        let ghost = Uuid::new_v4();

        let err = enroll(&conn, &draft(&cid, &[real, ghost])).unwrap_err();
        match err {
            ServiceError::Validation(e) => {
                let msg = e.to_string();
                assert!(msg.contains(&ghost.to_string()));
                assert!(!msg.contains(&real.to_string()));
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        // Nothing was attached for the valid program either.
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM enrollments", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn enroll_attaches_and_reports_counts() {
        let conn = open_memory_database().unwrap();
        let cid = make_client(&conn);
        let p1 = make_program(&conn, "One");
        let p2 = make_program(&conn, "Two");

        let report = enroll(&conn, &draft(&cid, &[p1, p2])).unwrap();
        assert_eq!(report.client_id, cid);
        assert_eq!(report.attached, vec![p1, p2]);
        assert!(report.already_enrolled.is_empty());
        assert_eq!(report.counts.len(), 2);
        assert!(report
            .counts
            .iter()
            .all(|c| c.current_enrollment == 1));
    }

    #[test]
    fn repeat_enroll_reports_already_enrolled_and_recounts() {
        let conn = open_memory_database().unwrap();
        let cid = make_client(&conn);
        let pid = make_program(&conn, "Rehab");

        enroll(&conn, &draft(&cid, &[pid])).unwrap();
        let second = enroll(&conn, &draft(&cid, &[pid])).unwrap();

        assert!(second.attached.is_empty());
        assert_eq!(second.already_enrolled, vec![pid]);
        assert_eq!(second.counts.len(), 1);
        assert_eq!(second.counts[0].current_enrollment, 1);
    }

    #[test]
    fn stored_counter_matches_report() {
        let conn = open_memory_database().unwrap();
        let a = make_client(&conn);
        let pid = make_program(&conn, "Rehab");

        let report = enroll(&conn, &draft(&a, &[pid])).unwrap();
        assert_eq!(report.counts[0].current_enrollment, 1);

        let stored: i64 = conn
            .query_row(
                "SELECT current_enrollment FROM program_metadata WHERE program_id = ?1",
                rusqlite::params![pid.to_string()],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(stored, 1);
    }
}
