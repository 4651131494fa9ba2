//! Service layer — validation plus repository orchestration, one
//! module per operation family.

pub mod clients;
pub mod enrollment;
pub mod programs;

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::validation::ValidationError;

/// Errors surfaced by service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("enrollment recorded but the count refresh failed for program {program_id}")]
    RecountFailed {
        program_id: Uuid,
        #[source]
        source: DatabaseError,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
