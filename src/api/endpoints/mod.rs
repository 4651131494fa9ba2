//! API endpoint handlers.
//!
//! Each module covers one resource of the administration API. Handlers
//! validate through the service layer and wrap results in the standard
//! response envelope.

pub mod clients;
pub mod enrollments;
pub mod programs;
pub mod public;
pub mod status;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a path segment as a client or program id.
///
/// Malformed tokens map to `NotFound`, same as ids that parse but match
/// no row. Callers cannot tell the two apart.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).ok(), Some(id));
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(matches!(parse_id("not-a-uuid"), Err(ApiError::NotFound)));
    }
}
