use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Transport-office staff, scoped to one office.
    Operator,
    /// Internal jobs (expiry sweep); not tied to an office.
    System,
}

/// The authenticated caller, passed explicitly into every state-changing
/// operation instead of being read from ambient session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorIdentity {
    pub operator_id: String,
    pub office_id: Option<Uuid>,
    pub role: Role,
}

impl OperatorIdentity {
    pub fn operator(operator_id: impl Into<String>, office_id: Uuid) -> Self {
        Self {
            operator_id: operator_id.into(),
            office_id: Some(office_id),
            role: Role::Operator,
        }
    }

    pub fn system() -> Self {
        Self {
            operator_id: "system".to_string(),
            office_id: None,
            role: Role::System,
        }
    }
}

/// Pure authorization check: may this caller act on resources of `office_id`?
pub fn authorize_office(identity: &OperatorIdentity, office_id: Uuid) -> Result<(), CoreError> {
    match identity.role {
        Role::System => Ok(()),
        Role::Operator => {
            if identity.office_id == Some(office_id) {
                Ok(())
            } else {
                tracing::warn!(
                    operator = %identity.operator_id,
                    "operator denied access to foreign office"
                );
                Err(CoreError::Unauthorized)
            }
        }
    }
}
