//! The acting user attached to every mutation.
//!
//! Authentication happens outside this workspace; callers hand in the
//! already-resolved identity.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Who is performing a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorContext {
    pub user_id: String,
    pub user_name: String,
    /// Agency staff may price, assign, and move requests freely along the graph.
    pub is_agency: bool,
}

impl ActorContext {
    pub fn client(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            is_agency: false,
        }
    }

    pub fn staff(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            is_agency: true,
        }
    }

    /// Reject a context with a missing identity.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.user_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "Actor context is missing a user id".to_string(),
            ));
        }
        if self.user_name.trim().is_empty() {
            return Err(CoreError::Validation(
                "Actor context is missing a user name".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and require agency staff.
    pub fn require_agency(&self, operation: &str) -> Result<(), CoreError> {
        self.validate()?;
        if !self.is_agency {
            return Err(CoreError::Forbidden(format!(
                "Only agency staff can {operation}"
            )));
        }
        Ok(())
    }
}
