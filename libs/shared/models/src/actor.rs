use serde::{Deserialize, Serialize};

const SYSTEM_ACTOR: &str = "system";

/// The identity a mutating operation is performed on behalf of.
///
/// Services receive it as an explicit argument and stamp it into the
/// `created_by` / `updated_by` audit fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Option<String>,
    pub email: Option<String>,
}

impl Actor {
    pub fn system() -> Self {
        Self { id: None, email: None }
    }

    pub fn user(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: Some(id.into()),
            email,
        }
    }

    pub fn audit_name(&self) -> String {
        self.id.clone().unwrap_or_else(|| SYSTEM_ACTOR.to_string())
    }

    pub fn is_system(&self) -> bool {
        self.id.is_none()
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::system()
    }
}
