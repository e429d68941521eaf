use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Role, User};

/// Request body for pensioner registration. Any `role` sent by the client is ignored.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub pension_number: String,
    pub phone_number: String,
    pub address: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login, register or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Which dashboard the client shell renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dashboard {
    Pensioner,
    Admin,
}

impl From<Role> for Dashboard {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Dashboard::Admin,
            Role::Pensioner => Dashboard::Pensioner,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub user: User,
    pub dashboard: Dashboard,
}

#[cfg(test)]
impl RegisterRequest {
    pub fn sample(email: &str) -> Self {
        Self {
            email: email.into(),
            password: "secret123".into(),
            full_name: "Ada Pensioner".into(),
            pension_number: "PN-0001".into(),
            phone_number: "555-0101".into(),
            address: "1 Main St".into(),
            date_of_birth: "1950-03-14".into(),
        }
    }
}
