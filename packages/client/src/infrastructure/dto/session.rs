//! Identity service DTOs.

use serde::{Deserialize, Serialize};

/// Response body of the session lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDto {
    pub user: Option<SessionUserDto>,
}

/// Signed-in user as reported by the identity service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUserDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}
