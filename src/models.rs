//! Wire records exchanged with the Jobly REST API.
//!
//! Field names follow the API's camelCase JSON; Rust code sees snake_case.

use serde::{Deserialize, Serialize};

/// Numeric job identifier as assigned by the API.
pub type JobId = u64;

/// Full user record returned by `GET /users/{username}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    /// Server-side admin flag. Authoritative over the token's copy.
    #[serde(default)]
    pub is_admin: bool,
    /// Jobs this user has applied to.
    #[serde(default)]
    pub applications: Vec<JobId>,
}

/// Credentials for `POST /auth/token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    pub username: String,
    pub password: String,
}

/// Registration payload for `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupData {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
