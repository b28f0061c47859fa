use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Body for `POST /auth/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember: Option<bool>,
}

impl LoginCredentials {
    /// Reject blank fields before anything reaches the network.
    pub fn validate(&self) -> Result<(), ApiError> {
        require("Email", &self.email)?;
        require("Password", &self.password)
    }
}

/// Body for `POST /auth/register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl RegisterData {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("Name", &self.name)?;
        require("Email", &self.email)?;
        require("Password", &self.password)?;
        if self.password != self.password_confirmation {
            return Err(ApiError::Invalid(
                "Password confirmation does not match".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body for `PUT /auth/profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::Invalid(format!("{field} is required")))
    } else {
        Ok(())
    }
}
