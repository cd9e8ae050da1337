//! Users and login.
//!
//! Credentials are plaintext and compared directly. This is a single-shop
//! tool; there is no password hashing or lockout.

use crate::record::{null_as_empty, Record};
use crate::{error::Result, Error, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Employee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub full_name: String,
}

impl User {
    /// The account every fresh installation starts with.
    pub fn default_admin() -> Self {
        Self {
            id: "u1".to_string(),
            username: "admin".to_string(),
            password: "1234".to_string(),
            role: Role::Admin,
            full_name: "Админ".to_string(),
        }
    }

    /// Name shown in reports: full name, else the login.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDraft {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub full_name: String,
}

impl UserDraft {
    fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::MissingRequiredField("username"));
        }
        if self.password.is_empty() {
            return Err(Error::MissingRequiredField("password"));
        }
        Ok(())
    }
}

impl Record for User {
    type Draft = UserDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn create(id: RecordId, draft: UserDraft, _now: DateTime<Utc>) -> Result<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            username: draft.username.trim().to_string(),
            password: draft.password,
            role: draft.role,
            full_name: draft.full_name,
        })
    }

    fn apply(&mut self, draft: UserDraft, _now: DateTime<Utc>) -> Result<()> {
        draft.validate()?;
        self.username = draft.username.trim().to_string();
        self.password = draft.password;
        self.role = draft.role;
        self.full_name = draft.full_name;
        Ok(())
    }
}

/// Reject a username that another user already has (case-insensitive).
pub fn ensure_unique_username<'a>(
    users: impl IntoIterator<Item = &'a User>,
    username: &str,
    except_id: Option<&str>,
) -> Result<()> {
    let wanted = username.trim().to_lowercase();
    let taken = users
        .into_iter()
        .filter(|u| Some(u.id.as_str()) != except_id)
        .any(|u| u.username.to_lowercase() == wanted);
    if taken {
        Err(Error::DuplicateUsername(username.trim().to_string()))
    } else {
        Ok(())
    }
}

/// The authenticated identity carried by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: RecordId,
    pub username: String,
    pub role: Role,
    pub full_name: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            full_name: user.full_name.clone(),
        }
    }
}

/// Check credentials: username case-insensitive, password exact.
pub fn authenticate<'a>(
    users: impl IntoIterator<Item = &'a User>,
    username: &str,
    password: &str,
) -> Option<Principal> {
    let wanted = username.to_lowercase();
    users
        .into_iter()
        .find(|u| u.username.to_lowercase() == wanted && u.password == password)
        .map(Principal::from)
}
