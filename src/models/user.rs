use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::UserId;

/// A registered member of the social graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub login: String,
    pub name: String,
    pub birthday: NaiveDate,
}

/// Payload for creating or replacing a user
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    pub birthday: NaiveDate,
}

impl NewUser {
    /// Display name, falling back to the login when no name was given
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.login.clone(),
        }
    }

    /// Materializes the payload under an assigned identifier
    pub fn into_user(self, id: UserId) -> User {
        let name = self.display_name();
        User {
            id,
            email: self.email,
            login: self.login,
            name,
            birthday: self.birthday,
        }
    }
}
