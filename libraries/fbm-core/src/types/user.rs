//! User domain types

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned primary key
pub type UserId = i64;

/// User record
///
/// `id` is assigned by the remote store. `created_at` is stamped once when the
/// record is created and is never rewritten by updates.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Primary key, `0` until stored
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Login name
    pub login: String,
    /// Stored exactly as supplied; see `Debug` for redaction.
    pub password: String,
    /// Age in years
    pub age: i32,
    /// Creation time (UTC)
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create an unsaved user.
    ///
    /// The id is `0` until the store echoes the inserted row back, and the
    /// timestamp is replaced by the gateway at insert time.
    pub fn new(
        name: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
        age: i32,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            login: login.into(),
            password: password.into(),
            age,
            created_at: Utc::now(),
        }
    }

    /// Apply a single-field change to this record.
    pub fn apply(&mut self, change: FieldChange) {
        match change {
            FieldChange::Name(name) => self.name = name,
            FieldChange::Login(login) => self.login = login,
            FieldChange::Password(password) => self.password = password,
            FieldChange::Age(age) => self.age = age,
        }
    }
}

// Passwords must never reach log output.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("age", &self.age)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// The mutable fields of a [`User`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserField {
    /// `name` column
    Name,
    /// `login` column
    Login,
    /// `password` column
    Password,
    /// `age` column
    Age,
}

impl UserField {
    /// Every mutable field, in column order
    pub const ALL: [UserField; 4] = [Self::Name, Self::Login, Self::Password, Self::Age];

    /// Column name of this field
    pub fn as_str(&self) -> &'static str {
        match self {
            UserField::Name => "name",
            UserField::Login => "login",
            UserField::Password => "password",
            UserField::Age => "age",
        }
    }

    /// Build a change for this field from its textual value.
    pub fn parse_change(self, value: &str) -> Result<FieldChange, CoreError> {
        match self {
            UserField::Name => Ok(FieldChange::Name(value.to_string())),
            UserField::Login => Ok(FieldChange::Login(value.to_string())),
            UserField::Password => Ok(FieldChange::Password(value.to_string())),
            UserField::Age => value
                .trim()
                .parse::<i32>()
                .map(FieldChange::Age)
                .map_err(|e| CoreError::invalid_value("age", e.to_string())),
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownField(s.to_string()))
    }
}

/// A new value for exactly one mutable field
#[derive(Clone, PartialEq, Eq)]
pub enum FieldChange {
    /// New display name
    Name(String),
    /// New login name
    Login(String),
    /// New password
    Password(String),
    /// New age
    Age(i32),
}

impl FieldChange {
    /// The field this change targets
    pub fn field(&self) -> UserField {
        match self {
            FieldChange::Name(_) => UserField::Name,
            FieldChange::Login(_) => UserField::Login,
            FieldChange::Password(_) => UserField::Password,
            FieldChange::Age(_) => UserField::Age,
        }
    }
}

impl fmt::Debug for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldChange::Name(name) => f.debug_tuple("Name").field(name).finish(),
            FieldChange::Login(login) => f.debug_tuple("Login").field(login).finish(),
            FieldChange::Password(_) => f.debug_tuple("Password").field(&"<redacted>").finish(),
            FieldChange::Age(age) => f.debug_tuple("Age").field(age).finish(),
        }
    }
}
