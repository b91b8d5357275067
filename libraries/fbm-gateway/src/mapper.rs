//! Field-to-column mapping for the user table.
//!
//! The correspondence is a fixed table. Every translation in either
//! direction walks [`USER_COLUMNS`]; nothing is derived from the struct.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use fbm_core::{User, UserField};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors translating between rows and users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Response is not a JSON array of rows")]
    NotAnArray,

    #[error("Row is not a JSON object")]
    NotAnObject,

    #[error("Missing column: {0}")]
    MissingColumn(&'static str),

    #[error("Invalid value in column {column}: {reason}")]
    InvalidColumn { column: &'static str, reason: String },
}

/// Entity field carried by a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Name,
    Login,
    Password,
    Age,
    CreatedAt,
}

/// One row of the mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub field: Field,
    pub column: &'static str,
    /// Written by insert
    pub on_insert: bool,
    /// Written by update
    pub on_update: bool,
}

/// The user table's columns.
///
/// `id` is server-assigned and never written. `created_at` is written once on
/// insert and never on update.
pub const USER_COLUMNS: [ColumnMapping; 6] = [
    ColumnMapping {
        field: Field::Id,
        column: "id",
        on_insert: false,
        on_update: false,
    },
    ColumnMapping {
        field: Field::Name,
        column: "name",
        on_insert: true,
        on_update: true,
    },
    ColumnMapping {
        field: Field::Login,
        column: "login",
        on_insert: true,
        on_update: true,
    },
    ColumnMapping {
        field: Field::Password,
        column: "password",
        on_insert: true,
        on_update: true,
    },
    ColumnMapping {
        field: Field::Age,
        column: "age",
        on_insert: true,
        on_update: true,
    },
    ColumnMapping {
        field: Field::CreatedAt,
        column: "created_at",
        on_insert: true,
        on_update: false,
    },
];

impl ColumnMapping {
    fn encode(&self, user: &User) -> Value {
        match self.field {
            Field::Id => Value::from(user.id),
            Field::Name => Value::from(user.name.clone()),
            Field::Login => Value::from(user.login.clone()),
            Field::Password => Value::from(user.password.clone()),
            Field::Age => Value::from(user.age),
            Field::CreatedAt => Value::from(encode_timestamp(&user.created_at)),
        }
    }

    fn decode_into(&self, user: &mut User, value: &Value) -> Result<(), MappingError> {
        let column = self.column;
        match self.field {
            Field::Id => user.id = integer(column, value)?,
            Field::Name => user.name = text(column, value)?,
            Field::Login => user.login = text(column, value)?,
            Field::Password => user.password = text(column, value)?,
            Field::Age => {
                let age = integer(column, value)?;
                user.age = i32::try_from(age).map_err(|e| MappingError::InvalidColumn {
                    column,
                    reason: e.to_string(),
                })?;
            }
            Field::CreatedAt => {
                let raw = text(column, value)?;
                user.created_at =
                    parse_timestamp(&raw).ok_or_else(|| MappingError::InvalidColumn {
                        column,
                        reason: format!("unrecognised timestamp {:?}", raw),
                    })?;
            }
        }
        Ok(())
    }
}

/// Bidirectional translation between users and wire rows.
pub struct RecordMapper;

impl RecordMapper {
    pub fn columns() -> &'static [ColumnMapping] {
        &USER_COLUMNS
    }

    /// Column name for a mutable field.
    pub fn column_for(field: UserField) -> &'static str {
        let wanted = match field {
            UserField::Name => Field::Name,
            UserField::Login => Field::Login,
            UserField::Password => Field::Password,
            UserField::Age => Field::Age,
        };
        USER_COLUMNS
            .iter()
            .find(|mapping| mapping.field == wanted)
            .map(|mapping| mapping.column)
            .unwrap_or_else(|| field.as_str())
    }

    /// Value for the `select=` query parameter.
    pub fn select_columns() -> String {
        USER_COLUMNS
            .iter()
            .map(|mapping| mapping.column)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Row sent with an insert.
    pub fn to_insert_row(user: &User) -> Value {
        Self::row(user, |mapping| mapping.on_insert)
    }

    /// Row sent with an update.
    pub fn to_update_row(user: &User) -> Value {
        Self::row(user, |mapping| mapping.on_update)
    }

    fn row(user: &User, include: impl Fn(&ColumnMapping) -> bool) -> Value {
        let row: Map<String, Value> = USER_COLUMNS
            .iter()
            .filter(|mapping| include(mapping))
            .map(|mapping| (mapping.column.to_string(), mapping.encode(user)))
            .collect();
        Value::Object(row)
    }

    /// Translate one row into a user.
    pub fn from_row(row: &Value) -> Result<User, MappingError> {
        let object = row.as_object().ok_or(MappingError::NotAnObject)?;

        let mut user = User {
            id: 0,
            name: String::new(),
            login: String::new(),
            password: String::new(),
            age: 0,
            created_at: DateTime::<Utc>::default(),
        };

        for mapping in &USER_COLUMNS {
            let value = object
                .get(mapping.column)
                .ok_or(MappingError::MissingColumn(mapping.column))?;
            mapping.decode_into(&mut user, value)?;
        }

        Ok(user)
    }

    /// Translate a response body (a JSON array of rows).
    pub fn from_rows(body: &Value) -> Result<Vec<User>, MappingError> {
        body.as_array()
            .ok_or(MappingError::NotAnArray)?
            .iter()
            .map(Self::from_row)
            .collect()
    }
}

fn integer(column: &'static str, value: &Value) -> Result<i64, MappingError> {
    value.as_i64().ok_or_else(|| MappingError::InvalidColumn {
        column,
        reason: format!("expected integer, got {}", value),
    })
}

fn text(column: &'static str, value: &Value) -> Result<String, MappingError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| MappingError::InvalidColumn {
            column,
            reason: format!("expected string, got {}", value),
        })
}

/// Timestamps go over the wire at microsecond precision, matching Postgres.
pub fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts `timestamptz` output and offset-less `timestamp` output (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored_row() -> Value {
        json!({
            "id": 7,
            "name": "Ivan",
            "login": "ivan",
            "password": "x",
            "age": 30,
            "created_at": "2024-03-01T10:15:30.123456+00:00"
        })
    }

    #[test]
    fn mapping_table_covers_every_column_once() {
        let columns: Vec<_> = RecordMapper::columns().iter().map(|m| m.column).collect();
        assert_eq!(
            columns,
            vec!["id", "name", "login", "password", "age", "created_at"]
        );
        assert_eq!(
            RecordMapper::select_columns(),
            "id,name,login,password,age,created_at"
        );
    }

    #[test]
    fn mutable_fields_resolve_to_columns() {
        assert_eq!(RecordMapper::column_for(UserField::Name), "name");
        assert_eq!(RecordMapper::column_for(UserField::Age), "age");
    }

    #[test]
    fn row_decodes_into_user() {
        let user = RecordMapper::from_row(&stored_row()).unwrap();

        assert_eq!(user.id, 7);
        assert_eq!(user.name, "Ivan");
        assert_eq!(user.login, "ivan");
        assert_eq!(user.password, "x");
        assert_eq!(user.age, 30);
        assert_eq!(
            user.created_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 30).unwrap()
                + chrono::Duration::microseconds(123_456)
        );
    }

    #[test]
    fn insert_row_omits_id() {
        let mut user = RecordMapper::from_row(&stored_row()).unwrap();
        user.id = 99;

        let row = RecordMapper::to_insert_row(&user);
        let object = row.as_object().unwrap();

        assert!(!object.contains_key("id"));
        assert_eq!(object["name"], "Ivan");
        assert_eq!(object["age"], 30);
        assert_eq!(object["created_at"], "2024-03-01T10:15:30.123456Z");
    }

    #[test]
    fn update_row_omits_id_and_created_at() {
        let user = RecordMapper::from_row(&stored_row()).unwrap();

        let row = RecordMapper::to_update_row(&user);
        let object = row.as_object().unwrap();

        assert!(!object.contains_key("id"));
        assert!(!object.contains_key("created_at"));
        assert_eq!(object.len(), 4);
        assert_eq!(object["password"], "x");
    }

    #[test]
    fn encoded_insert_row_decodes_back() {
        let user = RecordMapper::from_row(&stored_row()).unwrap();

        let mut row = RecordMapper::to_insert_row(&user);
        row["id"] = json!(user.id);

        assert_eq!(RecordMapper::from_row(&row).unwrap(), user);
    }

    #[test]
    fn offsetless_timestamps_are_read_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 30).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T10:15:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 10:15:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:15:30+02:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn missing_column_is_reported() {
        let mut row = stored_row();
        row.as_object_mut().unwrap().remove("login");

        assert_eq!(
            RecordMapper::from_row(&row),
            Err(MappingError::MissingColumn("login"))
        );
    }

    #[test]
    fn wrongly_typed_column_is_reported() {
        let mut row = stored_row();
        row["age"] = json!("thirty");
        assert!(matches!(
            RecordMapper::from_row(&row),
            Err(MappingError::InvalidColumn { column: "age", .. })
        ));

        row["age"] = json!(i64::from(i32::MAX) + 1);
        assert!(matches!(
            RecordMapper::from_row(&row),
            Err(MappingError::InvalidColumn { column: "age", .. })
        ));
    }

    #[test]
    fn rows_must_be_an_array_of_objects() {
        assert_eq!(
            RecordMapper::from_rows(&json!({"id": 1})),
            Err(MappingError::NotAnArray)
        );
        assert_eq!(
            RecordMapper::from_rows(&json!([1])),
            Err(MappingError::NotAnObject)
        );
        assert_eq!(RecordMapper::from_rows(&json!([])), Ok(vec![]));
        assert_eq!(
            RecordMapper::from_rows(&json!([stored_row(), stored_row()]))
                .unwrap()
                .len(),
            2
        );
    }
}
