//! Domain types

mod user;

pub use user::{FieldChange, User, UserField, UserId};
