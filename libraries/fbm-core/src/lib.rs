//! FBM Core
//!
//! Domain types, error classification and the storage trait shared by the
//! persistence gateway and the tools built on top of it.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `User`, `UserField`, `FieldChange`
//! - **Core Traits**: `UserStore`
//! - **Error Handling**: `CoreError` and the `ErrorKind` taxonomy
//!
//! # Example
//!
//! ```rust
//! use fbm_core::{FieldChange, User, UserField};
//!
//! let mut user = User::new("Ivan", "ivan", "x", 30);
//!
//! let change = "name".parse::<UserField>().unwrap().parse_change("Petr").unwrap();
//! assert_eq!(change, FieldChange::Name("Petr".into()));
//!
//! user.apply(change);
//! assert_eq!(user.name, "Petr");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, ErrorKind, Result};
pub use storage::UserStore;
pub use types::{FieldChange, User, UserField, UserId};
