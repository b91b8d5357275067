//! FBM Persistence Gateway
//!
//! Create/read/update/delete access to the user table of a hosted
//! PostgREST backend (as exposed by Supabase).
//!
//! # Features
//!
//! - **Connection lifecycle**: settings checked up front, handshake deferred
//!   to first use and performed exactly once
//! - **Record mapping**: a fixed field-to-column table drives every row
//!   translation
//! - **Sentinel results**: through [`UserStore`] no error ever reaches the
//!   caller; failures are logged and become `None`, `false` or `vec![]`
//! - **Typed errors**: the `try_*` methods expose the underlying
//!   [`GatewayError`] for callers that need it
//!
//! # Example
//!
//! ```ignore
//! use fbm_gateway::{GatewaySettings, PersistenceGateway, UserStore};
//! use fbm_core::User;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load settings (config.toml + FBM_ environment variables)
//!     let settings = GatewaySettings::load_validated(None)?;
//!     let gateway = PersistenceGateway::from_settings(&settings.backend)?;
//!
//!     // Fail fast if the backend is not there
//!     gateway.connection().connect().await?;
//!
//!     let user = gateway.create(User::new("Ivan", "ivan", "x", 30)).await;
//!     println!("Created {:?}", user);
//!
//!     Ok(())
//! }
//! ```

mod connection;
mod error;
mod gateway;
mod mapper;
mod settings;

pub use connection::{ConnectionManager, RemoteHandle, REST_PATH};
pub use error::{GatewayError, Result};
pub use gateway::PersistenceGateway;
pub use mapper::{ColumnMapping, Field, MappingError, RecordMapper, USER_COLUMNS};
pub use settings::{BackendSettings, GatewaySettings, DEFAULT_CONFIG_FILE, ENV_PREFIX};

// Callers need the trait in scope for the sentinel methods
pub use fbm_core::UserStore;
