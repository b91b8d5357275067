//! CRUD and partial-update surface over the user table.

use crate::connection::{ConnectionManager, RemoteHandle};
use crate::error::{GatewayError, Result};
use crate::mapper::RecordMapper;
use crate::settings::BackendSettings;
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use fbm_core::{ErrorKind, FieldChange, User, UserId, UserStore};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Persistence gateway for users.
///
/// The `try_*` methods return typed errors. The [`UserStore`] implementation
/// wraps them: every failure is logged with its [`ErrorKind`] and collapsed
/// into `None`, `false` or an empty vector.
///
/// # Example
///
/// ```ignore
/// use fbm_gateway::{BackendSettings, PersistenceGateway, UserStore};
/// use fbm_core::User;
///
/// let gateway = PersistenceGateway::from_settings(&BackendSettings::new(url, key))?;
///
/// let created = gateway.create(User::new("Ivan", "ivan", "x", 30)).await;
/// if let Some(user) = created {
///     gateway.update_name(user.id, "Petr".into()).await;
///     assert!(gateway.delete(user.id).await);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PersistenceGateway {
    connection: Arc<ConnectionManager>,
}

impl PersistenceGateway {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self { connection }
    }

    /// Create a gateway with its own connection manager.
    ///
    /// Only configuration problems are reported here; the backend is not
    /// contacted until the first operation.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self> {
        let connection = ConnectionManager::initialize(settings)?;
        Ok(Self::new(Arc::new(connection)))
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    async fn endpoint(&self) -> Result<(&RemoteHandle, String)> {
        let handle = self.connection.handle().await?;
        let url = handle.table_url(self.connection.table());
        Ok((handle, url))
    }

    /// Fetch every row.
    pub async fn try_list_all(&self) -> Result<Vec<User>> {
        let (handle, url) = self.endpoint().await?;
        debug!(url = %url, "Fetching all users");

        let request = handle
            .http()
            .get(&url)
            .query(&[("select", RecordMapper::select_columns())]);

        let users = fetch_rows(request).await?;
        debug!(rows = users.len(), "Fetched users");
        Ok(users)
    }

    /// Fetch one row by ID; [`GatewayError::NotFound`] when nothing matches.
    pub async fn try_get_by_id(&self, id: UserId) -> Result<User> {
        let (handle, url) = self.endpoint().await?;
        debug!(url = %url, id, "Fetching user");

        let request = handle.http().get(&url).query(&[
            ("select", RecordMapper::select_columns()),
            ("id", eq(id)),
        ]);

        fetch_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or(GatewayError::NotFound { id })
    }

    /// Insert a user and return the row echoed by the backend.
    ///
    /// `created_at` is overwritten with the current UTC time (microsecond
    /// precision, as stored) before sending. `id` is never sent.
    pub async fn try_create(&self, mut user: User) -> Result<User> {
        user.created_at = Utc::now().trunc_subsecs(6);

        let (handle, url) = self.endpoint().await?;
        debug!(url = %url, user = ?user, "Creating user");

        let request = handle
            .http()
            .post(&url)
            .header(PREFER, RETURN_REPRESENTATION)
            .query(&[("select", RecordMapper::select_columns())])
            .json(&RecordMapper::to_insert_row(&user));

        let created = fetch_rows(request).await?.into_iter().next().ok_or_else(|| {
            GatewayError::Unexpected("Insert returned no rows".to_string())
        })?;

        info!(id = created.id, login = %created.login, "User created");
        Ok(created)
    }

    /// Replace every mutable column of the row matching `user.id`.
    ///
    /// All four mutable fields are written from `user`. `id` and `created_at`
    /// are never part of the payload, so the stored creation time survives.
    pub async fn try_update(&self, user: User) -> Result<User> {
        let id = user.id;
        let (handle, url) = self.endpoint().await?;
        debug!(url = %url, id, "Updating user");

        let request = handle
            .http()
            .patch(&url)
            .header(PREFER, RETURN_REPRESENTATION)
            .query(&[
                ("id", eq(id)),
                ("select", RecordMapper::select_columns()),
            ])
            .json(&RecordMapper::to_update_row(&user));

        let updated = fetch_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or(GatewayError::NotFound { id })?;

        debug!(id, "User updated");
        Ok(updated)
    }

    /// Change one field: read the row, modify the copy, write it back whole.
    ///
    /// Two independent round trips. A concurrent write to the same row between
    /// them is lost; the last full write wins for every column.
    pub async fn try_partial_update(&self, id: UserId, change: FieldChange) -> Result<User> {
        let field = change.field();
        let mut user = self.try_get_by_id(id).await?;

        debug!(id, column = RecordMapper::column_for(field), "Applying field change");
        user.apply(change);

        self.try_update(user).await
    }

    /// Delete a row and confirm it is gone with a follow-up lookup.
    ///
    /// The delete response is only checked for an error status; whether the
    /// row existed is decided by the confirming lookup alone.
    pub async fn try_delete(&self, id: UserId) -> Result<()> {
        let (handle, url) = self.endpoint().await?;
        debug!(url = %url, id, "Deleting user");

        let response = handle
            .http()
            .delete(&url)
            .query(&[("id", eq(id))])
            .send()
            .await
            .map_err(GatewayError::from_send)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Remote {
                status: status.as_u16(),
                message: error_text,
            });
        }

        match self.try_get_by_id(id).await {
            Err(GatewayError::NotFound { .. }) => {
                info!(id, "User deleted");
                Ok(())
            }
            Ok(_) => Err(GatewayError::Unexpected(format!(
                "User {} still present after delete",
                id
            ))),
            Err(e) => Err(e),
        }
    }

    /// Fetch at most one row; returns how many came back (0 or 1).
    pub async fn try_test_connection(&self) -> Result<usize> {
        let (handle, url) = self.endpoint().await?;
        debug!(url = %url, "Testing backend table access");

        let request = handle.http().get(&url).query(&[
            ("select", RecordMapper::select_columns()),
            ("limit", "1".to_string()),
        ]);

        let rows = fetch_rows(request).await?.len();
        debug!(rows, "Table access test complete");
        Ok(rows)
    }

    /// Synchronous form of [`UserStore::test_connection`].
    ///
    /// Blocks the calling thread until the probe completes. Inside a
    /// multi-threaded Tokio runtime the worker is handed off with
    /// `block_in_place`. A current-thread runtime cannot be re-entered, and it
    /// drives the shared client's connections, so the probe runs on a scoped
    /// thread with its own runtime and a fresh client. Outside any runtime the
    /// probe runs on a temporary one in place.
    pub fn test_connection_blocking(&self) -> bool {
        use tokio::runtime::{Handle, RuntimeFlavor};

        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.test_connection()))
            }
            Ok(_) => std::thread::scope(|scope| {
                scope
                    .spawn(|| self.test_connection_detached())
                    .join()
                    .unwrap_or(false)
            }),
            Err(_) => self.test_connection_detached(),
        }
    }

    fn test_connection_detached(&self) -> bool {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "Failed to start runtime for connection test");
                return false;
            }
        };

        let probe = PersistenceGateway::new(Arc::new(self.connection.detached()));
        runtime.block_on(probe.test_connection())
    }
}

#[async_trait]
impl UserStore for PersistenceGateway {
    async fn list_all(&self) -> Vec<User> {
        settle("list_all", self.try_list_all().await).unwrap_or_default()
    }

    async fn get_by_id(&self, id: UserId) -> Option<User> {
        settle("get_by_id", self.try_get_by_id(id).await)
    }

    async fn create(&self, user: User) -> Option<User> {
        settle("create", self.try_create(user).await)
    }

    async fn update(&self, user: User) -> Option<User> {
        settle("update", self.try_update(user).await)
    }

    async fn partial_update(&self, id: UserId, change: FieldChange) -> Option<User> {
        settle("partial_update", self.try_partial_update(id, change).await)
    }

    async fn delete(&self, id: UserId) -> bool {
        settle("delete", self.try_delete(id).await).is_some()
    }

    async fn test_connection(&self) -> bool {
        settle("test_connection", self.try_test_connection().await).is_some()
    }
}

/// Collapse a result into its sentinel, logging the failure.
fn settle<T>(operation: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            let kind = err.kind();
            if kind == ErrorKind::NotFound {
                debug!(operation, kind = %kind, error = %err, "No matching user");
            } else {
                warn!(operation, kind = %kind, error = %err, "User operation failed");
            }
            None
        }
    }
}

fn eq(id: UserId) -> String {
    format!("eq.{}", id)
}

async fn fetch_rows(request: RequestBuilder) -> Result<Vec<User>> {
    let response = request.send().await.map_err(GatewayError::from_send)?;
    read_rows(response).await
}

async fn read_rows(response: Response) -> Result<Vec<User>> {
    let status = response.status();

    if status.is_success() {
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Protocol(format!("Failed to parse rows: {}", e)))?;

        Ok(RecordMapper::from_rows(&body)?)
    } else {
        let error_text = response.text().await.unwrap_or_default();
        Err(GatewayError::Remote {
            status: status.as_u16(),
            message: error_text,
        })
    }
}
