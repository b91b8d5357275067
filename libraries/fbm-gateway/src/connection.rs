//! Connection lifecycle for the remote backend.

use crate::error::{GatewayError, Result};
use crate::settings::BackendSettings;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Path of the PostgREST API below the project URL.
pub const REST_PATH: &str = "/rest/v1";

/// Ready-to-use, authenticated access to the backend.
///
/// Cloning is cheap; the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct RemoteHandle {
    http: Client,
    rest_url: String,
}

impl RemoteHandle {
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Base URL of the REST API, without trailing slash.
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    /// URL of a table endpoint.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }
}

/// Owns the single shared handle to the backend.
///
/// Settings are checked when the manager is created. The handshake (building
/// the authenticated client and probing the user table) is deferred until the
/// first call to [`handle`](Self::handle) or [`connect`](Self::connect) and
/// runs at most once, however many tasks ask for the handle concurrently.
/// A failed handshake leaves the manager unconnected; the next caller tries
/// again.
///
/// # Example
///
/// ```ignore
/// use fbm_gateway::{BackendSettings, ConnectionManager};
///
/// let settings = BackendSettings::new("https://project.supabase.co", "anon-key");
/// let manager = ConnectionManager::initialize(&settings)?;
/// let handle = manager.handle().await?;
/// println!("REST API at {}", handle.rest_url());
/// ```
pub struct ConnectionManager {
    base_url: String,
    table: String,
    headers: HeaderMap,
    handle: OnceCell<RemoteHandle>,
}

impl ConnectionManager {
    /// Validate settings and prepare for the handshake.
    ///
    /// Fails with [`GatewayError::Config`] if the URL or key is missing,
    /// empty, or unusable. Performs no network I/O.
    pub fn initialize(settings: &BackendSettings) -> Result<Self> {
        settings.validate()?;

        let base_url = settings.api_url.trim().trim_end_matches('/').to_string();
        let key = settings.api_key.trim();

        let mut apikey = HeaderValue::from_str(key)
            .map_err(|_| GatewayError::Config("Access key is not a valid header value".into()))?;
        apikey.set_sensitive(true);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|_| GatewayError::Config("Access key is not a valid header value".into()))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);

        debug!(url = %base_url, table = %settings.table, "Backend settings resolved");

        Ok(Self {
            base_url,
            table: settings.table.trim().to_string(),
            headers,
            handle: OnceCell::new(),
        })
    }

    /// Project URL, normalized without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Table holding user rows.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether the handshake has completed.
    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }

    /// Get the handle, performing the handshake on first use.
    pub async fn handle(&self) -> Result<&RemoteHandle> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }

        debug!("Backend handle not initialized, connecting now");
        self.handle.get_or_try_init(|| self.handshake()).await
    }

    /// Perform the handshake eagerly.
    ///
    /// Intended for startup, where a failure should stop the process.
    pub async fn connect(&self) -> Result<()> {
        self.handle().await.map(|_| ())
    }

    /// An unconnected copy with the same settings.
    ///
    /// Its client is built on whatever runtime first uses it, which lets a
    /// caller probe from a runtime other than the one driving this manager.
    pub(crate) fn detached(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            table: self.table.clone(),
            headers: self.headers.clone(),
            handle: OnceCell::new(),
        }
    }

    async fn handshake(&self) -> Result<RemoteHandle> {
        info!(url = %self.base_url, "Connecting to backend");

        let http = Client::builder()
            .default_headers(self.headers.clone())
            .user_agent(format!("fbm-gateway/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GatewayError::Request)?;

        let rest_url = format!("{}{}", self.base_url, REST_PATH);
        let probe_url = format!("{}/{}", rest_url, self.table);

        // Same rights as the table operations; no rows come back from HEAD
        let response = http
            .head(&probe_url)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                warn!(url = %probe_url, error = %e, "Backend handshake failed");
                GatewayError::from_send(e)
            })?;

        let status = response.status();

        if status.is_success() {
            info!(url = %self.base_url, "Backend connection initialized");
            Ok(RemoteHandle { http, rest_url })
        } else {
            warn!(status = %status, url = %probe_url, "Backend rejected handshake");
            Err(GatewayError::Remote {
                status: status.as_u16(),
                message: format!("Handshake against table {} refused", self.table),
            })
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .field("connected", &self.is_connected())
            .finish()
    }
}
