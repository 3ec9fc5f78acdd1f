//! Common test utilities for integration tests.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use warden_server::{Server, ServerConfig, SharedStore};
use warden_session::{
    RegistryConfig, Session, SessionRegistry, SessionStore, StoreError, StoreResult,
};
use warden_store::SqliteStore;

/// Admin token configured on every test server.
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// SQLite store that can be switched off, wholesale or per user.
pub struct FaultyStore {
    inner: SqliteStore,
    down: AtomicBool,
    failing_deletes: parking_lot::Mutex<HashSet<String>>,
}

impl FaultyStore {
    fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            down: AtomicBool::new(false),
            failing_deletes: parking_lot::Mutex::new(HashSet::new()),
        }
    }

    /// Make every store call fail.
    pub fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    /// Make deletes for `username` fail.
    pub fn fail_delete(&self, username: &str) {
        self.failing_deletes.lock().insert(username.to_string());
    }

    fn check(&self) -> StoreResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("database is locked".into()));
        }
        Ok(())
    }
}

impl SessionStore for FaultyStore {
    fn list_all(&self) -> StoreResult<Vec<Session>> {
        self.check()?;
        self.inner.list_all()
    }

    fn get(&self, username: &str) -> StoreResult<Option<Session>> {
        self.check()?;
        self.inner.get(username)
    }

    fn insert(&self, username: &str, token: &str) -> StoreResult<()> {
        self.check()?;
        self.inner.insert(username, token)
    }

    fn delete(&self, username: &str) -> StoreResult<bool> {
        self.check()?;
        if self.failing_deletes.lock().contains(username) {
            return Err(StoreError::Unavailable("disk I/O error".into()));
        }
        self.inner.delete(username)
    }

    fn session_count(&self) -> StoreResult<usize> {
        self.check()?;
        self.inner.session_count()
    }
}

/// A test server that runs in the background over an on-disk SQLite store.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Direct handle on the store, bypassing the registry's cache.
    pub store: Arc<FaultyStore>,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
    /// Temporary directory holding the database.
    pub temp_dir: TempDir,
}

impl TestServer {
    /// Start a new test server with the default cache size.
    pub async fn start() -> Result<Self> {
        Self::start_with_cache_size(RegistryConfig::default().cache_size).await
    }

    /// Start a new test server with a specific cache size.
    pub async fn start_with_cache_size(cache_size: usize) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let addr = find_available_port().await?;

        let sqlite = SqliteStore::open(temp_dir.path().join("sessions.db"))?;
        let store = Arc::new(FaultyStore::new(sqlite));
        let shared: SharedStore = store.clone();
        let registry = SessionRegistry::new(
            RegistryConfig::new().with_cache_size(cache_size),
            shared,
        );

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_admin_token(Some(ADMIN_TOKEN.to_string()))
            .with_request_logging(false);

        let server = Server::new(registry, config);
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            store,
            _handle: handle,
            temp_dir,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Unauthenticated POST with a JSON body.
    pub async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(&body)
            .send()
            .await?)
    }

    /// Admin-authenticated request builder.
    pub fn admin(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url(), path))
            .bearer_auth(ADMIN_TOKEN)
    }

    /// Log in and return the issued token.
    pub async fn login(&self, username: &str) -> Result<String> {
        let resp = self
            .post("/login", serde_json::json!({ "username": username }))
            .await?;
        anyhow::ensure!(resp.status().as_u16() == 201, "login failed: {}", resp.status());

        let body: serde_json::Value = resp.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("login response has no token"))
    }

    /// Whether the server accepts this pair.
    pub async fn is_valid(&self, username: &str, token: &str) -> Result<bool> {
        let resp = self
            .post(
                "/validate-token",
                serde_json::json!({ "username": username, "token": token }),
            )
            .await?;
        let status = resp.status().as_u16();
        let body: serde_json::Value = resp.json().await?;
        Ok(status == 200 && body["userExists"] == serde_json::json!(true))
    }
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let ready = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match ready {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
