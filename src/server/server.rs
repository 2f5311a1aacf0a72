//! HTTP server wiring

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, ServerConfig};
use crate::models::Member;
use crate::scheduler::Scheduler;
use crate::session::{Session, SessionError, SessionStore};
use crate::store::{open_store, SharedDocumentStore, Stored};
use crate::team::Team;

use super::api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Attendance and roster facade
    pub scheduler: Arc<Scheduler>,

    /// Directory, boards and set-lists
    pub team: Arc<Team>,

    /// Backing document store
    pub store: SharedDocumentStore,

    /// Server start time
    pub start_time: Instant,

    /// Configuration
    pub config: ServerConfig,

    /// Signed-in profile used for attribution and delete checks
    session: Arc<RwLock<Session>>,

    /// Session file; `None` keeps the session in memory only
    sessions: Option<SessionStore>,
}

impl AppState {
    /// Build every service over one store, starting anonymous
    pub fn new(store: SharedDocumentStore, config: ServerConfig, list_limit: usize) -> Self {
        Self {
            scheduler: Arc::new(Scheduler::with_member_limit(store.clone(), list_limit)),
            team: Arc::new(Team::new(store.clone(), list_limit)),
            store,
            start_time: Instant::now(),
            config,
            session: Arc::new(RwLock::new(Session::anonymous())),
            sessions: None,
        }
    }

    /// Restore the cached session and persist later sign-ins to `sessions`
    ///
    /// A corrupt session file is logged and replaced by the anonymous one.
    pub fn with_session_store(mut self, sessions: SessionStore) -> Self {
        let session = match sessions.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    path = %sessions.path().display(),
                    error = %e,
                    "Ignoring unreadable session file"
                );
                Session::anonymous()
            }
        };
        self.session = Arc::new(RwLock::new(session));
        self.sessions = Some(sessions);
        self
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Make `member` the current user and cache the session
    pub async fn sign_in(
        &self,
        member: &Stored<Member>,
        today: NaiveDate,
    ) -> Result<Session, SessionError> {
        let session = Session::sign_in(member, today);
        if let Some(sessions) = &self.sessions {
            sessions.save(&session)?;
        }
        *self.session.write().await = session.clone();
        tracing::info!(user = %member.id, leader = session.can_delete(), "Signed in");
        Ok(session)
    }

    /// Back to the anonymous profile
    pub async fn sign_out(&self) -> Result<Session, SessionError> {
        if let Some(sessions) = &self.sessions {
            sessions.clear()?;
        }
        let session = Session::anonymous();
        *self.session.write().await = session.clone();
        tracing::info!("Signed out");
        Ok(session)
    }
}

// ============================================================================
// Hiel Server
// ============================================================================

pub struct HielServer {
    config: ServerConfig,
    state: AppState,
}

impl HielServer {
    /// Open the configured store and build the server
    pub fn new(config: &Config) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        let store = open_store(&config.database).map_err(|e| ServerError::InitError(e.to_string()))?;

        Ok(Self::with_store(
            store,
            config.server.clone(),
            config.team.list_limit,
        )
        .with_session_store(SessionStore::new(&config.session.path)))
    }

    /// Build the server over an existing store
    pub fn with_store(store: SharedDocumentStore, config: ServerConfig, list_limit: usize) -> Self {
        let state = AppState::new(store, config.clone(), list_limit);
        Self { config, state }
    }

    /// Load and persist the session through `sessions`
    pub fn with_session_store(mut self, sessions: SessionStore) -> Self {
        self.state = self.state.with_session_store(sessions);
        self
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!(
            addr = %addr,
            backend = self.state.store.backend_name(),
            "Starting hiel server"
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        Ok(())
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!(addr = %addr, "Starting hiel server (with graceful shutdown)");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("hiel server shutdown complete");
        Ok(())
    }

    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            backend: self.state.store.backend_name().to_string(),
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub backend: String,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Hiel Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Store Backend: {}\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.backend,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

#[derive(Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    ConfigError(String),

    /// Store could not be opened
    InitError(String),

    /// Failed to bind to address
    BindError(String),

    /// Server error
    ServeError(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::InitError(msg) => write!(f, "Initialization error: {}", msg),
            Self::BindError(msg) => write!(f, "Failed to bind: {}", msg),
            Self::ServeError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseBackend;
    use crate::store::create_memory_store;

    #[test]
    fn test_server_from_memory_config() {
        let mut config = Config::default();
        config.database.backend = DatabaseBackend::Memory;

        let server = HielServer::new(&config).unwrap();
        let info = server.info();
        assert_eq!(info.backend, "memory");
        assert!(info.cors_enabled);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.database.backend = DatabaseBackend::Memory;
        config.team.list_limit = 0;

        assert!(matches!(
            HielServer::new(&config),
            Err(ServerError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_scheduler_uses_list_limit() {
        let state = AppState::new(create_memory_store(), ServerConfig::default(), 7);
        assert_eq!(state.scheduler.roster().member_limit(), 7);
    }

    #[tokio::test]
    async fn test_session_restored_and_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionStore::new(dir.path().join("session.json"));
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let leader = Stored {
            id: "m1".to_string(),
            version: 1,
            created_date: None,
            updated_date: None,
            value: Member::new("Kim").with_role(2025, "팀장"),
        };

        let state = AppState::new(create_memory_store(), ServerConfig::default(), 10)
            .with_session_store(sessions.clone());
        assert!(state.session().await.is_anonymous());
        state.sign_in(&leader, today).await.unwrap();

        let restarted = AppState::new(create_memory_store(), ServerConfig::default(), 10)
            .with_session_store(sessions.clone());
        assert!(restarted.session().await.can_delete());

        restarted.sign_out().await.unwrap();
        assert!(sessions.load().unwrap().is_anonymous());
    }

    #[test]
    fn test_corrupt_session_file_starts_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{").unwrap();

        let state = AppState::new(create_memory_store(), ServerConfig::default(), 10)
            .with_session_store(SessionStore::new(path));
        assert!(state.session.try_read().unwrap().is_anonymous());
    }

    #[test]
    fn test_info_display() {
        let config = ServerConfig {
            enable_cors: false,
            ..Default::default()
        };
        let server = HielServer::with_store(create_memory_store(), config, 50);
        let text = server.info().display();

        assert!(text.contains("127.0.0.1:8080"));
        assert!(text.contains("CORS: disabled"));
    }
}
