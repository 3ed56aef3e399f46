//! HTTP server for permalink resolution and the admin API

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::lifecycle::LifecycleHandler;
use crate::permalink::PermalinkBuilder;
use crate::routing::RouteResolver;
use crate::sequence::SequenceAllocator;
use crate::storage::SharedContentRepository;

use super::api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Content repository
    pub repo: SharedContentRepository,

    /// Permalink builder
    pub permalinks: Arc<PermalinkBuilder>,

    /// Route resolver
    pub resolver: Arc<RouteResolver>,

    /// Save/delete handlers
    pub lifecycle: Arc<LifecycleHandler>,

    /// Server start time
    pub start_time: Instant,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every component over one repository
    pub fn new(config: Config, repo: SharedContentRepository) -> crate::error::Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| crate::error::Error::config(format!("{e:#}")))?;
        let permalinks = Arc::new(PermalinkBuilder::new(
            repo.clone(),
            &config.permalink,
            base_url,
        ));
        let allocator = Arc::new(SequenceAllocator::new(repo.clone(), &config.permalink));
        let resolver = Arc::new(RouteResolver::new(repo.clone(), permalinks.clone(), &config)?);
        let lifecycle = Arc::new(LifecycleHandler::new(
            repo.clone(),
            &config.permalink,
            allocator,
            permalinks.clone(),
        ));

        Ok(Self {
            repo,
            permalinks,
            resolver,
            lifecycle,
            start_time: Instant::now(),
            config: Arc::new(config),
        })
    }

    /// Path of the site base URL (`/` or `/blog/`)
    pub fn base_path(&self) -> &str {
        self.permalinks.base_url().path()
    }
}

// ============================================================================
// Permalink Server
// ============================================================================

/// Main HTTP server
pub struct PermalinkServer {
    state: AppState,
}

impl PermalinkServer {
    /// Create a new server
    pub fn new(config: Config, repo: SharedContentRepository) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(format!("{e:#}")))?;

        let state = AppState::new(config, repo).map_err(|e| ServerError::InitError(e.to_string()))?;
        Ok(Self { state })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());
        let server = &self.state.config.server;

        // Add CORS layer if enabled
        if server.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        // Add tracing layer if enabled
        if server.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.state.config.server.bind_address;

        tracing::info!(%addr, base_url = %self.state.permalinks.base_url(), "Starting permalink server");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Permalink server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        let config = &self.state.config;
        ServerInfo {
            bind_address: config.server.bind_address,
            base_url: self.state.permalinks.base_url().to_string(),
            target_types: config.permalink.target_types.clone(),
            gone_rules: self.state.resolver.rules().gone_len(),
            redirect_rules: self.state.resolver.rules().redirect_len(),
            cors_enabled: config.server.enable_cors,
            request_logging_enabled: config.server.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub base_url: String,
    pub target_types: Vec<String>,
    pub gone_rules: usize,
    pub redirect_rules: usize,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Permalink Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Base URL: {}\n\
             Target Types: {}\n\
             Gone Rules: {}\n\
             Redirect Rules: {}\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.base_url,
            self.target_types.join(", "),
            self.gone_rules,
            self.redirect_rules,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    ConfigError(String),

    /// Initialization error
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
