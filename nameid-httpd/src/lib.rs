//! nameid HTTP server.
//!
//! A thin axum wrapper around the `nameid-core` transformation engine. The
//! request path is the rewrite-plan DSL, so the router is a single fallback
//! handler: the plan compiler, not the routing table, decides what a path
//! means.
//!
//! # Example
//!
//! ```ignore
//! use nameid_httpd::NameidServer;
//! use nameid_service::Options;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Options::parse().with_env().resolve().unwrap();
//!     let listen = config.listen;
//!     NameidServer::new(&config).run(listen).await.unwrap();
//! }
//! ```

pub mod ingress;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use nameid_core::LocalDeriver;
use nameid_service::{AliasClient, BatchSize, Config};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across requests. Populated once at startup and
/// read-only afterwards, except for the advisory batch size.
pub struct AppState {
    /// Local UUID-v5 deriver answering every rewrite.
    pub deriver: LocalDeriver,
    /// Alias backend client, present when fully configured. Batch dispatch
    /// is not yet driven by the ingress path.
    pub alias: Option<AliasClient>,
    /// Advisory alias batch size, grown by oversized requests.
    pub batch_size: BatchSize,
}

/// The nameid HTTP server.
pub struct NameidServer {
    state: Arc<AppState>,
    router: Router,
}

impl NameidServer {
    /// Assemble state and router from a resolved configuration.
    pub fn new(config: &Config) -> Self {
        let alias = config.alias.as_ref().and_then(|alias_config| {
            match AliasClient::new(alias_config.clone()) {
                Ok(client) => {
                    info!(
                        service_url = %client.service_url(),
                        "alias backend configured; batch dispatch not yet active, rewrites stay local"
                    );
                    Some(client)
                }
                Err(err) => {
                    warn!(%err, "failed to set up alias backend client; rewrites stay local");
                    None
                }
            }
        });

        let state = Arc::new(AppState {
            deriver: LocalDeriver::new(config.seed),
            alias,
            batch_size: BatchSize::new(config.batch_size),
        });
        let router = build_router(state.clone());
        Self { state, router }
    }

    /// Shared application state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// A clone of the router, for driving the server in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind and serve until the listener fails.
    pub async fn run(self, listen: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(listen).await?;
        info!(address = %listen, "server listening");
        axum::serve(listener, self.router).await
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(ingress::ingress)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
