use std::sync::Arc;

use tracing::{info, warn};

use shared::config::LiveConfig;
use shared::types::{AppConfig, ConfigError};

use crate::http::{Backend, HttpBackend};
use crate::router::{NavigationOutcome, Route, Router};
use crate::state::{AliasStore, LoadingRegistry, NotificationQueue, UserSession};
use crate::storage::{FileTokenStore, TokenStore};

/// Every client service, wired together once and shared by reference.
#[derive(Debug)]
pub struct App<B> {
    pub config: LiveConfig,
    pub backend: Arc<B>,
    pub tokens: Arc<dyn TokenStore>,
    pub session: UserSession,
    pub loading: LoadingRegistry,
    pub notifications: NotificationQueue,
    pub aliases: AliasStore<B>,
    pub router: Router,
}

impl App<HttpBackend> {
    /// Build the real client: file-backed token store and HTTP backend.
    pub fn from_config(config: AppConfig) -> Self {
        let tokens: Arc<dyn TokenStore> =
            Arc::new(FileTokenStore::new(config.auth.token_file.clone()));
        let backend = HttpBackend::new(
            &config.api.resolved_base_url(),
            config.api.request_timeout(),
            tokens.clone(),
        );

        info!("Using backend at {}", backend.base_url());
        Self::new(config, Arc::new(backend), tokens)
    }
}

impl<B: Backend> App<B> {
    pub fn new(config: AppConfig, backend: Arc<B>, tokens: Arc<dyn TokenStore>) -> Self {
        let loading = LoadingRegistry::new();
        let notifications = NotificationQueue::new(config.notifications.max_queue);
        let aliases = AliasStore::new(
            backend.clone(),
            loading.clone(),
            notifications.clone(),
            config.cache.freshness(),
        );

        Self {
            config: LiveConfig::new(config),
            backend,
            tokens,
            session: UserSession::new(),
            loading,
            notifications,
            aliases,
            router: Router::new(),
        }
    }

    /// Run one navigation through the guard pipeline.
    pub async fn navigate(&self, location: &str) -> NavigationOutcome {
        self.router.navigate(self, location).await
    }

    /// Navigate and follow internal redirects.
    pub async fn resolve(&self, location: &str) -> NavigationOutcome {
        self.router.resolve(self, location).await
    }

    /// Navigate to `route` and stay there. Any outcome other than landing
    /// on `route` itself is handed back, including a redirect that was
    /// followed to some other page.
    pub async fn enter(&self, route: &Route) -> Result<(), NavigationOutcome> {
        match self.resolve(&route.path()).await {
            NavigationOutcome::Proceed(at) if at == *route => Ok(()),
            other => {
                info!("Could not enter {}: {}", route, other);
                Err(other)
            }
        }
    }

    /// Tell the backend, then forget the token and the session. The logout
    /// call is best effort.
    pub async fn sign_out(&self) {
        if let Err(e) = self.backend.logout().await {
            warn!("Logout request failed: {}", e);
        }

        if let Err(e) = self.tokens.clear() {
            warn!("Could not clear stored token: {}", e);
        }
        self.session.reset();

        info!("Signed out");
    }

    /// Re-read the config file. Auth settings take effect on the next
    /// navigation; cache and queue sizes are fixed at construction.
    pub async fn reload_config(&self, path: &str) -> Result<(), ConfigError> {
        self.config.reload_from(path).await
    }

    /// Drop notifications older than the configured lifetime.
    pub async fn expire_notifications(&self) -> usize {
        let ttl = self.config.read().await.notifications.ttl();
        self.notifications.expire(ttl)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::http::mock::{MockBackend, Op};
    use crate::state::session::tests::token_for;
    use crate::storage::MemoryTokenStore;

    fn signed_in() -> App<MockBackend> {
        let token = token_for("alice", &["create-aliases"]);
        App::new(
            AppConfig::default(),
            Arc::new(MockBackend::new()),
            Arc::new(MemoryTokenStore::with_token(&token)),
        )
    }

    #[tokio::test]
    async fn test_sign_out_clears_everything() {
        let app = signed_in();
        app.navigate("/home").await;
        assert!(app.session.is_signed_in());

        app.sign_out().await;

        assert_eq!(app.backend.count(Op::Logout), 1);
        assert_eq!(app.tokens.get().unwrap(), None);
        assert!(!app.session.is_signed_in());
        assert_eq!(
            app.navigate("/signed-out").await,
            NavigationOutcome::Proceed(Route::SignedOut)
        );
    }

    fn signed_in_as(groups: &[&str]) -> App<MockBackend> {
        App::new(
            AppConfig::default(),
            Arc::new(MockBackend::new()),
            Arc::new(MemoryTokenStore::with_token(&token_for("bob", groups))),
        )
    }

    #[tokio::test]
    async fn test_enter_refuses_create_without_permission() {
        let app = signed_in_as(&[]);

        assert_eq!(
            app.enter(&Route::Create).await,
            Err(NavigationOutcome::Proceed(Route::Home))
        );
    }

    #[tokio::test]
    async fn test_enter_refuses_edit_without_permission() {
        let app = signed_in_as(&["create-aliases"]);
        let route = Route::Edit {
            name: "x".to_string(),
        };

        assert!(app.enter(&route).await.is_err());
        assert_eq!(app.aliases.active(), None);
    }

    #[tokio::test]
    async fn test_enter_allows_permitted_routes() {
        let app = signed_in_as(&["create-aliases", "edit-aliases"]);
        let route = Route::Edit {
            name: "x".to_string(),
        };

        assert_eq!(app.enter(&Route::Create).await, Ok(()));
        assert_eq!(app.enter(&route).await, Ok(()));
        assert_eq!(app.router.current(), Some(route));
    }

    #[tokio::test]
    async fn test_sign_out_survives_backend_failure() {
        let app = signed_in();
        app.backend.fail(Op::Logout, 500, "down");

        app.sign_out().await;

        assert_eq!(app.tokens.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_stores_share_registries() {
        let app = signed_in();
        app.backend.fail(Op::Delete, 404, "Alias not found");

        let _ = app.aliases.remove("ghost").await;

        assert_eq!(app.notifications.len(), 1);
        assert!(!app.loading.is_busy());
    }

    #[tokio::test]
    async fn test_reloaded_auth_applies_to_next_navigation() {
        let backend = MockBackend::new();
        backend.set_login_location("http://idp.remote/login");
        let app = App::new(
            AppConfig::default(),
            Arc::new(backend),
            Arc::new(MemoryTokenStore::new()),
        );

        assert_eq!(
            app.navigate("/home").await,
            NavigationOutcome::External("http://idp.remote/login".to_string())
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(
            &path,
            r#"
            [api]
            base_url = "http://127.0.0.1:3000"

            [auth]
            token_file = "token.toml"
            local_dev = true
            idp_login_url = "http://localhost:9000/login"
            "#,
        )
        .unwrap();

        app.reload_config(path.to_str().unwrap()).await.unwrap();

        assert_eq!(
            app.navigate("/home").await,
            NavigationOutcome::External("http://localhost:9000/login".to_string())
        );
        assert_eq!(app.backend.count(Op::Login), 1);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_auth() {
        let app = signed_in();

        assert!(app.reload_config("/no/such/client.toml").await.is_err());
        assert_eq!(app.config.auth().await.redirect_uri, "/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_notifications_uses_config_ttl() {
        let app = signed_in();
        app.notifications.success("one");

        tokio::time::advance(Duration::from_secs(6)).await;
        app.notifications.success("two");

        assert_eq!(app.expire_notifications().await, 1);
        assert_eq!(app.notifications.len(), 1);
    }
}
