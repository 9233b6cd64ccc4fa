use tracing::{debug, info, warn};

use crate::app::App;
use crate::http::Backend;
use crate::router::routes::{Location, Route};
use crate::state::LoadTag;

pub const CREATE_ALIASES: &str = "create-aliases";
pub const EDIT_ALIASES: &str = "edit-aliases";

/// Where a transition stands with respect to authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// The destination does not need a token.
    Public,
    /// A token is stored.
    Authenticated,
    /// No token and none on its way back.
    Unauthenticated,
    /// No stored token, but the identity provider handed one back.
    AwaitingCallback { token: String },
}

impl GuardState {
    pub fn classify(to: &Location, has_token: bool) -> Self {
        let guarded = to.route.meta().requires_auth || to.route == Route::Authorize;

        if !guarded {
            return GuardState::Public;
        }
        if has_token {
            return GuardState::Authenticated;
        }

        match to.sso_token() {
            Some(token) => GuardState::AwaitingCallback {
                token: token.to_string(),
            },
            None => GuardState::Unauthenticated,
        }
    }
}

/// What a guard decided about one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Next,
    Redirect(Route),
    External(String),
}

// ---------------------------------------------------------------------------
// Global guard
// ---------------------------------------------------------------------------

/// Runs before every transition. Hydrates the session from a stored token,
/// then walks the authentication state machine.
pub async fn before_each<B: Backend>(app: &App<B>, to: &Location) -> Guard {
    let has_token = hydrate_session(app);
    let state = GuardState::classify(to, has_token);
    debug!("Guard for {}: {:?}", to.route, DebugState(&state));

    match state {
        GuardState::Public | GuardState::Authenticated => Guard::Next,
        GuardState::Unauthenticated => send_to_login(app).await,
        GuardState::AwaitingCallback { token } => {
            let redirect_uri = match to.query_param("redirect_uri") {
                Some(uri) if !uri.is_empty() => uri.to_string(),
                _ => app.config.auth().await.redirect_uri,
            };
            complete_callback(app, &token, &redirect_uri).await
        }
    }
}

/// Loads the stored token into the session if it is not there yet.
/// Returns whether a usable token is stored.
fn hydrate_session<B: Backend>(app: &App<B>) -> bool {
    let token = match app.tokens.get() {
        Ok(token) => token,
        Err(e) => {
            warn!("Could not read stored token: {}", e);
            None
        }
    };

    let Some(token) = token else {
        if app.session.is_populated() {
            info!("Stored token is gone, ending session");
            app.session.reset();
        }
        return false;
    };

    if app.session.is_populated() {
        return true;
    }

    match app.session.setup_from_token(&token) {
        Ok(()) => true,
        Err(e) => {
            warn!("Stored token is unreadable, discarding it: {}", e);
            if let Err(e) = app.tokens.clear() {
                warn!("Could not clear stored token: {}", e);
            }
            app.session.reset();
            false
        }
    }
}

async fn send_to_login<B: Backend>(app: &App<B>) -> Guard {
    if let Err(e) = app.tokens.clear() {
        warn!("Could not clear stored token: {}", e);
    }
    app.session.reset();

    let auth = app.config.auth().await;
    if auth.local_dev {
        if let Some(url) = auth.idp_login_url {
            info!("Not signed in, sending to local identity provider");
            return Guard::External(url);
        }
    }

    let loading = app.loading.guard(LoadTag::App);
    let answer = app.backend.login_redirect().await;
    drop(loading);

    match answer {
        Ok(Some(url)) => {
            info!("Not signed in, sending to identity provider");
            Guard::External(url)
        }
        Ok(None) => {
            warn!("Login endpoint did not redirect");
            Guard::Redirect(Route::Home)
        }
        Err(e) => {
            warn!("Login endpoint failed: {}", e);
            Guard::Redirect(Route::Home)
        }
    }
}

async fn complete_callback<B: Backend>(app: &App<B>, token: &str, redirect_uri: &str) -> Guard {
    let _loading = app.loading.guard(LoadTag::App);

    if let Err(e) = app.session.setup_from_token(token) {
        warn!("Identity provider returned an unreadable token: {}", e);
        app.session.reset();
        return Guard::Redirect(Route::Home);
    }

    if let Err(e) = app.tokens.set(token) {
        warn!("Could not persist token: {}", e);
    }

    match app.backend.authorize(redirect_uri, token).await {
        Ok(()) => info!("Signed in as {}", app.session.snapshot().username),
        Err(e) => warn!("Authorize callback failed: {}", e),
    }

    Guard::Redirect(Route::Home)
}

/// Prints the state without the token.
struct DebugState<'a>(&'a GuardState);

impl std::fmt::Debug for DebugState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            GuardState::Public => f.write_str("Public"),
            GuardState::Authenticated => f.write_str("Authenticated"),
            GuardState::Unauthenticated => f.write_str("Unauthenticated"),
            GuardState::AwaitingCallback { .. } => f.write_str("AwaitingCallback"),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-route guards
// ---------------------------------------------------------------------------

pub fn before_enter<B: Backend>(app: &App<B>, to: &Location) -> Guard {
    let allowed = match &to.route {
        Route::Create => app.session.can(CREATE_ALIASES),
        Route::Edit { .. } => app.session.can(EDIT_ALIASES),
        Route::SignedOut => !app.session.is_signed_in(),
        Route::Home | Route::Authorize => true,
    };

    if allowed {
        Guard::Next
    } else {
        info!("Refused {}, sending home", to.route);
        Guard::Redirect(Route::Home)
    }
}
