mod guards;
mod routes;

pub use guards::{CREATE_ALIASES, EDIT_ALIASES, Guard, GuardState, before_each, before_enter};
pub use routes::{Location, Route, RouteMeta};

use std::fmt;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::app::App;
use crate::http::Backend;

/// Internal redirects followed by [`Router::resolve`] before giving up.
pub const MAX_REDIRECTS: usize = 4;

/// How a navigation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The transition happened; the route is now current.
    Proceed(Route),
    /// The guards sent the user somewhere else inside the app.
    Redirect(Route),
    /// The user must leave the app for this URL (the identity provider).
    External(String),
}

impl fmt::Display for NavigationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationOutcome::Proceed(route) => {
                write!(f, "{} ({})", route, route.meta().title)
            }
            NavigationOutcome::Redirect(route) => write!(f, "redirect to {}", route),
            NavigationOutcome::External(url) => write!(f, "leave for {}", url),
        }
    }
}

/// Tracks the current route and runs the guard pipeline on each transition.
#[derive(Debug, Default)]
pub struct Router {
    current: RwLock<Option<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// One transition: the global guard, then the route's own guard, then
    /// the after-each hook.
    pub async fn navigate<B: Backend>(&self, app: &App<B>, location: &str) -> NavigationOutcome {
        let Some(to) = Location::parse(location) else {
            debug!("No route for {:?}, redirecting home", location);
            return NavigationOutcome::Redirect(Route::Home);
        };

        self.transition(app, &to).await
    }

    /// Like [`Router::navigate`] but follows internal redirects until the
    /// pipeline settles, a route repeats, or [`MAX_REDIRECTS`] is hit.
    pub async fn resolve<B: Backend>(&self, app: &App<B>, location: &str) -> NavigationOutcome {
        let mut outcome = self.navigate(app, location).await;
        let mut visited = Vec::new();

        while let NavigationOutcome::Redirect(route) = &outcome {
            if visited.contains(route) {
                debug!("Redirect loop at {}, stopping", route);
                break;
            }
            if visited.len() >= MAX_REDIRECTS {
                warn!("Gave up after {} redirects", MAX_REDIRECTS);
                break;
            }

            visited.push(route.clone());
            let next = Location::new(route.clone());
            outcome = self.transition(app, &next).await;
        }

        outcome
    }

    async fn transition<B: Backend>(&self, app: &App<B>, to: &Location) -> NavigationOutcome {
        let guard = match before_each(app, to).await {
            Guard::Next => before_enter(app, to),
            other => other,
        };

        match guard {
            Guard::Next => {
                self.after_each(app, &to.route);
                NavigationOutcome::Proceed(to.route.clone())
            }
            Guard::Redirect(route) => NavigationOutcome::Redirect(route),
            Guard::External(url) => NavigationOutcome::External(url),
        }
    }

    fn after_each<B: Backend>(&self, app: &App<B>, route: &Route) {
        match route {
            Route::Edit { name } => app.aliases.set_active(Some(name)),
            _ => app.aliases.set_active(None),
        }

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(route.clone());
        info!("{}", route.meta().title);
    }
}
