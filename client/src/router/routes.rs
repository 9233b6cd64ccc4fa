use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Route table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/home`, the alias list.
    Home,
    /// `/create`, needs `create-aliases`.
    Create,
    /// `/edit/{name}`, needs `edit-aliases`.
    Edit { name: String },
    /// `/authorize`, where the identity provider sends the user back.
    Authorize,
    /// `/signed-out`, only reachable while signed out.
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
    pub title: &'static str,
    pub requires_auth: bool,
}

impl Route {
    pub fn meta(&self) -> RouteMeta {
        match self {
            Route::Home => RouteMeta {
                title: "Alias List",
                requires_auth: true,
            },
            Route::Create => RouteMeta {
                title: "New Alias",
                requires_auth: true,
            },
            Route::Edit { .. } => RouteMeta {
                title: "Edit Alias",
                requires_auth: true,
            },
            Route::Authorize => RouteMeta {
                title: "You are being authorized",
                requires_auth: false,
            },
            Route::SignedOut => RouteMeta {
                title: "Signed Out",
                requires_auth: false,
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/home".to_string(),
            Route::Create => "/create".to_string(),
            Route::Edit { name } => format!("/edit/{}", urlencoding::encode(name)),
            Route::Authorize => "/authorize".to_string(),
            Route::SignedOut => "/signed-out".to_string(),
        }
    }

    /// Match a path. `None` means no route matched and the catch-all
    /// applies.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.trim_end_matches('/');
        let mut segments = path.trim_start_matches('/').split('/');

        let route = match (segments.next(), segments.next()) {
            (Some("home"), None) => Route::Home,
            (Some("create"), None) => Route::Create,
            (Some("authorize"), None) => Route::Authorize,
            (Some("signed-out"), None) => Route::SignedOut,
            (Some("edit"), Some(name)) if !name.is_empty() => Route::Edit {
                name: urlencoding::decode(name).ok()?.into_owned(),
            },
            _ => return None,
        };

        if segments.next().is_some() {
            return None;
        }

        Some(route)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A navigation target: a matched route plus its query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub route: Route,
    pub query: BTreeMap<String, String>,
}

impl Location {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            query: BTreeMap::new(),
        }
    }

    /// Parse `"/path?query"` or a full `http://host/path?query` URL.
    ///
    /// Returns `None` when the path matches no route.
    pub fn parse(location: &str) -> Option<Location> {
        let location = location.trim();

        // Drop scheme and authority if a full URL was given.
        let location = match location.find("://") {
            Some(scheme_end) => {
                let rest = &location[scheme_end + 3..];
                rest.find('/').map_or("/", |slash| &rest[slash..])
            }
            None => location,
        };

        let location = location.split('#').next().unwrap_or_default();
        let (path, query) = location.split_once('?').unwrap_or((location, ""));

        let route = Route::from_path(path)?;
        let query = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        Some(Location { route, query })
    }

    /// The SSO token handed back by the identity provider, if any.
    pub fn sso_token(&self) -> Option<&str> {
        self.query
            .get("token")
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.route)?;
        if !self.query.is_empty() {
            // Never echo the token itself.
            let keys: Vec<&str> = self.query.keys().map(String::as_str).collect();
            write!(f, "?[{}]", keys.join(","))?;
        }
        Ok(())
    }
}
