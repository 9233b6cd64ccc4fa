use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use shared::types::TokenClaims;

use crate::error::ClientError;

/// Read-only copy of the session for views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub username: String,
    pub permissions: BTreeSet<String>,
    pub is_signed_in: bool,
}

/// Who is signed in and what they may do.
///
/// A projection of the stored token: populated by
/// [`UserSession::setup_from_token`], emptied by [`UserSession::reset`].
#[derive(Clone, Debug, Default)]
pub struct UserSession {
    inner: Arc<RwLock<SessionSnapshot>>,
}

impl UserSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `token` and overwrite the session with its claims.
    ///
    /// On failure the session is left exactly as it was.
    pub fn setup_from_token(&self, token: &str) -> Result<(), ClientError> {
        let claims = TokenClaims::decode_unverified(token)?;

        let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        session.username = claims.name;
        session.permissions = claims.groups.into_iter().collect();
        session.is_signed_in = true;

        info!(
            "Session set up for {} ({} permissions)",
            session.username,
            session.permissions.len()
        );
        Ok(())
    }

    /// True when the token has been projected into this session.
    pub fn is_populated(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_signed_in
    }

    pub fn is_signed_in(&self) -> bool {
        self.is_populated()
    }

    /// True iff `permission` is held.
    pub fn can(&self, permission: &str) -> bool {
        self.can_any([permission])
    }

    /// True iff at least one of `permissions` is held. An empty request is
    /// never granted.
    pub fn can_any<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let session = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        permissions
            .into_iter()
            .any(|p| session.permissions.contains(p.as_ref()))
    }

    pub fn reset(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = SessionSnapshot::default();
        debug!("Session reset");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
