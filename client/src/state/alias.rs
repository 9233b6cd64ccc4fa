use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use shared::types::{Alias, AliasType, PostAlias, PutAlias};

use crate::error::ClientError;
use crate::http::Backend;
use crate::state::loading::{LoadTag, LoadingRegistry};
use crate::state::notifications::NotificationQueue;
use crate::util::search_in_str;

#[derive(Debug, Default)]
struct AliasState {
    list: Vec<Alias>,
    active: Option<String>,
    /// When the last non-cached fetch finished, successful or not.
    fetched_at: Option<Instant>,
}

/// Client-side copy of the alias collection.
///
/// Mutations go to the backend first and only touch the local list once the
/// backend accepts them. Every network operation holds its loading tag for
/// its whole duration and reports its outcome through the notification
/// queue. The lock is never held across a request, so concurrent calls
/// interleave and the last one to finish wins.
#[derive(Debug)]
pub struct AliasStore<B> {
    backend: Arc<B>,
    loading: LoadingRegistry,
    notifications: NotificationQueue,
    freshness: Duration,
    state: RwLock<AliasState>,
}

impl<B: Backend> AliasStore<B> {
    pub fn new(
        backend: Arc<B>,
        loading: LoadingRegistry,
        notifications: NotificationQueue,
        freshness: Duration,
    ) -> Self {
        Self {
            backend,
            loading,
            notifications,
            freshness,
            state: RwLock::new(AliasState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AliasState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AliasState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push `error` as a toast and hand it back.
    fn report(&self, error: ClientError) -> ClientError {
        self.notifications.error(error.to_string());
        error
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The list if the last fetch is still inside the freshness window.
    fn cached(&self) -> Option<Vec<Alias>> {
        let state = self.read();
        state
            .fetched_at
            .filter(|at| at.elapsed() < self.freshness)
            .map(|_| state.list.clone())
    }

    /// Return the alias list, hitting the backend at most once per
    /// freshness window.
    ///
    /// A failed read yields an empty list without a notification, and still
    /// counts as a fetch for the freshness window.
    pub async fn fetch(&self) -> Vec<Alias> {
        if let Some(list) = self.cached() {
            debug!("Alias cache hit ({} aliases)", list.len());
            return list;
        }

        let _loading = self.loading.guard(LoadTag::Fetch);
        let result = self.backend.list_aliases().await;

        let mut state = self.write();
        state.fetched_at = Some(Instant::now());

        match result {
            Ok(list) => {
                info!("Fetched {} aliases", list.len());
                state.list = list.clone();
                list
            }
            Err(e) => {
                warn!("Failed to fetch aliases: {}", e);
                Vec::new()
            }
        }
    }

    /// Forget the cache timestamp and fetch again.
    pub async fn refresh(&self) -> Vec<Alias> {
        self.write().fetched_at = None;
        self.fetch().await
    }

    pub fn list(&self) -> Vec<Alias> {
        self.read().list.clone()
    }

    pub fn len(&self) -> usize {
        self.read().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct alias types in order of first appearance.
    pub fn categories(&self) -> Vec<AliasType> {
        let state = self.read();
        let mut categories = Vec::new();
        for alias in &state.list {
            if !categories.contains(&alias.kind) {
                categories.push(alias.kind);
            }
        }
        categories
    }

    pub fn set_active(&self, name: Option<&str>) {
        self.write().active = name.map(str::to_string);
    }

    pub fn active(&self) -> Option<String> {
        self.read().active.clone()
    }

    pub fn active_alias(&self) -> Option<Alias> {
        let state = self.read();
        let active = state.active.as_deref()?;
        state.list.iter().find(|a| a.name == active).cloned()
    }

    /// Aliases whose name or content contain every word of `query`.
    pub fn search(&self, query: &str) -> Vec<Alias> {
        self.read()
            .list
            .iter()
            .filter(|a| search_in_str(&format!("{} {}", a.name, a.content), query))
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create an alias and append the stored version to the list.
    ///
    /// Any error has already been pushed as a notification when this returns.
    pub async fn add(&self, form: PostAlias) -> Result<(), ClientError> {
        form.validate()
            .map_err(|e| self.report(ClientError::from(e)))?;

        let _loading = self.loading.guard(LoadTag::Create);
        info!("Creating alias {}", form.name);

        let created = self
            .backend
            .create_alias(&form)
            .await
            .map_err(|e| self.report(e))?;

        self.notifications
            .success(format!("Successfully added alias \"{}\"", form.name));
        self.write().list.push(created);

        Ok(())
    }

    /// Delete an alias by name.
    pub async fn remove(&self, name: &str) -> Result<(), ClientError> {
        let _loading = self.loading.guard(LoadTag::Delete);
        info!("Removing alias {}", name);

        self.backend
            .delete_alias(name)
            .await
            .map_err(|e| self.report(e))?;

        self.notifications
            .success(format!("Successfully removed \"{}\"", name));
        self.write().list.retain(|a| a.name != name);

        Ok(())
    }

    /// Apply a partial update.
    ///
    /// The local entry is merged from `form` itself, not from the backend's
    /// answer, and keeps its position in the list.
    pub async fn edit(&self, name: &str, form: PutAlias) -> Result<(), ClientError> {
        form.validate()
            .map_err(|e| self.report(ClientError::from(e)))?;

        let _loading = self.loading.guard(LoadTag::Edit);
        info!("Updating alias {}", name);

        self.backend
            .update_alias(name, &form)
            .await
            .map_err(|e| self.report(e))?;

        self.notifications
            .success(format!("Successfully updated \"{}\"", name));

        let mut state = self.write();
        match state.list.iter().position(|a| a.name == name) {
            Some(index) => {
                let merged = state.list[index].merged(&form);
                state.list[index] = merged;
            }
            None => warn!("Updated alias {} is no longer in the local list", name),
        }

        Ok(())
    }
}
