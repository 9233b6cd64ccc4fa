use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Category of in-flight work, used for busy indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadTag {
    Create,
    Delete,
    Edit,
    Fetch,
    App,
}

impl LoadTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadTag::Create => "alias-create",
            LoadTag::Delete => "alias-delete",
            LoadTag::Edit => "alias-edit",
            LoadTag::Fetch => "alias-fetch",
            LoadTag::App => "app",
        }
    }
}

impl fmt::Display for LoadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of in-flight operation tags.
///
/// Plain set semantics: a tag is either present or not. Two overlapping
/// operations under the same tag share one entry, and whichever finishes
/// first clears it for both.
#[derive(Clone, Debug, Default)]
pub struct LoadingRegistry {
    tags: Arc<RwLock<HashSet<LoadTag>>>,
}

impl LoadingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, tag: LoadTag) {
        let inserted = self
            .tags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tag);
        if inserted {
            debug!("Loading started: {}", tag);
        }
    }

    pub fn del(&self, tag: LoadTag) {
        let removed = self
            .tags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&tag);
        if removed {
            debug!("Loading finished: {}", tag);
        }
    }

    pub fn has(&self, tag: LoadTag) -> bool {
        self.tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&tag)
    }

    pub fn is_busy(&self) -> bool {
        !self
            .tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn snapshot(&self) -> HashSet<LoadTag> {
        self.tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mark `tag` until the returned guard is dropped.
    pub fn guard(&self, tag: LoadTag) -> LoadingGuard {
        self.add(tag);
        LoadingGuard {
            registry: self.clone(),
            tag,
        }
    }
}

/// Clears its tag on drop, whichever way the owning operation exits.
#[must_use = "the tag is cleared as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LoadingGuard {
    registry: LoadingRegistry,
    tag: LoadTag,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.registry.del(self.tag);
    }
}
