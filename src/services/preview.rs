use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::Engine;
use uuid::Uuid;

use crate::models::image::ImageBlob;

const URL_PREFIX: &str = "blob:mediscan/";

struct PreviewEntry {
    media_type: String,
    data: Arc<[u8]>,
}

/// Table of live preview URLs, the client-side equivalent of the browser's
/// object-URL store.
///
/// Entries are created through [`PreviewRegistry::create`] and revoked when
/// the returned [`PreviewHandle`] is dropped, so every preview is released
/// exactly once.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<Mutex<HashMap<Uuid, PreviewEntry>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a preview for `blob`. The bytes are shared, not copied.
    pub fn create(&self, blob: &ImageBlob) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.lock().insert(
            id,
            PreviewEntry {
                media_type: blob.media_type.clone(),
                data: Arc::clone(&blob.data),
            },
        );
        PreviewHandle {
            id,
            registry: self.clone(),
        }
    }

    /// Number of previews created and not yet revoked.
    pub fn outstanding(&self) -> usize {
        self.lock().len()
    }

    pub fn is_live(&self, url: &str) -> bool {
        parse_url(url).is_some_and(|id| self.lock().contains_key(&id))
    }

    /// Resolve a live preview URL into an inline `data:` URL for rendering.
    /// Revoked or foreign URLs resolve to `None`.
    pub fn data_url(&self, url: &str) -> Option<String> {
        let id = parse_url(url)?;
        let entries = self.lock();
        let entry = entries.get(&id)?;
        Some(format!(
            "data:{};base64,{}",
            entry.media_type,
            base64::engine::general_purpose::STANDARD.encode(&entry.data)
        ))
    }

    fn revoke(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PreviewEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_url(url: &str) -> Option<Uuid> {
    url.strip_prefix(URL_PREFIX)
        .and_then(|id| Uuid::parse_str(id).ok())
}

/// Owned, revocable preview URL. Dropping it releases the registry entry.
pub struct PreviewHandle {
    id: Uuid,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn url(&self) -> String {
        format!("{URL_PREFIX}{}", self.id)
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.url()).finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if !self.registry.revoke(self.id) {
            tracing::warn!(preview = %self.url(), "Preview was already revoked");
        }
    }
}
