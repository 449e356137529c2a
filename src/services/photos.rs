// src/services/photos.rs

//! Photo link resolution with a session-lifetime reachability cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::Client;

use crate::utils::http;
use crate::utils::url::prepend_https;

/// Reachability verdicts keyed by normalized photo URL.
///
/// Absence means "not yet probed". Shared by every cycle of a session and
/// cleared when the session stops.
#[derive(Debug, Default)]
pub struct PhotoCache {
    verdicts: Mutex<HashMap<String, bool>>,
}

impl PhotoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<bool> {
        self.lock().get(url).copied()
    }

    pub fn insert(&self, url: impl Into<String>, reachable: bool) {
        self.lock().insert(url.into(), reachable);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        // A poisoned map still holds valid verdicts.
        self.verdicts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Turns a roster photo link into the URL the overlay should display.
#[derive(Clone)]
pub struct PhotoResolver {
    client: Client,
    cache: Arc<PhotoCache>,
    placeholder: String,
}

impl PhotoResolver {
    pub fn new(client: Client, cache: Arc<PhotoCache>, placeholder: impl Into<String>) -> Self {
        Self {
            client,
            cache,
            placeholder: placeholder.into(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Resolve a raw link, probing it at most once per session.
    ///
    /// Missing links resolve to the placeholder; links that do not answer
    /// 200 are remembered as unreachable and replaced by the placeholder.
    pub async fn resolve(&self, raw_link: Option<&str>, rider_id: &str) -> String {
        let link = raw_link
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.placeholder);
        let photo = prepend_https(link);

        let resolved = match self.cache.get(&photo) {
            Some(false) => self.placeholder.clone(),
            Some(true) => photo,
            None => {
                let reachable = match http::probe(&self.client, &photo).await {
                    Ok(reachable) => {
                        if !reachable {
                            log::warn!("Photo for rider {} is not reachable: {}", rider_id, photo);
                        }
                        reachable
                    }
                    Err(e) => {
                        log::error!(
                            "Unable to validate photo URL for rider {} {}: {}",
                            rider_id,
                            photo,
                            e
                        );
                        false
                    }
                };
                self.cache.insert(photo.clone(), reachable);
                if reachable { photo } else { self.placeholder.clone() }
            }
        };

        if resolved.trim().is_empty() {
            self.placeholder.clone()
        } else {
            resolved
        }
    }
}
