use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::menu::{self, MenuCatalog};
use crate::permission::{resolve, Reconciler, Reconciliation, Resolution};
use crate::session::SessionStore;

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// `degraded` is set when the assigned rows could not be fetched and the
    /// previous (or an empty) resolution was returned instead
    Loaded { resolution: Resolution, degraded: bool },
    /// A load for the same role was already in flight
    AlreadyLoading,
}

/// Role-scoped program access: load, display state, save.
///
/// Fetch failures never surface from `load_role`; they degrade to the last
/// known resolution. Only an ended session is returned as an error, since
/// the operator has to log in again.
pub struct PermissionService<S: SessionStore> {
    client: Arc<ApiClient<S>>,
    catalog: &'static MenuCatalog,
    recover_on_save: bool,
    loading: Mutex<HashSet<String>>,
    resolutions: Mutex<HashMap<String, Resolution>>,
}

struct LoadingGuard<'a> {
    loading: &'a Mutex<HashSet<String>>,
    role: String,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut loading) = self.loading.lock() {
            loading.remove(&self.role);
        }
    }
}

fn is_session_error(err: &ClientError) -> bool {
    matches!(err, ClientError::SessionExpired | ClientError::NotAuthenticated)
}

impl<S: SessionStore> PermissionService<S> {
    pub fn new(client: Arc<ApiClient<S>>) -> Self {
        Self {
            client,
            catalog: menu::catalog(),
            recover_on_save: crate::config::config().mapping.recover_on_save,
            loading: Mutex::new(HashSet::new()),
            resolutions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_recover_on_save(mut self, enabled: bool) -> Self {
        self.recover_on_save = enabled;
        self
    }

    pub fn catalog(&self) -> &'static MenuCatalog {
        self.catalog
    }

    /// Last resolution loaded for the role
    pub fn resolution(&self, role_code: &str) -> Option<Resolution> {
        self.resolutions.lock().ok()?.get(role_code).cloned()
    }

    pub fn is_loading(&self, role_code: &str) -> bool {
        self.loading
            .lock()
            .map(|loading| loading.contains(role_code))
            .unwrap_or(false)
    }

    fn begin_loading(&self, role_code: &str) -> Option<LoadingGuard<'_>> {
        let mut loading = self.loading.lock().ok()?;
        if !loading.insert(role_code.to_string()) {
            return None;
        }
        Some(LoadingGuard {
            loading: &self.loading,
            role: role_code.to_string(),
        })
    }

    pub async fn load_role(&self, role_code: &str) -> Result<LoadOutcome, ClientError> {
        let Some(_guard) = self.begin_loading(role_code) else {
            tracing::debug!("load for role {} already in flight, ignoring", role_code);
            return Ok(LoadOutcome::AlreadyLoading);
        };

        let (assigned, full_list) = futures::join!(
            self.client.fetch_assigned(role_code),
            self.client.fetch_program_list(role_code)
        );

        let full_list = match full_list {
            Ok(rows) => Some(rows),
            Err(e) if is_session_error(&e) => return Err(e),
            Err(e) => {
                tracing::warn!(
                    "program list for role {} unavailable, mapping without it: {}",
                    role_code,
                    e
                );
                None
            }
        };

        let rows = match assigned {
            Ok(rows) => rows,
            Err(e) if is_session_error(&e) => return Err(e),
            Err(e) => {
                tracing::error!("failed to load program access for role {}: {}", role_code, e);
                let previous = self.resolution(role_code).unwrap_or_default();
                return Ok(LoadOutcome::Loaded { resolution: previous, degraded: true });
            }
        };

        let resolution = resolve(&rows, self.catalog, full_list.as_deref());

        if crate::config::config().mapping.debug_logging {
            tracing::info!(
                "role {}: {} row(s), {} allowed node(s), {} unmapped",
                role_code,
                rows.len(),
                resolution.allowed.len(),
                resolution.missing.len()
            );
        }

        if let Ok(mut cache) = self.resolutions.lock() {
            cache.insert(role_code.to_string(), resolution.clone());
        }

        Ok(LoadOutcome::Loaded { resolution, degraded: false })
    }

    /// Work out what a save would submit, including the recovery fetch for
    /// unresolved ids, without submitting it
    pub async fn plan_save(
        &self,
        role_code: &str,
        checked: &BTreeSet<String>,
    ) -> Result<Reconciliation, ClientError> {
        let resolution = self.resolution(role_code).unwrap_or_default();
        let reconciler = Reconciler::new(self.catalog, &resolution);
        let mut plan = reconciler.reconcile(checked);

        if !plan.is_complete() && self.recover_on_save {
            match self.client.fetch_program_list(role_code).await {
                Ok(fresh) => plan = reconciler.recover(plan, &fresh),
                Err(e) if is_session_error(&e) => return Err(e),
                Err(e) => tracing::warn!("recovery fetch for role {} failed: {}", role_code, e),
            }
        }

        if !plan.skipped.is_empty() {
            tracing::warn!(
                "role {}: {} checked id(s) have no backend identifier and will not be saved: {:?}",
                role_code,
                plan.skipped.len(),
                plan.skipped
            );
        }
        Ok(plan)
    }

    /// Reconcile and submit. The returned `skipped` lists what was dropped.
    /// On a failed submit the cached resolution is untouched, so the same
    /// call can simply be retried.
    pub async fn save_role(
        &self,
        role_code: &str,
        checked: &BTreeSet<String>,
    ) -> Result<Reconciliation, ClientError> {
        let plan = self.plan_save(role_code, checked).await?;
        if let Err(e) = self.client.update_program_access(role_code, &plan.applied).await {
            tracing::error!("failed to save program access for role {}: {}", role_code, e);
            return Err(e);
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use std::time::Duration;

    fn service() -> PermissionService<MemorySessionStore> {
        let store = MemorySessionStore::new();
        let client =
            ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1), "test", store).unwrap();
        PermissionService::new(Arc::new(client))
    }

    #[test]
    fn test_loading_guard_blocks_same_role_only() {
        let svc = service();
        let guard = svc.begin_loading("ROLE_ADMIN");
        assert!(guard.is_some());
        assert!(svc.is_loading("ROLE_ADMIN"));
        assert!(svc.begin_loading("ROLE_ADMIN").is_none());
        assert!(svc.begin_loading("ROLE_USER").is_some());

        drop(guard);
        assert!(!svc.is_loading("ROLE_ADMIN"));
        assert!(svc.begin_loading("ROLE_ADMIN").is_some());
    }

    #[tokio::test]
    async fn test_load_without_session_is_an_error() {
        let svc = service();
        let err = svc.load_role("ROLE_ADMIN").await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        assert!(!svc.is_loading("ROLE_ADMIN"));
    }

    #[tokio::test]
    async fn test_in_flight_load_is_ignored() {
        let svc = service();
        let _guard = svc.begin_loading("ROLE_ADMIN");
        let outcome = svc.load_role("ROLE_ADMIN").await.unwrap();
        assert!(matches!(outcome, LoadOutcome::AlreadyLoading));
    }
}
