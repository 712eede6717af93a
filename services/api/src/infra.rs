use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use scheme_mitra::ai::{ExplanationGenerator, TextAnalyticsClient};
use scheme_mitra::schemes::{CatalogHandle, EligibilityExplainer};
use scheme_mitra::session::{SessionId, SessionState, SessionStore, SessionStoreError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Composition root for the discovery routes: immutable catalog, explanation
/// pipeline, analytics client, and the session store.
pub(crate) struct Discovery<G, S> {
    pub(crate) catalog: CatalogHandle,
    pub(crate) explainer: EligibilityExplainer<G>,
    pub(crate) analytics: TextAnalyticsClient,
    pub(crate) sessions: Arc<S>,
}

impl<G, S> Discovery<G, S>
where
    G: ExplanationGenerator + 'static,
    S: SessionStore + 'static,
{
    pub(crate) fn new(
        catalog: CatalogHandle,
        generator: Arc<G>,
        analytics: TextAnalyticsClient,
        sessions: Arc<S>,
    ) -> Self {
        Self {
            catalog,
            explainer: EligibilityExplainer::new(generator),
            analytics,
            sessions,
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, SessionState>>>,
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, id: &SessionId) -> Result<SessionState, SessionStoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(id).cloned().unwrap_or_default())
    }

    fn save(&self, id: &SessionId, state: SessionState) -> Result<(), SessionStoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.insert(id.clone(), state);
        Ok(())
    }
}
