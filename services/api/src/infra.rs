use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use servicedesk::workflows::control::{
    ControlCode, ControlWorkflowService, ServiceDeskHttpClient, SessionStore, SessionStoreError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The service as wired for production: in-memory session hand-over plus the
/// HTTP gateway to the identity authority for both remote ports.
pub(crate) type HttpControlService =
    ControlWorkflowService<InMemorySessionStore, ServiceDeskHttpClient, ServiceDeskHttpClient>;

#[derive(Default)]
pub(crate) struct InMemorySessionStore {
    record: Mutex<Option<ControlCode>>,
}

impl SessionStore for InMemorySessionStore {
    fn current(&self) -> Result<Option<ControlCode>, SessionStoreError> {
        Ok(self.record.lock().expect("session mutex poisoned").clone())
    }

    fn replace(&self, record: ControlCode) -> Result<(), SessionStoreError> {
        *self.record.lock().expect("session mutex poisoned") = Some(record);
        Ok(())
    }
}
