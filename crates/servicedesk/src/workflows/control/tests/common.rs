use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::control::domain::{ConfirmationItem, ControlCode};
use crate::workflows::control::remote::{
    ControlCodeConverter, ConversionError, ConversionRequest, DateValidator, ErrorRecord,
    RemoteCallError,
};
use crate::workflows::control::service::ControlWorkflowService;
use crate::workflows::control::session::{SessionStore, SessionStoreError};

pub(super) fn session() -> ControlCode {
    ControlCode {
        code: "QR34F7".to_string(),
        first_name: "Mary".to_string(),
        last_name: "Steward".to_string(),
        day_of_birth: "1995-04-02".to_string(),
        user_uid: "urn:collab:person:example.com:msteward".to_string(),
    }
}

pub(super) fn rejection_record() -> ErrorRecord {
    ErrorRecord {
        status: Some(409),
        error: Some("Conflict".to_string()),
        message: Some("document id already registered".to_string()),
        path: Some("/api/sd/convert".to_string()),
        ..ErrorRecord::default()
    }
}

#[derive(Default)]
pub(super) struct MemorySessionStore {
    pub(super) record: Mutex<Option<ControlCode>>,
}

impl MemorySessionStore {
    pub(super) fn seeded(record: ControlCode) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn current(&self) -> Result<Option<ControlCode>, SessionStoreError> {
        Ok(self.record.lock().expect("session mutex poisoned").clone())
    }

    fn replace(&self, record: ControlCode) -> Result<(), SessionStoreError> {
        *self.record.lock().expect("session mutex poisoned") = Some(record);
        Ok(())
    }
}

pub(super) struct StubValidator {
    verdict: Option<bool>,
    calls: AtomicUsize,
}

impl StubValidator {
    pub(super) fn accepting() -> Self {
        Self {
            verdict: Some(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn rejecting() -> Self {
        Self {
            verdict: Some(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            verdict: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DateValidator for StubValidator {
    async fn validate(&self, _day_of_birth: &str) -> Result<bool, RemoteCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.verdict {
            Some(verdict) => Ok(verdict),
            None => Err(RemoteCallError::Transport("validator offline".to_string())),
        }
    }
}

#[derive(Default)]
pub(super) struct ScriptedConverter {
    outcomes: Mutex<VecDeque<Result<(), ConversionError>>>,
    requests: Mutex<Vec<ConversionRequest>>,
}

impl ScriptedConverter {
    pub(super) fn push_success(&self) {
        self.outcomes
            .lock()
            .expect("outcome mutex poisoned")
            .push_back(Ok(()));
    }

    pub(super) fn push_rejection(&self, record: ErrorRecord) {
        self.outcomes
            .lock()
            .expect("outcome mutex poisoned")
            .push_back(Err(ConversionError::Rejected(record)));
    }

    pub(super) fn push_transport_failure(&self, reason: &str) {
        self.outcomes
            .lock()
            .expect("outcome mutex poisoned")
            .push_back(Err(ConversionError::Transport(reason.to_string())));
    }

    pub(super) fn requests(&self) -> Vec<ConversionRequest> {
        self.requests.lock().expect("request mutex poisoned").clone()
    }
}

#[async_trait]
impl ControlCodeConverter for ScriptedConverter {
    async fn convert(&self, request: ConversionRequest) -> Result<(), ConversionError> {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .push(request);
        self.outcomes
            .lock()
            .expect("outcome mutex poisoned")
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Converter that parks every call on a semaphore so tests can interleave a
/// restart with an in-flight conversion.
pub(super) struct GatedConverter {
    gate: tokio::sync::Semaphore,
    started: AtomicBool,
}

impl GatedConverter {
    pub(super) fn closed() -> Self {
        Self {
            gate: tokio::sync::Semaphore::new(0),
            started: AtomicBool::new(false),
        }
    }

    pub(super) fn call_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub(super) fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl ControlCodeConverter for GatedConverter {
    async fn convert(&self, _request: ConversionRequest) -> Result<(), ConversionError> {
        self.started.store(true, Ordering::SeqCst);
        let _permit = self.gate.acquire().await.expect("gate closed");
        Ok(())
    }
}

pub(super) type TestService = ControlWorkflowService<MemorySessionStore, StubValidator, ScriptedConverter>;

pub(super) fn build_service(
    validator: StubValidator,
) -> (
    Arc<TestService>,
    Arc<MemorySessionStore>,
    Arc<StubValidator>,
    Arc<ScriptedConverter>,
) {
    let store = Arc::new(MemorySessionStore::seeded(session()));
    let validator = Arc::new(validator);
    let converter = Arc::new(ScriptedConverter::default());
    let service = Arc::new(ControlWorkflowService::new(
        store.clone(),
        validator.clone(),
        converter.clone(),
    ));
    (service, store, validator, converter)
}

pub(super) fn confirm_all(service: &TestService, code: &str) {
    for item in ConfirmationItem::ALL {
        service.confirm(code, item, true).expect("confirm succeeds");
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
