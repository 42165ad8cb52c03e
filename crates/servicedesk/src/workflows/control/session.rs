use super::domain::ControlCode;

/// Access to the control-code record the upstream portal handed over.
///
/// The store is owned by the caller; this workflow reads the record once on
/// screen entry and pushes a full replacement back when the operator corrects
/// the date of birth. There is deliberately no field-level patching.
pub trait SessionStore: Send + Sync {
    fn current(&self) -> Result<Option<ControlCode>, SessionStoreError>;
    fn replace(&self, record: ControlCode) -> Result<(), SessionStoreError>;
}

/// Error enumeration for session store failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
