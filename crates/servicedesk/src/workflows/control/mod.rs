//! Manual identity-document verification for service-desk operators.
//!
//! A user walks up with a short-lived control code and a physical ID
//! document. The operator checks a fixed list of facts against the document,
//! corrects the claimed date of birth when the authority rejects it, types
//! over the document identifier, and finally asks the authority to convert
//! the control code into a confirmed identity-linked account.

pub mod domain;
pub mod remote;
pub mod router;
pub mod screen;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use domain::{
    format_wire_date, Checklist, ConfirmationItem, ControlCode, DocumentId, WIRE_DATE_FORMAT,
};
pub use remote::{
    ControlCodeConverter, ConversionError, ConversionRequest, DateValidator, ErrorRecord,
    RemoteCallError, ServiceDeskHttpClient,
};
pub use router::control_router;
pub use screen::{
    ControlScreen, ControlScreenError, DateValidity, ScreenInstance, ScreenPhase, ScreenView,
    SubmissionBlocker,
};
pub use service::{ControlServiceError, ControlWorkflowService, SubmitOutcome};
pub use session::{SessionStore, SessionStoreError};
