use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{format_wire_date, Checklist, ConfirmationItem, ControlCode, DocumentId};
use super::remote::{ConversionRequest, ErrorRecord};

static SCREEN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Identity of one mounted verification screen.
///
/// Asynchronous outcomes carry the instance they were issued for; an outcome
/// arriving after the screen was restarted or remounted no longer matches and
/// is dropped instead of corrupting the successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenInstance(u64);

impl ScreenInstance {
    fn next() -> Self {
        Self(SCREEN_SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Outcome of the one-shot date validation performed on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValidity {
    Pending,
    Valid,
    NeedsCorrection,
}

impl DateValidity {
    pub const fn label(self) -> &'static str {
        match self {
            DateValidity::Pending => "pending",
            DateValidity::Valid => "valid",
            DateValidity::NeedsCorrection => "needs_correction",
        }
    }
}

/// Derived position in the verification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenPhase {
    ValidatingDate,
    AwaitingConfirmations,
    Ready,
    Submitting,
    Completed,
}

impl ScreenPhase {
    pub const fn label(self) -> &'static str {
        match self {
            ScreenPhase::ValidatingDate => "validating_date",
            ScreenPhase::AwaitingConfirmations => "awaiting_confirmations",
            ScreenPhase::Ready => "ready",
            ScreenPhase::Submitting => "submitting",
            ScreenPhase::Completed => "completed",
        }
    }
}

/// Reasons the conversion submission is currently unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionBlocker {
    AlreadyConverted,
    ConversionInFlight,
    ErrorUnresolved,
    DateUnresolved,
    CorrectionRequired,
    ChecklistIncomplete,
    DocumentIdMissing,
}

/// Violations of the screen's state machine.
#[derive(Debug, thiserror::Error)]
pub enum ControlScreenError {
    #[error("date validation outcome is not known yet")]
    ValidationPending,
    #[error("the claimed date was accepted; no correction is offered")]
    CorrectionNotOffered,
    #[error("the control code was already converted")]
    AlreadyCompleted,
    #[error("submission unavailable while preconditions are unmet: {0:?}")]
    SubmissionBlocked(Vec<SubmissionBlocker>),
}

/// State machine for one verification screen.
///
/// Owns a copy of the control-code record for the screen's lifetime; the
/// caller persists the amended record returned by `correct_date` and drives
/// the two remote calls, feeding their outcomes back in.
#[derive(Debug)]
pub struct ControlScreen {
    instance: ScreenInstance,
    session: ControlCode,
    date_validity: DateValidity,
    correction: Option<NaiveDate>,
    checklist: Checklist,
    document_id: DocumentId,
    error: Option<ErrorRecord>,
    submitting: bool,
    completed: bool,
}

impl ControlScreen {
    pub fn new(session: ControlCode) -> Self {
        Self {
            instance: ScreenInstance::next(),
            session,
            date_validity: DateValidity::Pending,
            correction: None,
            checklist: Checklist::default(),
            document_id: DocumentId::unset(),
            error: None,
            submitting: false,
            completed: false,
        }
    }

    pub fn instance(&self) -> ScreenInstance {
        self.instance
    }

    pub fn session(&self) -> &ControlCode {
        &self.session
    }

    pub fn date_validity(&self) -> DateValidity {
        self.date_validity
    }

    pub fn correction_provided(&self) -> bool {
        self.correction.is_some()
    }

    pub fn checklist(&self) -> Checklist {
        self.checklist
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn error(&self) -> Option<&ErrorRecord> {
        self.error.as_ref()
    }

    pub fn phase(&self) -> ScreenPhase {
        if self.completed {
            ScreenPhase::Completed
        } else if self.submitting {
            ScreenPhase::Submitting
        } else if self.date_validity == DateValidity::Pending {
            ScreenPhase::ValidatingDate
        } else if self.blockers().is_empty() {
            ScreenPhase::Ready
        } else {
            ScreenPhase::AwaitingConfirmations
        }
    }

    /// Record the validator's verdict. Only the first application counts; the
    /// validation is one-shot per screen instance.
    pub fn apply_date_validation(&mut self, acceptable: bool) {
        if self.date_validity == DateValidity::Pending {
            self.date_validity = if acceptable {
                DateValidity::Valid
            } else {
                DateValidity::NeedsCorrection
            };
        }
    }

    /// Toggle one checklist switch. Idempotent; any order.
    pub fn set_confirmation(
        &mut self,
        item: ConfirmationItem,
        confirmed: bool,
    ) -> Result<(), ControlScreenError> {
        if self.completed {
            return Err(ControlScreenError::AlreadyCompleted);
        }
        self.checklist.set(item, confirmed);
        Ok(())
    }

    /// Store the identifier the operator transcribed from the document.
    pub fn enter_document_id(&mut self, value: &str) -> Result<(), ControlScreenError> {
        if self.completed {
            return Err(ControlScreenError::AlreadyCompleted);
        }
        self.document_id = DocumentId::new(value);
        Ok(())
    }

    /// Apply an operator-picked correction for a rejected date of birth.
    ///
    /// Replaces the session's `day_of_birth` wholesale with the canonical
    /// wire rendering and returns the amended record for the caller to
    /// persist. Picking again overwrites the previous correction; there is no
    /// way to unset one.
    pub fn correct_date(&mut self, picked: NaiveDate) -> Result<&ControlCode, ControlScreenError> {
        if self.completed {
            return Err(ControlScreenError::AlreadyCompleted);
        }
        match self.date_validity {
            DateValidity::Pending => Err(ControlScreenError::ValidationPending),
            DateValidity::Valid => Err(ControlScreenError::CorrectionNotOffered),
            DateValidity::NeedsCorrection => {
                self.session.day_of_birth = format_wire_date(picked);
                self.correction = Some(picked);
                Ok(&self.session)
            }
        }
    }

    /// Every unmet submission precondition, in severity order. Empty means
    /// the conversion may be submitted.
    pub fn blockers(&self) -> Vec<SubmissionBlocker> {
        let mut blockers = Vec::new();
        if self.completed {
            blockers.push(SubmissionBlocker::AlreadyConverted);
        }
        if self.submitting {
            blockers.push(SubmissionBlocker::ConversionInFlight);
        }
        if self.error.is_some() {
            blockers.push(SubmissionBlocker::ErrorUnresolved);
        }
        match self.date_validity {
            DateValidity::Pending => blockers.push(SubmissionBlocker::DateUnresolved),
            DateValidity::NeedsCorrection if self.correction.is_none() => {
                blockers.push(SubmissionBlocker::CorrectionRequired)
            }
            _ => {}
        }
        if !self.checklist.all_confirmed() {
            blockers.push(SubmissionBlocker::ChecklistIncomplete);
        }
        if self.document_id.is_unset() {
            blockers.push(SubmissionBlocker::DocumentIdMissing);
        }
        blockers
    }

    pub fn submit_enabled(&self) -> bool {
        self.blockers().is_empty()
    }

    /// Start a conversion attempt: verifies every precondition, raises the
    /// in-flight flag synchronously, and hands back the request payload. The
    /// flag stays up until `complete_submission` records the outcome, so a
    /// second attempt cannot start in between.
    pub fn begin_submission(&mut self) -> Result<ConversionRequest, ControlScreenError> {
        let blockers = self.blockers();
        if !blockers.is_empty() {
            return Err(ControlScreenError::SubmissionBlocked(blockers));
        }
        self.submitting = true;
        Ok(ConversionRequest::new(&self.session, &self.document_id))
    }

    /// Feed the conversion outcome back in. Success clears any prior error
    /// and finishes the screen; failure stores the record, which blocks
    /// resubmission until the screen is restarted.
    pub fn complete_submission(&mut self, outcome: Result<(), ErrorRecord>) {
        self.submitting = false;
        match outcome {
            Ok(()) => {
                self.error = None;
                self.completed = true;
            }
            Err(record) => {
                self.error = Some(record);
            }
        }
    }

    pub fn view(&self) -> ScreenView {
        ScreenView {
            code: self.session.code.clone(),
            first_name: self.session.first_name.clone(),
            last_name: self.session.last_name.clone(),
            day_of_birth: self.session.day_of_birth.clone(),
            date_validity: self.date_validity.label(),
            correction_provided: self.correction.is_some(),
            confirmations: self.checklist,
            document_id: self.document_id.as_str().to_string(),
            document_id_complete: self.document_id.is_complete(),
            error: self.error.clone(),
            phase: self.phase().label(),
            submit_enabled: self.submit_enabled(),
            blockers: self.blockers(),
        }
    }
}

/// Serializable snapshot of the screen for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenView {
    pub code: String,
    pub first_name: String,
    pub last_name: String,
    pub day_of_birth: String,
    pub date_validity: &'static str,
    pub correction_provided: bool,
    pub confirmations: Checklist,
    pub document_id: String,
    pub document_id_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
    pub phase: &'static str,
    pub submit_enabled: bool,
    pub blockers: Vec<SubmissionBlocker>,
}
