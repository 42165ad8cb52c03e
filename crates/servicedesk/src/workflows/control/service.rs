use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use super::domain::ConfirmationItem;
use super::remote::{ControlCodeConverter, ConversionError, DateValidator, ErrorRecord};
use super::screen::{ControlScreen, ControlScreenError, ScreenView};
use super::session::{SessionStore, SessionStoreError};

/// Outcome of a conversion submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Conversion confirmed; the caller advances past this screen.
    Proceed,
    /// The authority turned the conversion down. The failure is stored on the
    /// screen and blocks resubmission until a restart.
    Rejected(ErrorRecord),
    /// The screen was restarted or remounted while the call was in flight;
    /// the late result was dropped.
    Superseded,
}

/// Error raised by the control workflow service.
#[derive(Debug, thiserror::Error)]
pub enum ControlServiceError {
    #[error("no control code session is active")]
    NoActiveSession,
    #[error("no verification screen is mounted for code {0}")]
    ScreenNotFound(String),
    #[error(transparent)]
    Screen(#[from] ControlScreenError),
    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

/// Service composing the session store and the two remote ports, tracking one
/// verification screen per control code.
pub struct ControlWorkflowService<S, V, C> {
    store: Arc<S>,
    validator: Arc<V>,
    converter: Arc<C>,
    screens: Mutex<HashMap<String, ControlScreen>>,
}

impl<S, V, C> ControlWorkflowService<S, V, C>
where
    S: SessionStore + 'static,
    V: DateValidator + 'static,
    C: ControlCodeConverter + 'static,
{
    pub fn new(store: Arc<S>, validator: Arc<V>, converter: Arc<C>) -> Self {
        Self {
            store,
            validator,
            converter,
            screens: Mutex::new(HashMap::new()),
        }
    }

    /// Mount the verification screen for the session currently in the store
    /// and run the one-shot date validation.
    ///
    /// A transport or server failure of the validator is treated as "date not
    /// validated": the operator is forced through the correction sub-flow
    /// rather than silently trusting the claimed value.
    pub async fn enter(&self) -> Result<ScreenView, ControlServiceError> {
        let session = self
            .store
            .current()?
            .ok_or(ControlServiceError::NoActiveSession)?;
        let code = session.code.clone();
        let claimed = session.day_of_birth.clone();

        let screen = ControlScreen::new(session);
        let instance = screen.instance();
        self.lock_screens().insert(code.clone(), screen);

        let acceptable = match self.validator.validate(&claimed).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    code = %code,
                    error = %err,
                    "date validation unavailable; requiring manual correction"
                );
                false
            }
        };

        let mut screens = self.lock_screens();
        let screen = screens
            .get_mut(&code)
            .filter(|screen| screen.instance() == instance)
            .ok_or_else(|| ControlServiceError::ScreenNotFound(code.clone()))?;
        screen.apply_date_validation(acceptable);
        tracing::info!(code = %code, acceptable, "claimed date of birth validated");
        Ok(screen.view())
    }

    /// Current snapshot of a mounted screen.
    pub fn screen_view(&self, code: &str) -> Result<ScreenView, ControlServiceError> {
        let screens = self.lock_screens();
        let screen = screens
            .get(code)
            .ok_or_else(|| ControlServiceError::ScreenNotFound(code.to_string()))?;
        Ok(screen.view())
    }

    /// Toggle one checklist switch.
    pub fn confirm(
        &self,
        code: &str,
        item: ConfirmationItem,
        confirmed: bool,
    ) -> Result<ScreenView, ControlServiceError> {
        let mut screens = self.lock_screens();
        let screen = screens
            .get_mut(code)
            .ok_or_else(|| ControlServiceError::ScreenNotFound(code.to_string()))?;
        screen.set_confirmation(item, confirmed)?;
        Ok(screen.view())
    }

    /// Store the identifier the operator transcribed from the document.
    pub fn capture_document_id(
        &self,
        code: &str,
        value: &str,
    ) -> Result<ScreenView, ControlServiceError> {
        let mut screens = self.lock_screens();
        let screen = screens
            .get_mut(code)
            .ok_or_else(|| ControlServiceError::ScreenNotFound(code.to_string()))?;
        screen.enter_document_id(value)?;
        Ok(screen.view())
    }

    /// Apply a date-of-birth correction and push the amended record back
    /// through the session store's whole-record mutator.
    pub fn correct_date(
        &self,
        code: &str,
        picked: NaiveDate,
    ) -> Result<ScreenView, ControlServiceError> {
        let (record, view) = {
            let mut screens = self.lock_screens();
            let screen = screens
                .get_mut(code)
                .ok_or_else(|| ControlServiceError::ScreenNotFound(code.to_string()))?;
            let record = screen.correct_date(picked)?.clone();
            (record, screen.view())
        };

        self.store.replace(record)?;
        tracing::info!(code = %code, "corrected date of birth written back to session");
        Ok(view)
    }

    /// Submit the conversion call.
    ///
    /// The in-flight flag is raised synchronously under the registry lock
    /// before the remote call starts and lowered when the outcome is applied,
    /// so at most one conversion is ever in flight per screen instance. An
    /// outcome that arrives for a screen that was restarted or remounted in
    /// the meantime is dropped.
    pub async fn submit(&self, code: &str) -> Result<SubmitOutcome, ControlServiceError> {
        let (instance, request) = {
            let mut screens = self.lock_screens();
            let screen = screens
                .get_mut(code)
                .ok_or_else(|| ControlServiceError::ScreenNotFound(code.to_string()))?;
            let request = screen.begin_submission()?;
            (screen.instance(), request)
        };

        tracing::info!(code = %code, "converting control code");
        let outcome = self.converter.convert(request).await;

        let mut screens = self.lock_screens();
        let Some(screen) = screens
            .get_mut(code)
            .filter(|screen| screen.instance() == instance)
        else {
            tracing::debug!(code = %code, "conversion outcome arrived after restart; dropped");
            return Ok(SubmitOutcome::Superseded);
        };

        match outcome {
            Ok(()) => {
                screen.complete_submission(Ok(()));
                tracing::info!(code = %code, "control code converted; proceeding");
                Ok(SubmitOutcome::Proceed)
            }
            Err(ConversionError::Rejected(record)) => {
                tracing::warn!(code = %code, "conversion rejected by the authority");
                screen.complete_submission(Err(record.clone()));
                Ok(SubmitOutcome::Rejected(record))
            }
            Err(ConversionError::Transport(reason)) => {
                tracing::warn!(code = %code, reason = %reason, "conversion call failed");
                let record = ErrorRecord::from_transport(reason);
                screen.complete_submission(Err(record.clone()));
                Ok(SubmitOutcome::Rejected(record))
            }
        }
    }

    /// Abandon the screen. Confirmations, the captured document id, and any
    /// stored error are discarded; the caller re-acquires a fresh control
    /// code and re-enters.
    pub fn restart(&self, code: &str) -> Result<(), ControlServiceError> {
        let mut screens = self.lock_screens();
        if screens.remove(code).is_none() {
            return Err(ControlServiceError::ScreenNotFound(code.to_string()));
        }
        tracing::info!(code = %code, "verification screen restarted");
        Ok(())
    }

    fn lock_screens(&self) -> MutexGuard<'_, HashMap<String, ControlScreen>> {
        self.screens.lock().expect("screen registry mutex poisoned")
    }
}
