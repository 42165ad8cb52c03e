use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use clap::Args;

use crate::infra::InMemorySessionStore;
use servicedesk::error::AppError;
use servicedesk::workflows::control::{
    ConfirmationItem, ControlCode, ControlCodeConverter, ControlServiceError,
    ControlWorkflowService, ConversionError, ConversionRequest, DateValidator, ErrorRecord,
    RemoteCallError, SessionStore,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Have the authority reject the claimed date of birth, forcing the
    /// operator through the correction sub-flow
    #[arg(long)]
    pub(crate) reject_date: bool,
    /// Have the authority reject the final conversion call
    #[arg(long)]
    pub(crate) fail_conversion: bool,
}

struct DemoValidator {
    acceptable: bool,
}

#[async_trait]
impl DateValidator for DemoValidator {
    async fn validate(&self, _day_of_birth: &str) -> Result<bool, RemoteCallError> {
        Ok(self.acceptable)
    }
}

struct DemoConverter {
    fail: bool,
}

#[async_trait]
impl ControlCodeConverter for DemoConverter {
    async fn convert(&self, _request: ConversionRequest) -> Result<(), ConversionError> {
        if self.fail {
            Err(ConversionError::Rejected(ErrorRecord {
                status: Some(404),
                error: Some("Not Found".to_string()),
                message: Some("control code expired".to_string()),
                ..ErrorRecord::default()
            }))
        } else {
            Ok(())
        }
    }
}

fn demo_session() -> ControlCode {
    ControlCode {
        code: "QR34F7".to_string(),
        first_name: "Mary".to_string(),
        last_name: "Steward".to_string(),
        day_of_birth: "1995-04-02".to_string(),
        user_uid: "urn:collab:person:example.com:msteward".to_string(),
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemorySessionStore::default());
    store
        .replace(demo_session())
        .map_err(ControlServiceError::from)?;

    let validator = Arc::new(DemoValidator {
        acceptable: !args.reject_date,
    });
    let converter = Arc::new(DemoConverter {
        fail: args.fail_conversion,
    });
    let service = ControlWorkflowService::new(store, validator, converter);

    println!("== Service desk control demo ==");
    let view = service.enter().await?;
    println!(
        "Mounted screen for code {} ({} {}, claimed day of birth {})",
        view.code, view.first_name, view.last_name, view.day_of_birth
    );
    println!("Date validation verdict: {}", view.date_validity);

    // Submitting straight away shows the unmet preconditions.
    match service.submit(&view.code).await {
        Err(ControlServiceError::Screen(error)) => {
            println!("Submission refused as expected: {error}");
        }
        other => println!("Unexpected early submission result: {other:?}"),
    }

    if args.reject_date {
        let picked = NaiveDate::from_ymd_opt(1995, 4, 2).expect("valid demo date");
        let corrected = service.correct_date(&view.code, picked)?;
        println!(
            "Operator corrected the date of birth to {}",
            corrected.day_of_birth
        );
    }

    for item in ConfirmationItem::ALL {
        service.confirm(&view.code, item, true)?;
        println!("Operator confirmed '{}'", item.label());
    }

    let view = service.capture_document_id(&view.code, "AB12CD")?;
    println!("Operator transcribed document id {}", view.document_id);
    println!("Submit enabled: {}", view.submit_enabled);

    match service.submit(&view.code).await? {
        servicedesk::workflows::control::SubmitOutcome::Proceed => {
            println!("Conversion confirmed; proceeding to the next screen");
        }
        servicedesk::workflows::control::SubmitOutcome::Rejected(record) => {
            println!("Conversion rejected by the authority:");
            for (field, value) in record.fields() {
                println!("  {field}: {value}");
            }
            service.restart(&view.code)?;
            println!("Screen restarted; a fresh control code is required");
        }
        servicedesk::workflows::control::SubmitOutcome::Superseded => {
            println!("Conversion outcome arrived for a restarted screen; dropped");
        }
    }

    Ok(())
}
