use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{ControlCode, DocumentId};

/// Asks the identity authority whether the claimed date of birth is
/// acceptable as-is. Invoked exactly once per screen entry.
#[async_trait]
pub trait DateValidator: Send + Sync {
    async fn validate(&self, day_of_birth: &str) -> Result<bool, RemoteCallError>;
}

/// Converts a fully verified control-code session into a confirmed,
/// identity-linked account.
#[async_trait]
pub trait ControlCodeConverter: Send + Sync {
    async fn convert(&self, request: ConversionRequest) -> Result<(), ConversionError>;
}

/// Payload of the conversion call, serialized with the field names the
/// authority expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub first_name: String,
    pub last_name: String,
    pub day_of_birth: String,
    pub code: String,
    pub document_id: String,
    pub user_uid: String,
}

impl ConversionRequest {
    pub fn new(session: &ControlCode, document_id: &DocumentId) -> Self {
        Self {
            first_name: session.first_name.clone(),
            last_name: session.last_name.clone(),
            day_of_birth: session.day_of_birth.clone(),
            code: session.code.clone(),
            document_id: document_id.as_str().to_string(),
            user_uid: session.user_uid.clone(),
        }
    }
}

/// Transport or protocol failure while talking to the authority.
#[derive(Debug, thiserror::Error)]
pub enum RemoteCallError {
    #[error("remote call failed: {0}")]
    Transport(String),
    #[error("unexpected response from the authority: {0}")]
    UnexpectedResponse(String),
}

/// Failure modes of the conversion call.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("conversion rejected by the authority: {0:?}")]
    Rejected(ErrorRecord),
    #[error("conversion call failed: {0}")]
    Transport(String),
}

/// Structured failure payload returned by the authority on a rejected
/// conversion. Named fields cover the usual error envelope; anything else the
/// server includes is kept in `details` so the presentation layer can
/// interpolate it into operator-facing messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl ErrorRecord {
    /// The empty record is the "no error" sentinel.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.error.is_none()
            && self.message.is_none()
            && self.path.is_none()
            && self.details.is_empty()
    }

    /// Wrap a failure that produced no structured body (the call never
    /// completed) so error handling stays uniform downstream.
    pub fn from_transport(reason: impl Into<String>) -> Self {
        Self {
            error: Some("transport".to_string()),
            message: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Flattened string view of every populated field, for message
    /// interpolation by the presentation layer.
    pub fn fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        if let Some(status) = self.status {
            fields.insert("status".to_string(), status.to_string());
        }
        if let Some(error) = &self.error {
            fields.insert("error".to_string(), error.clone());
        }
        if let Some(message) = &self.message {
            fields.insert("message".to_string(), message.clone());
        }
        if let Some(path) = &self.path {
            fields.insert("path".to_string(), path.clone());
        }
        for (key, value) in &self.details {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            fields.insert(key.clone(), rendered);
        }
        fields
    }
}

/// Thin HTTP gateway to the authority's service-desk endpoints, implementing
/// both remote ports over one shared client.
#[derive(Debug, Clone)]
pub struct ServiceDeskHttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl ServiceDeskHttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DateValidator for ServiceDeskHttpClient {
    async fn validate(&self, day_of_birth: &str) -> Result<bool, RemoteCallError> {
        let url = format!("{}/api/sd/validate-date", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[("dayofbirth", day_of_birth)])
            .send()
            .await
            .map_err(|err| RemoteCallError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteCallError::UnexpectedResponse(format!(
                "validate-date returned status {status}"
            )));
        }

        response
            .json::<bool>()
            .await
            .map_err(|err| RemoteCallError::UnexpectedResponse(err.to_string()))
    }
}

#[async_trait]
impl ControlCodeConverter for ServiceDeskHttpClient {
    async fn convert(&self, request: ConversionRequest) -> Result<(), ConversionError> {
        let url = format!("{}/api/sd/convert", self.base_url);
        let response = self
            .client
            .put(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| ConversionError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        match response.json::<ErrorRecord>().await {
            Ok(mut record) => {
                record.status.get_or_insert(status.as_u16());
                Err(ConversionError::Rejected(record))
            }
            Err(err) => Err(ConversionError::Transport(format!(
                "convert returned status {status} with an unreadable body: {err}"
            ))),
        }
    }
}
