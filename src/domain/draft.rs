use crate::error::ValidationError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A file attached to the registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Base64 form of the file contents, as carried in JSON payloads and the stash.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    fn encode(&self) -> EncodedDocument {
        EncodedDocument {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            data: self.to_base64(),
        }
    }
}

/// A document in transport form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedDocument {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

/// The unsent registration form of an agent or service provider.
///
/// Built up across the form steps and consumed once by the
/// [`TransactionInitiator`](crate::application::initiator::TransactionInitiator).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub category: String,
    pub documents: Vec<Document>,
    /// Identity document staged in the stash rather than sent with the order.
    pub voter_id: Option<Document>,
    /// Backend fields the client passes through without interpreting.
    pub extra: BTreeMap<String, String>,
}

impl RegistrationDraft {
    pub const STEPS: u8 = 2;

    /// Checks the fields required by one form step.
    pub fn validate_step(&self, step: u8) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        match step {
            1 => {
                if blank(&self.full_name) {
                    missing.push("full_name");
                }
                if blank(&self.email) || !self.email.contains('@') {
                    missing.push("email");
                }
                if blank(&self.phone) {
                    missing.push("phone");
                }
                if blank(&self.password) {
                    missing.push("password");
                }
            }
            2 => {
                if blank(&self.category) {
                    missing.push("category");
                }
                if self.documents.is_empty() {
                    missing.push("documents");
                }
            }
            _ => {}
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { step, missing })
        }
    }

    /// Checks every step, reporting the first one that fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        (1..=Self::STEPS).try_for_each(|step| self.validate_step(step))
    }

    /// The order-creation payload. The voter id is not part of it.
    pub fn to_payload(&self) -> RegistrationPayload {
        RegistrationPayload {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            password: self.password.clone(),
            category: self.category.trim().to_string(),
            documents: self.documents.iter().map(Document::encode).collect(),
            extra: self.extra.clone(),
        }
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Serialized form of a [`RegistrationDraft`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub category: String,
    pub documents: Vec<EncodedDocument>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}
