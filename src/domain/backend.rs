use super::draft::RegistrationPayload;
use super::subject::{SubjectType, TransactionKind};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Backend route that creates a gateway order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderRoute {
    AgentRegistration,
    ServiceProviderRegistration,
    Renewal,
}

/// Backend route that verifies and finalizes a paid order.
///
/// Each subject type and transaction kind has its own route; they are not
/// interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerifyRoute {
    AgentRegistration,
    ServiceProviderRegistration,
    AgentRenewal,
    ServiceProviderRenewal,
}

impl VerifyRoute {
    pub fn for_transaction(kind: TransactionKind, subject: SubjectType) -> Self {
        match (kind, subject) {
            (TransactionKind::Registration, SubjectType::Agent) => VerifyRoute::AgentRegistration,
            (TransactionKind::Registration, SubjectType::ServiceProvider) => {
                VerifyRoute::ServiceProviderRegistration
            }
            (TransactionKind::Renewal, SubjectType::Agent) => VerifyRoute::AgentRenewal,
            (TransactionKind::Renewal, SubjectType::ServiceProvider) => {
                VerifyRoute::ServiceProviderRenewal
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderRequest {
    Registration {
        subject: SubjectType,
        payload: RegistrationPayload,
    },
    Renewal {
        user_id: String,
        subject: SubjectType,
        email: String,
    },
}

impl OrderRequest {
    pub fn route(&self) -> OrderRoute {
        match self {
            OrderRequest::Registration {
                subject: SubjectType::Agent,
                ..
            } => OrderRoute::AgentRegistration,
            OrderRequest::Registration {
                subject: SubjectType::ServiceProvider,
                ..
            } => OrderRoute::ServiceProviderRegistration,
            OrderRequest::Renewal { .. } => OrderRoute::Renewal,
        }
    }

    pub fn subject(&self) -> SubjectType {
        match self {
            OrderRequest::Registration { subject, .. } | OrderRequest::Renewal { subject, .. } => {
                *subject
            }
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            OrderRequest::Registration { .. } => TransactionKind::Registration,
            OrderRequest::Renewal { .. } => TransactionKind::Renewal,
        }
    }

    /// JSON body as the backend expects it.
    pub fn to_body(&self) -> serde_json::Result<Value> {
        match self {
            OrderRequest::Registration { subject, payload } => {
                let mut body = serde_json::to_value(payload)?;
                if let Value::Object(map) = &mut body {
                    map.insert("subjectType".to_string(), json!(subject));
                }
                Ok(body)
            }
            OrderRequest::Renewal {
                user_id,
                subject,
                email,
            } => Ok(json!({
                "userId": user_id,
                "userType": subject,
                "email": email,
            })),
        }
    }
}

/// Answer to an order-creation request.
///
/// Field names vary between backend routes, so both spellings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(default, rename = "tempId", alias = "temp_id")]
    pub temp_id: Option<String>,
    #[serde(default, rename = "orderId", alias = "order_id")]
    pub order_id: Option<String>,
    #[serde(
        default,
        rename = "paymentSessionId",
        alias = "payment_session_id",
        alias = "sessionId"
    )]
    pub payment_session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRequest {
    pub kind: TransactionKind,
    /// Staged draft reference; the user id for renewals.
    pub temp_id: String,
    pub order_id: String,
    pub subject: SubjectType,
    /// Base64 identity document, registrations only.
    pub document: Option<String>,
}

impl VerifyRequest {
    pub fn to_body(&self) -> Value {
        match self.kind {
            TransactionKind::Registration => {
                let mut body = json!({
                    "tempId": self.temp_id,
                    "orderId": self.order_id,
                    "subjectType": self.subject,
                });
                if let (Some(document), Value::Object(map)) = (&self.document, &mut body) {
                    map.insert("voterId".to_string(), json!(document));
                }
                body
            }
            TransactionKind::Renewal => json!({
                "orderId": self.order_id,
                "userId": self.temp_id,
                "userType": self.subject,
            }),
        }
    }
}

/// Verification reply. Backends spell the error text and the account id in
/// several ways, sometimes more than one at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub existing: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub service_provider_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl VerifyResponse {
    /// First non-blank of `error` and `message`.
    pub fn error_text(&self) -> Option<&str> {
        first_present([&self.error, &self.message])
    }

    /// First non-blank account id spelling.
    pub fn account_id(&self) -> Option<&str> {
        first_present([
            &self.subject_id,
            &self.agent_id,
            &self.service_provider_id,
            &self.user_id,
        ])
    }
}

fn first_present<const N: usize>(candidates: [&Option<String>; N]) -> Option<&str> {
    candidates
        .into_iter()
        .filter_map(Option::as_deref)
        .find(|value| !value.trim().is_empty())
}

/// What the client learns about a finalized account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub subject_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<&VerifyResponse> for AccountSummary {
    fn from(response: &VerifyResponse) -> Self {
        Self {
            subject_id: response.account_id().map(str::to_string),
            email: response.email.clone(),
            name: response.name.clone(),
        }
    }
}
