use super::gateway::GatewaySessionAdapter;
use crate::domain::backend::{OrderRequest, OrderResponse};
use crate::domain::checkout::{CheckoutEvent, CheckoutMode, SessionToken};
use crate::domain::draft::RegistrationDraft;
use crate::domain::pending::PendingTransaction;
use crate::domain::ports::{BackendRef, StashRef};
use crate::domain::subject::{SubjectType, TransactionKind};
use crate::error::{CheckoutError, Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifiers of a freshly created gateway order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub temp_id: String,
    pub order_id: String,
    pub session_token: SessionToken,
}

/// Result of handing a transaction to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub receipt: OrderReceipt,
    pub event: CheckoutEvent,
}

/// Subscription renewal for an existing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalRequest {
    pub user_id: String,
    pub subject: SubjectType,
    pub email: String,
}

/// Starts payment-gated transactions.
///
/// The pending record is always in the stash before the gateway is touched:
/// once the page may navigate away, the stash is the only way back to the
/// transaction.
pub struct TransactionInitiator {
    backend: BackendRef,
    stash: StashRef,
    gateway: Arc<GatewaySessionAdapter>,
    mode: CheckoutMode,
}

impl TransactionInitiator {
    pub fn new(
        backend: BackendRef,
        stash: StashRef,
        gateway: Arc<GatewaySessionAdapter>,
        mode: CheckoutMode,
    ) -> Self {
        Self {
            backend,
            stash,
            gateway,
            mode,
        }
    }

    /// Registers a new agent or service provider behind the payment gate.
    pub async fn begin(&self, draft: RegistrationDraft, subject: SubjectType) -> Result<Handoff> {
        draft.validate()?;

        let request = OrderRequest::Registration {
            subject,
            payload: draft.to_payload(),
        };
        let document = draft.voter_id.as_ref().map(|doc| doc.to_base64());

        let response = self.create_order(request).await?;
        let temp_id = response
            .temp_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                CheckoutError::OrderCreation("backend returned no temp id".to_string())
            })?;

        let record = PendingTransaction {
            kind: TransactionKind::Registration,
            subject,
            order_id: required_order_id(response.order_id)?,
            temp_id,
            document,
        };
        self.hand_off(record, response.payment_session_id).await
    }

    /// Renews the subscription of an existing account.
    pub async fn begin_renewal(&self, renewal: RenewalRequest) -> Result<Handoff> {
        let mut missing = Vec::new();
        if renewal.user_id.trim().is_empty() {
            missing.push("user_id");
        }
        if renewal.email.trim().is_empty() {
            missing.push("email");
        }
        if !missing.is_empty() {
            return Err(ValidationError { step: 1, missing }.into());
        }

        let response = self
            .create_order(OrderRequest::Renewal {
                user_id: renewal.user_id.clone(),
                subject: renewal.subject,
                email: renewal.email,
            })
            .await?;

        let record = PendingTransaction {
            kind: TransactionKind::Renewal,
            subject: renewal.subject,
            order_id: required_order_id(response.order_id)?,
            temp_id: renewal.user_id,
            document: None,
        };
        self.hand_off(record, response.payment_session_id).await
    }

    async fn create_order(&self, request: OrderRequest) -> Result<OrderResponse> {
        let route = request.route();
        let response = self.backend.create_order(request).await.map_err(|e| {
            tracing::warn!(?route, error = %e, "order creation failed");
            CheckoutError::OrderCreation(e.message().to_string())
        })?;
        tracing::info!(?route, order_id = ?response.order_id, "order created");
        Ok(response)
    }

    async fn hand_off(
        &self,
        record: PendingTransaction,
        session_id: Option<String>,
    ) -> Result<Handoff> {
        let raw = session_id.unwrap_or_default();
        let session_token = self.gateway.session_token(&raw).map_err(|e| {
            CheckoutError::OrderCreation(format!("no usable payment session: {e}"))
        })?;

        record
            .save(self.stash.as_ref())
            .await
            .map_err(|e| match e {
                CheckoutError::Stash(_) => e,
                other => CheckoutError::Stash(other.to_string()),
            })?;
        tracing::info!(
            kind = ?record.kind,
            subject = %record.subject,
            order_id = %record.order_id,
            "pending transaction persisted"
        );

        let receipt = OrderReceipt {
            temp_id: record.temp_id,
            order_id: record.order_id,
            session_token,
        };
        let event = self.gateway.open(&receipt.session_token, self.mode).await?;
        Ok(Handoff { receipt, event })
    }
}

fn required_order_id(order_id: Option<String>) -> Result<String> {
    order_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| CheckoutError::OrderCreation("backend returned no order id".to_string()))
}
