#![allow(dead_code)]

use async_trait::async_trait;
use paygate::domain::backend::{
    OrderRequest, OrderResponse, VerifyRequest, VerifyResponse, VerifyRoute,
};
use paygate::domain::checkout::{CheckoutEvent, CheckoutMode, SessionToken};
use paygate::domain::draft::{Document, RegistrationDraft};
use paygate::domain::outcome::Destination;
use paygate::domain::ports::{CheckoutWidget, Navigator, RegistrationBackend, Stash};
use paygate::error::{BackendError, CheckoutError, Result};
use paygate::infrastructure::in_memory::InMemoryStash;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Ordered record of side effects across fakes.
#[derive(Default, Clone)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.events().iter().position(|e| e.starts_with(prefix))
    }
}

/// In-memory stash that also logs its writes.
#[derive(Clone)]
pub struct LoggedStash {
    pub inner: InMemoryStash,
    pub log: EventLog,
}

impl LoggedStash {
    pub fn new(log: EventLog) -> Self {
        Self {
            inner: InMemoryStash::new(),
            log,
        }
    }
}

#[async_trait]
impl Stash for LoggedStash {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.log.push(format!("stash.set {key}"));
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.log.push(format!("stash.delete {key}"));
        self.inner.delete(key).await
    }
}

/// Backend answering from queues of canned responses.
#[derive(Default)]
pub struct ScriptedBackend {
    pub log: EventLog,
    orders: Mutex<VecDeque<std::result::Result<OrderResponse, BackendError>>>,
    verifications: Mutex<VecDeque<std::result::Result<VerifyResponse, BackendError>>>,
    pub order_requests: Mutex<Vec<OrderRequest>>,
    pub verify_calls: Mutex<Vec<(VerifyRoute, VerifyRequest)>>,
    /// When set, verification waits until notified.
    pub gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn gated(log: EventLog, gate: Arc<Notify>) -> Self {
        Self {
            log,
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn push_order(&self, response: std::result::Result<OrderResponse, BackendError>) {
        self.orders.lock().unwrap().push_back(response);
    }

    pub fn push_verify(&self, response: std::result::Result<VerifyResponse, BackendError>) {
        self.verifications.lock().unwrap().push_back(response);
    }

    pub fn order_count(&self) -> usize {
        self.order_requests.lock().unwrap().len()
    }

    pub fn verify_routes(&self) -> Vec<VerifyRoute> {
        self.verify_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(route, _)| *route)
            .collect()
    }

    pub fn last_verify_request(&self) -> Option<VerifyRequest> {
        self.verify_calls
            .lock()
            .unwrap()
            .last()
            .map(|(_, request)| request.clone())
    }
}

#[async_trait]
impl RegistrationBackend for ScriptedBackend {
    async fn create_order(
        &self,
        request: OrderRequest,
    ) -> std::result::Result<OrderResponse, BackendError> {
        self.log.push("backend.create_order");
        self.order_requests.lock().unwrap().push(request);
        self.orders
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no scripted order".to_string())))
    }

    async fn verify(
        &self,
        route: VerifyRoute,
        request: VerifyRequest,
    ) -> std::result::Result<VerifyResponse, BackendError> {
        self.log.push("backend.verify");
        self.verify_calls.lock().unwrap().push((route, request));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.verifications
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no scripted verification".to_string())))
    }
}

/// Checkout widget with configurable load and checkout results.
pub struct FakeWidget {
    pub log: EventLog,
    loaded: AtomicBool,
    pub fail_load: bool,
    pub event: CheckoutEvent,
}

impl FakeWidget {
    pub fn new(log: EventLog, loaded: bool) -> Self {
        Self {
            log,
            loaded: AtomicBool::new(loaded),
            fail_load: false,
            event: CheckoutEvent::Redirected {
                checkout_url: "https://gateway.example/checkout".to_string(),
            },
        }
    }

    pub fn load_count(&self) -> usize {
        self.log
            .events()
            .iter()
            .filter(|e| e.as_str() == "widget.load")
            .count()
    }
}

#[async_trait]
impl CheckoutWidget for FakeWidget {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn load(&self) -> Result<()> {
        self.log.push("widget.load");
        if self.fail_load {
            return Err(CheckoutError::GatewayLoad("script blocked".to_string()));
        }
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn checkout(&self, token: &SessionToken, mode: CheckoutMode) -> Result<CheckoutEvent> {
        self.log.push(format!("widget.checkout {token} {mode:?}"));
        Ok(self.event.clone())
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<Destination>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<Destination> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: Destination) {
        self.visits.lock().unwrap().push(destination);
    }
}

pub fn complete_draft() -> RegistrationDraft {
    RegistrationDraft {
        full_name: "Asha Rao".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
        password: "s3cret".to_string(),
        category: "Real Estate Agent".to_string(),
        documents: vec![Document::new(
            "licence.pdf",
            "application/pdf",
            b"%PDF-1.7".to_vec(),
        )],
        voter_id: Some(Document::new("voter.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47])),
        extra: Default::default(),
    }
}

pub fn order(temp_id: &str, order_id: &str, session: &str) -> OrderResponse {
    OrderResponse {
        temp_id: Some(temp_id.to_string()),
        order_id: Some(order_id.to_string()),
        payment_session_id: Some(session.to_string()),
    }
}

pub fn verified(existing: bool) -> VerifyResponse {
    VerifyResponse {
        success: true,
        existing,
        error: None,
        subject_id: Some("42".to_string()),
        email: Some("asha@example.com".to_string()),
        name: Some("Asha Rao".to_string()),
        ..Default::default()
    }
}

pub fn refused(message: &str) -> VerifyResponse {
    VerifyResponse {
        success: false,
        error: Some(message.to_string()),
        ..Default::default()
    }
}
