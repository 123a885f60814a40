use super::backend::{OrderRequest, OrderResponse, VerifyRequest, VerifyResponse, VerifyRoute};
use super::checkout::{CheckoutEvent, CheckoutMode, SessionToken};
use super::outcome::Destination;
use crate::error::{BackendError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable key/value storage that survives a page reload in the same browser.
#[async_trait]
pub trait Stash: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// The marketplace REST backend.
#[async_trait]
pub trait RegistrationBackend: Send + Sync {
    async fn create_order(
        &self,
        request: OrderRequest,
    ) -> std::result::Result<OrderResponse, BackendError>;

    async fn verify(
        &self,
        route: VerifyRoute,
        request: VerifyRequest,
    ) -> std::result::Result<VerifyResponse, BackendError>;
}

/// The third-party checkout library.
#[async_trait]
pub trait CheckoutWidget: Send + Sync {
    fn is_loaded(&self) -> bool;
    async fn load(&self) -> Result<()>;
    async fn checkout(&self, token: &SessionToken, mode: CheckoutMode) -> Result<CheckoutEvent>;
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: Destination);
}

pub type StashRef = Arc<dyn Stash>;
pub type BackendRef = Arc<dyn RegistrationBackend>;
pub type WidgetRef = Arc<dyn CheckoutWidget>;
pub type NavigatorRef = Arc<dyn Navigator>;
